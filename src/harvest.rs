//! Rolling harvest log and APR reporting.

use std::collections::VecDeque;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{percent_divisor, seconds_per_year, DEFAULT_HARVEST_LOG_CADENCE_SECS, HARVEST_LOG_LIMIT},
    error::{VaultError, VaultResult},
};

/// One harvest observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    /// Harvest time in seconds
    pub timestamp: u64,
    /// Seconds since the previous record; zero for the first one
    pub elapsed: u64,
    /// Managed balance immediately before the harvest
    pub balance_before: U256,
    /// Managed balance immediately after the harvest
    pub balance_after: U256,
}

/// Bounded window of harvest records, oldest first
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarvestLog {
    records: VecDeque<HarvestRecord>,
    /// Minimum seconds between two recorded entries
    cadence_secs: u64,
}

impl Default for HarvestLog {
    fn default() -> Self {
        Self {
            records: VecDeque::new(),
            cadence_secs: DEFAULT_HARVEST_LOG_CADENCE_SECS,
        }
    }
}

impl HarvestLog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cadence_secs(&self) -> u64 {
        self.cadence_secs
    }

    pub fn set_cadence_secs(&mut self, cadence_secs: u64) {
        self.cadence_secs = cadence_secs;
    }

    pub fn iter(&self) -> impl Iterator<Item = &HarvestRecord> {
        self.records.iter()
    }

    /// Appends a record unless the cadence window since the last entry has
    /// not elapsed yet. Returns whether the record was kept.
    pub fn record(&mut self, timestamp: u64, balance_before: U256, balance_after: U256) -> bool {
        let elapsed = match self.records.back() {
            Some(last) => {
                let elapsed = timestamp.saturating_sub(last.timestamp);
                if elapsed < self.cadence_secs {
                    return false;
                }
                elapsed
            }
            None => 0,
        };
        if self.records.len() >= HARVEST_LOG_LIMIT {
            self.records.pop_front();
        }
        self.records.push_back(HarvestRecord {
            timestamp,
            elapsed,
            balance_before,
            balance_after,
        });
        true
    }

    /// Arithmetic mean of the annualized per-harvest gain across the last
    /// `n` records, in basis points. Records without a measurable baseline
    /// or elapsed time contribute zero.
    pub fn average_apr_bps(&self, n: usize) -> VaultResult<U256> {
        if n == 0 {
            return Err(VaultError::InvalidParameter(
                "Cannot average across zero harvests.".to_string(),
            ));
        }
        if self.records.len() < n {
            return Err(VaultError::InsufficientHistory);
        }
        let mut sum = U256::ZERO;
        for record in self.records.iter().rev().take(n) {
            if record.balance_before.is_zero() || record.elapsed == 0 {
                continue;
            }
            let gain = record
                .balance_after
                .saturating_sub(record.balance_before);
            let gain_bps = gain.saturating_mul(percent_divisor()) / record.balance_before;
            let apr_bps =
                gain_bps.saturating_mul(seconds_per_year()) / U256::from(record.elapsed);
            sum = sum.saturating_add(apr_bps);
        }
        Ok(sum / U256::from(n as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_YEAR: u64 = 15_768_000;

    fn log_with_cadence(cadence_secs: u64) -> HarvestLog {
        let mut log = HarvestLog::default();
        log.set_cadence_secs(cadence_secs);
        log
    }

    #[test]
    fn cadence_gates_entries() {
        let mut log = log_with_cadence(100);
        assert!(log.record(1_000, U256::from(10_u64), U256::from(11_u64)));
        assert!(!log.record(1_050, U256::from(11_u64), U256::from(12_u64)));
        assert!(log.record(1_100, U256::from(11_u64), U256::from(12_u64)));
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().last().unwrap().elapsed, 100);
    }

    #[test]
    fn window_is_bounded() {
        let mut log = log_with_cadence(1);
        for i in 0..(HARVEST_LOG_LIMIT as u64 + 5) {
            assert!(log.record(i * 10, U256::from(1_u64), U256::from(1_u64)));
        }
        assert_eq!(log.len(), HARVEST_LOG_LIMIT);
        // Oldest entries fell off the front
        assert_eq!(log.iter().next().unwrap().timestamp, 50);
    }

    #[test]
    fn average_apr_annualizes_per_harvest_gains() {
        let mut log = log_with_cadence(1);
        // First record carries no elapsed time and contributes zero
        assert!(log.record(0, U256::from(10_000_u64), U256::from(10_000_u64)));
        // Two 1% gains, each half a year apart: 200 bps annualized each
        assert!(log.record(HALF_YEAR, U256::from(10_000_u64), U256::from(10_100_u64)));
        assert!(log.record(
            2 * HALF_YEAR,
            U256::from(10_000_u64),
            U256::from(10_100_u64)
        ));
        assert_eq!(log.average_apr_bps(2).unwrap(), U256::from(200_u64));
        // Averaging over all three dilutes with the zero-elapsed record
        assert_eq!(log.average_apr_bps(3).unwrap(), U256::from(133_u64));
    }

    #[test]
    fn too_few_records_is_an_error() {
        let mut log = log_with_cadence(1);
        assert!(log.record(0, U256::from(1_u64), U256::from(1_u64)));
        assert_eq!(log.average_apr_bps(2), Err(VaultError::InsufficientHistory));
        assert!(matches!(
            log.average_apr_bps(0),
            Err(VaultError::InvalidParameter(_))
        ));
    }
}
