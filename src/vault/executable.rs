//! The executable vault facade.
//!
//! Sequences every public operation across the ledger, the position
//! reads, the leverage controller and the collaborators. Each
//! capital-affecting operation runs under the reentrancy lock and is
//! atomic: the mutable state is snapshotted up front and restored
//! whenever the operation fails, so a failure can never leave partial
//! ledger or accounting changes behind. Collaborator-side effects are
//! the collaborators' transactional concern.

use alloy_primitives::{Address, U256};

use crate::{
    constants::{
        percent_divisor, HARVEST_BASE_GAS, LEVERAGE_STEP_GAS, MAX_LEVERAGE_ITERATIONS,
        MAX_PANIC_ITERATIONS,
    },
    error::{VaultError, VaultResult},
    journal::{JournalCollection, LogType},
    ledger::ShareLedger,
    leverage::{self, LeverageState},
    market::{AccessGate, Action, FeeSink, LendingMarket, RewardSwapper},
    position,
    safety::SafetyState,
};

use super::{data::VaultData, lock::Lock, settings::VaultSettings, stable::StableVault};

pub struct ExecutableVault<M, S, F, G> {
    market: M,
    swapper: S,
    fee_sink: F,
    gate: G,
    settings: VaultSettings,
    ledger: ShareLedger,
    data: VaultData,
    lock: Lock,
    journal: JournalCollection,
}

impl<M, S, F, G> ExecutableVault<M, S, F, G>
where
    M: LendingMarket,
    S: RewardSwapper,
    F: FeeSink,
    G: AccessGate,
{
    pub fn new(
        market: M,
        swapper: S,
        fee_sink: F,
        gate: G,
        settings: VaultSettings,
    ) -> VaultResult<Self> {
        settings.validate()?;
        let mut data = VaultData::default();
        data.harvest_log
            .set_cadence_secs(settings.harvest_log_cadence_secs);
        Ok(Self {
            market,
            swapper,
            fee_sink,
            gate,
            settings,
            ledger: ShareLedger::default(),
            data,
            lock: Lock::default(),
            journal: JournalCollection::default(),
        })
    }

    /// Rebuilds a vault from its durable snapshot. The lock always starts
    /// released; no operation can be in flight across a reload.
    pub fn from_stable(
        stable: StableVault,
        market: M,
        swapper: S,
        fee_sink: F,
        gate: G,
    ) -> VaultResult<Self> {
        stable.settings.validate()?;
        Ok(Self {
            market,
            swapper,
            fee_sink,
            gate,
            settings: stable.settings,
            ledger: stable.ledger,
            data: stable.data,
            lock: Lock::default(),
            journal: JournalCollection::default(),
        })
    }

    /// Snapshot of everything that must survive across operations
    pub fn to_stable(&self) -> StableVault {
        StableVault {
            ledger: self.ledger.clone(),
            settings: self.settings.clone(),
            data: self.data.clone(),
        }
    }

    /// Total balance under management
    pub fn balance(&self) -> VaultResult<U256> {
        position::managed_balance(&self.market, self.data.vault_idle, self.data.strategy_idle)
    }

    /// Idle base asset held by the vault itself
    pub fn available(&self) -> U256 {
        self.data.vault_idle
    }

    pub fn get_price_per_full_share(&self) -> VaultResult<U256> {
        let managed = self.balance()?;
        self.ledger.price_per_full_share(managed)
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.ledger.balance_of(holder)
    }

    pub fn total_units(&self) -> U256 {
        self.ledger.total_units()
    }

    pub fn calculate_ltv(&self) -> VaultResult<U256> {
        position::current_ltv(&self.market)
    }

    pub fn withdraw_slippage_tolerance(&self) -> U256 {
        self.settings.withdraw_slippage_tolerance_bps
    }

    pub fn safety_state(&self) -> SafetyState {
        self.data.safety
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn journal(&self) -> &JournalCollection {
        &self.journal
    }

    pub fn average_apr_across_last_n_harvests(&self, n: usize) -> VaultResult<U256> {
        self.data.harvest_log.average_apr_bps(n)
    }

    /// Rough pre-flight cost of a harvest call, from the base cost plus
    /// the projected rebalance depth
    pub fn estimate_harvest_gas(&self) -> VaultResult<u64> {
        let ltv = self.calculate_ltv()?;
        let state = leverage::classify(ltv, self.settings.target_ltv, self.settings.allowed_drift);
        let mut steps = 0_u64;
        if !self.data.strategy_idle.is_zero() {
            steps += 1;
        }
        if state != LeverageState::Balanced {
            // Typical convergence depth of the step loop
            steps += 3;
        }
        Ok(HARVEST_BASE_GAS + LEVERAGE_STEP_GAS * steps)
    }

    /// Locks, snapshots the mutable state, runs `op`, and restores the
    /// snapshot when `op` fails. The outcome is journaled either way.
    fn transact<T>(
        &mut self,
        now: u64,
        log_type: LogType,
        note: &str,
        op: impl FnOnce(&mut Self) -> VaultResult<T>,
    ) -> VaultResult<T> {
        self.lock.try_lock()?;
        let ledger = self.ledger.clone();
        let settings = self.settings.clone();
        let data = self.data.clone();
        let result = op(&mut *self);
        if result.is_err() {
            self.ledger = ledger;
            self.settings = settings;
            self.data = data;
        }
        self.lock.unlock();
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.journal.append_note(now, outcome, log_type, note);
        result
    }

    fn require(&self, caller: Address, action: Action) -> VaultResult<()> {
        if self.gate.is_authorized(caller, action) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized)
        }
    }

    /// Deposits `amount` of the base asset and mints proportional units
    pub fn deposit(&mut self, holder: Address, amount: U256, now: u64) -> VaultResult<U256> {
        self.transact(now, LogType::Deposit, "deposit", |vault| {
            vault.deposit_inner(holder, amount)
        })
    }

    fn deposit_inner(&mut self, holder: Address, amount: U256) -> VaultResult<U256> {
        if !self.data.safety.accepts_deposits() {
            return Err(VaultError::VaultPaused);
        }
        if amount.is_zero() {
            return Err(VaultError::InvalidParameter(
                "Deposit amount must be positive.".to_string(),
            ));
        }
        // Price against the balance measured before the deposit lands
        let managed_before =
            position::managed_balance(&self.market, self.data.vault_idle, self.data.strategy_idle)?;
        let units = self.ledger.units_for_deposit(amount, managed_before)?;
        self.ledger.mint(holder, units)?;
        self.data.vault_idle = self.data.vault_idle.saturating_add(amount);
        self.earn()?;
        Ok(units)
    }

    /// Moves idle vault asset into the strategy and rebalances
    fn earn(&mut self) -> VaultResult<()> {
        self.data.strategy_idle = self
            .data
            .strategy_idle
            .saturating_add(self.data.vault_idle);
        self.data.vault_idle = U256::ZERO;
        leverage::rebalance(
            &mut self.market,
            &self.settings,
            &mut self.data.strategy_idle,
            MAX_LEVERAGE_ITERATIONS,
        )?;
        Ok(())
    }

    /// Burns `units` and pays out their pro-rata asset value net of the
    /// security fee
    pub fn withdraw(&mut self, holder: Address, units: U256, now: u64) -> VaultResult<U256> {
        self.transact(now, LogType::Withdraw, "withdraw", |vault| {
            vault.withdraw_inner(holder, units, now)
        })
    }

    /// Burns the caller's entire unit balance
    pub fn withdraw_all(&mut self, holder: Address, now: u64) -> VaultResult<U256> {
        let units = self.ledger.balance_of(holder);
        self.withdraw(holder, units, now)
    }

    fn withdraw_inner(&mut self, holder: Address, units: U256, now: u64) -> VaultResult<U256> {
        if units.is_zero() {
            return Err(VaultError::InvalidParameter(
                "Withdrawal must burn a positive number of units.".to_string(),
            ));
        }
        if units > self.ledger.balance_of(holder) {
            return Err(VaultError::InsufficientBalance);
        }
        let managed =
            position::managed_balance(&self.market, self.data.vault_idle, self.data.strategy_idle)?;
        let gross = self.ledger.asset_for_units(units, managed)?;
        self.ledger.burn(holder, units)?;

        if self.data.vault_idle < gross {
            let shortfall = gross - self.data.vault_idle;
            if self.data.safety.allows_leverage() {
                let used = leverage::free_liquidity(
                    &mut self.market,
                    &self.settings,
                    &mut self.data.strategy_idle,
                    shortfall,
                    MAX_LEVERAGE_ITERATIONS,
                )?;
                self.data.strategy_idle = self.data.strategy_idle.saturating_sub(shortfall);
                self.data.vault_idle = self.data.vault_idle.saturating_add(shortfall);
                // Liquidity for the withdrawal came first; drift correction
                // gets the leftover iteration budget and otherwise waits for
                // the next capital event.
                let remaining = MAX_LEVERAGE_ITERATIONS.saturating_sub(used);
                if remaining > 0 {
                    if let Err(deferred) = leverage::rebalance(
                        &mut self.market,
                        &self.settings,
                        &mut self.data.strategy_idle,
                        remaining,
                    ) {
                        self.journal.append_note(
                            now,
                            Err(deferred),
                            LogType::Rebalance,
                            "Drift correction deferred to the next capital event.",
                        );
                    }
                }
            } else {
                // Not active: only idle funds move, the position stays put
                let pull = shortfall.min(self.data.strategy_idle);
                self.data.strategy_idle = self.data.strategy_idle.saturating_sub(pull);
                self.data.vault_idle = self.data.vault_idle.saturating_add(pull);
                if self.data.vault_idle < gross {
                    return Err(VaultError::UnwindShortfall);
                }
            }
        }

        let fee = gross.saturating_mul(self.settings.security_fee_bps) / percent_divisor();
        let net = gross - fee;
        self.data.vault_idle = self.data.vault_idle.saturating_sub(gross);
        self.fee_sink.receive(fee)?;
        Ok(net)
    }

    /// Claims rewards, reinvests the proceeds and records the harvest
    pub fn harvest(&mut self, now: u64) -> VaultResult<U256> {
        self.transact(now, LogType::Harvest, "harvest", |vault| {
            vault.harvest_inner(now)
        })
    }

    fn harvest_inner(&mut self, now: u64) -> VaultResult<U256> {
        if !self.data.safety.allows_leverage() {
            return Err(VaultError::VaultPaused);
        }
        let before =
            position::managed_balance(&self.market, self.data.vault_idle, self.data.strategy_idle)?;
        let reward = self.market.claim_rewards()?;
        let mut proceeds = U256::ZERO;
        if !reward.is_zero() {
            let expected = self.swapper.quote(reward)?;
            let min_out = expected
                .saturating_mul(percent_divisor().saturating_sub(self.settings.swap_slippage_bps))
                / percent_divisor();
            let actual = self.swapper.swap(reward, min_out)?;
            if actual < min_out {
                return Err(VaultError::SlippageExceeded);
            }
            self.data.strategy_idle = self.data.strategy_idle.saturating_add(actual);
            proceeds = actual;
        }
        let after = before.saturating_add(proceeds);
        self.data.harvest_log.record(now, before, after);
        leverage::rebalance(
            &mut self.market,
            &self.settings,
            &mut self.data.strategy_idle,
            MAX_LEVERAGE_ITERATIONS,
        )?;
        Ok(proceeds)
    }

    /// Explicit rebalance trigger
    pub fn rebalance(&mut self, now: u64) -> VaultResult<()> {
        self.transact(now, LogType::Rebalance, "rebalance", |vault| {
            if !vault.data.safety.allows_leverage() {
                return Err(VaultError::VaultPaused);
            }
            leverage::rebalance(
                &mut vault.market,
                &vault.settings,
                &mut vault.data.strategy_idle,
                MAX_LEVERAGE_ITERATIONS,
            )?;
            Ok(())
        })
    }

    /// Sets the target LTV and immediately re-evaluates the position
    pub fn set_target_ltv(&mut self, caller: Address, value: U256, now: u64) -> VaultResult<()> {
        self.transact(now, LogType::Parameter, "set target ltv", |vault| {
            vault.require(caller, Action::SetTargetLtv)?;
            let max_cf = vault.market.max_collateral_factor()?;
            if value >= max_cf {
                return Err(VaultError::InvalidParameter(format!(
                    "Target LTV must stay below the market collateral factor {max_cf}."
                )));
            }
            vault.settings.target_ltv(value);
            if vault.data.safety.allows_leverage() {
                leverage::rebalance(
                    &mut vault.market,
                    &vault.settings,
                    &mut vault.data.strategy_idle,
                    MAX_LEVERAGE_ITERATIONS,
                )?;
            }
            Ok(())
        })
    }

    pub fn set_withdraw_slippage_tolerance(
        &mut self,
        caller: Address,
        bps: U256,
        now: u64,
    ) -> VaultResult<()> {
        self.transact(now, LogType::Parameter, "set withdraw slippage tolerance", |vault| {
            vault.require(caller, Action::SetWithdrawSlippageTolerance)?;
            vault.settings.withdraw_slippage_tolerance_bps(bps);
            vault.settings.validate()
        })
    }

    pub fn update_harvest_log_cadence(
        &mut self,
        caller: Address,
        secs: u64,
        now: u64,
    ) -> VaultResult<()> {
        self.transact(now, LogType::Parameter, "update harvest log cadence", |vault| {
            vault.require(caller, Action::UpdateHarvestLogCadence)?;
            vault.settings.harvest_log_cadence_secs(secs);
            vault.data.harvest_log.set_cadence_secs(secs);
            Ok(())
        })
    }

    /// Blocks new deposits and leverage steps; the position stays put
    pub fn pause(&mut self, caller: Address, now: u64) -> VaultResult<()> {
        self.transact(now, LogType::Safety, "pause", |vault| {
            vault.require(caller, Action::Pause)?;
            match vault.data.safety {
                SafetyState::Active => {
                    vault.data.safety(SafetyState::Paused);
                    Ok(())
                }
                _ => Err(VaultError::InvalidParameter(
                    "Vault is not active.".to_string(),
                )),
            }
        })
    }

    /// Restores `Active`, also after a panic
    pub fn unpause(&mut self, caller: Address, now: u64) -> VaultResult<()> {
        self.transact(now, LogType::Safety, "unpause", |vault| {
            vault.require(caller, Action::Unpause)?;
            match vault.data.safety {
                SafetyState::Paused | SafetyState::PanickedUnwound => {
                    vault.data.safety(SafetyState::Active);
                    Ok(())
                }
                SafetyState::Active => Err(VaultError::InvalidParameter(
                    "Vault is already active.".to_string(),
                )),
            }
        })
    }

    /// Force-closes the whole position into idle asset.
    ///
    /// This is the one best-effort operation: whatever was unwound stays
    /// unwound even when the market blocks the loop partway, because its
    /// purpose is damage control under adverse market conditions. Returns
    /// the strategy's idle balance after the unwind.
    pub fn panic(&mut self, caller: Address, now: u64) -> VaultResult<U256> {
        self.lock.try_lock()?;
        if !self.gate.is_authorized(caller, Action::Panic) {
            self.lock.unlock();
            self.journal
                .append_note(now, Err(VaultError::Unauthorized), LogType::Safety, "panic");
            return Err(VaultError::Unauthorized);
        }
        let result = leverage::unwind_all(
            &mut self.market,
            &mut self.data.strategy_idle,
            MAX_PANIC_ITERATIONS,
        );
        self.data.safety(SafetyState::PanickedUnwound);
        self.lock.unlock();
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.journal.append_note(
            now,
            outcome,
            LogType::Safety,
            "panic: full unwind to idle asset",
        );
        result.map(|_| self.data.strategy_idle)
    }
}
