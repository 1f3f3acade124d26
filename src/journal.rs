//! Operation journal kept by the vault for observability.

use std::collections::VecDeque;

use crate::{constants::MAX_JOURNAL_ENTRIES, error::VaultResult};

/// Category of a journal entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogType {
    Info,
    Deposit,
    Withdraw,
    Harvest,
    Rebalance,
    Safety,
    Parameter,
}

/// Journal entry
#[derive(Clone, Debug, PartialEq)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub entry: VaultResult<()>,
    pub log_type: LogType,
    pub note: Option<String>,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    pub fn new(timestamp: u64, entry: VaultResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp,
            entry,
            log_type,
            note: None,
        }
    }

    /// Fills the `note` field of the entry
    pub fn note<S: AsRef<str>>(mut self, text: S) -> Self {
        self.note = Some(text.as_ref().to_string());
        self
    }
}

/// Bounded collection of journal entries, oldest first
#[derive(Clone, Debug, Default)]
pub struct JournalCollection {
    entries: VecDeque<JournalEntry>,
}

impl JournalCollection {
    /// Appends an entry, evicting the oldest one beyond the retention bound
    pub fn append(&mut self, entry: JournalEntry) {
        if self.entries.len() >= MAX_JOURNAL_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Convenience wrapper to append a one-line note
    pub fn append_note<S: AsRef<str>>(
        &mut self,
        timestamp: u64,
        entry: VaultResult<()>,
        log_type: LogType,
        note: S,
    ) {
        self.append(JournalEntry::new(timestamp, entry, log_type).note(note));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter()
    }

    /// Most recent entry, if any
    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.back()
    }
}
