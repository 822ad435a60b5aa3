use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::archive::MonthlyArchive;
use super::month::MonthKey;
use super::transaction::Transaction;
use crate::errors::CoreError;

/// The data container behind the embedded store. Everything in here is
/// written to the ledger file as one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Active (not archived) transactions, in insertion order
    pub transactions: Vec<Transaction>,

    /// Archived months, in the order they were archived
    #[serde(default)]
    pub archives: Vec<MonthlyArchive>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn find_archive(&self, month: MonthKey) -> Option<&MonthlyArchive> {
        self.archives.iter().find(|a| a.month == month)
    }

    /// Store `archive` (replacing one with the same month) and drop its
    /// transactions from the active set.
    pub fn apply_archive(&mut self, archive: MonthlyArchive) {
        let archived: HashSet<&str> = archive.transactions.iter().map(|t| t.id.as_str()).collect();
        self.transactions.retain(|t| !archived.contains(t.id.as_str()));

        match self.archives.iter().position(|a| a.month == archive.month) {
            Some(idx) => self.archives[idx] = archive,
            None => self.archives.push(archive),
        }
    }

    /// Remove the archive for `month` and put its transactions back, keeping
    /// their ids. An active transaction with the same id is replaced.
    pub fn apply_restore(&mut self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        let idx = self
            .archives
            .iter()
            .position(|a| a.month == month)
            .ok_or_else(|| CoreError::NotFound(format!("No archive for month {month}")))?;
        let archive = self.archives.remove(idx);

        let restored: HashSet<&str> = archive.transactions.iter().map(|t| t.id.as_str()).collect();
        self.transactions.retain(|t| !restored.contains(t.id.as_str()));
        self.transactions.extend(archive.transactions.iter().cloned());

        Ok(archive)
    }

    /// Remove the archive for `month`. Returns `true` if one existed.
    pub fn remove_archive(&mut self, month: MonthKey) -> bool {
        let before = self.archives.len();
        self.archives.retain(|a| a.month != month);
        self.archives.len() != before
    }
}
