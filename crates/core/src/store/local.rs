use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::archive::{AvailableMonth, MonthlyArchive};
use crate::models::ledger::Ledger;
use crate::models::month::MonthKey;
use crate::models::transaction::{NewTransaction, Transaction, TransactionFilter, TransactionPatch};
use crate::storage::manager::StorageManager;

use super::traits::{ArchiveStore, TransactionStore};

/// Embedded store: the whole [`Ledger`] in memory, optionally mirrored to a
/// JSON file.
///
/// Every mutation is applied to a copy of the ledger, written to disk (when
/// file-backed), and only then swapped in. A failed write leaves both the
/// file and the in-memory state untouched.
pub struct LocalStore {
    ledger: Mutex<Ledger>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Empty, memory-only store.
    pub fn new() -> Self {
        Self::from_ledger(Ledger::new())
    }

    /// Memory-only store seeded with `ledger`.
    pub fn from_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            path: None,
        }
    }

    /// Store backed by the ledger file at `path` (created on first write).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let ledger = StorageManager::load_from_file(&path)?;
        tracing::info!(
            "Opened ledger {} ({} transactions, {} archives)",
            path.display(),
            ledger.transactions.len(),
            ledger.archives.len()
        );
        Ok(Self {
            ledger: Mutex::new(ledger),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current ledger.
    pub fn snapshot(&self) -> Result<Ledger, CoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, CoreError> {
        self.ledger
            .lock()
            .map_err(|_| CoreError::StoreError("Ledger lock poisoned".into()))
    }

    /// Run `change` against a copy of the ledger, persist it, then commit.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Ledger) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = change(&mut next)?;
        if let Some(path) = &self.path {
            StorageManager::save_to_file(&next, path)
                .map_err(|e| CoreError::StoreError(format!("Failed to persist ledger: {e}")))?;
        }
        *guard = next;
        Ok(out)
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for LocalStore {
    fn name(&self) -> &str {
        "LocalStore"
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        let ledger = self.lock()?;
        Ok(filter.apply(&ledger.transactions))
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, CoreError> {
        transaction.validate()?;
        let created = self.mutate(|ledger| {
            let created = Transaction::from_new(Uuid::new_v4().to_string(), transaction);
            ledger.transactions.push(created.clone());
            Ok(created)
        })?;
        tracing::debug!("Created transaction {} on {}", created.id, created.date);
        Ok(created)
    }

    async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, CoreError> {
        patch.validate()?;
        self.mutate(|ledger| {
            let transaction = ledger
                .transactions
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| CoreError::NotFound(format!("Transaction {id}")))?;
            patch.apply_to(transaction);
            Ok(transaction.clone())
        })
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.mutate(|ledger| {
            let idx = ledger
                .transactions
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| CoreError::NotFound(format!("Transaction {id}")))?;
            ledger.transactions.remove(idx);
            Ok(())
        })
    }

    async fn list_available_months(&self) -> Result<Vec<AvailableMonth>, CoreError> {
        let ledger = self.lock()?;
        let mut months: BTreeMap<MonthKey, AvailableMonth> = BTreeMap::new();
        for t in &ledger.transactions {
            let key = t.month();
            let entry = months.entry(key).or_insert_with(|| AvailableMonth {
                month_year: key,
                year: key.year(),
                month: key.month(),
                count: 0,
                min_date: t.date,
                max_date: t.date,
            });
            entry.count += 1;
            entry.min_date = entry.min_date.min(t.date);
            entry.max_date = entry.max_date.max(t.date);
        }
        Ok(months.into_values().rev().collect())
    }
}

#[async_trait]
impl ArchiveStore for LocalStore {
    async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError> {
        Ok(self.lock()?.archives.clone())
    }

    async fn get_archive(&self, month: MonthKey) -> Result<Option<MonthlyArchive>, CoreError> {
        Ok(self.lock()?.find_archive(month).cloned())
    }

    async fn commit_archive(&self, archive: &MonthlyArchive) -> Result<(), CoreError> {
        self.mutate(|ledger| {
            ledger.apply_archive(archive.clone());
            Ok(())
        })
    }

    async fn commit_restore(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        self.mutate(|ledger| ledger.apply_restore(month))
    }

    async fn delete_archive(&self, month: MonthKey) -> Result<(), CoreError> {
        let removed = self.mutate(|ledger| Ok(ledger.remove_archive(month)))?;
        if !removed {
            tracing::debug!("No archive for {month} to delete");
        }
        Ok(())
    }
}
