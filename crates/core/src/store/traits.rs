use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::archive::{AvailableMonth, MonthlyArchive};
use crate::models::month::MonthKey;
use crate::models::summary::MonthlySummary;
use crate::models::transaction::{NewTransaction, Transaction, TransactionFilter, TransactionPatch};

/// Durable keyed storage for active transactions.
///
/// Either an embedded ledger ([`super::local::LocalStore`]) or a remote API
/// ([`super::http::HttpStore`]) satisfies it. Implementations report
/// failures through the [`CoreError`] kinds only: `NotFound`, `Timeout`,
/// `ValidationError` (rejected input) or `StoreError`.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    /// List active transactions matching `filter`, newest first.
    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError>;

    /// Persist a new transaction and return it with its assigned id.
    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, CoreError>;

    /// Apply `patch` to the transaction `id`. Fails with `NotFound` if absent.
    async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, CoreError>;

    /// Remove the transaction `id`. Fails with `NotFound` if absent.
    async fn delete(&self, id: &str) -> Result<(), CoreError>;

    /// Months that have at least one active transaction, most recent first.
    async fn list_available_months(&self) -> Result<Vec<AvailableMonth>, CoreError>;
}

/// A transaction store that also keeps monthly archives.
///
/// Moving transactions between the active set and an archive happens in a
/// single persisted step on the store side, so there is never a state where
/// an archive exists while its transactions are still active (or the
/// reverse).
#[async_trait]
pub trait ArchiveStore: TransactionStore {
    /// All archives, in the order they were stored.
    async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError>;

    async fn get_archive(&self, month: MonthKey) -> Result<Option<MonthlyArchive>, CoreError>;

    /// Store `archive` (replacing any archive with the same month) and remove
    /// every transaction it contains from the active set, atomically.
    async fn commit_archive(&self, archive: &MonthlyArchive) -> Result<(), CoreError>;

    /// Delete the archive for `month` and re-insert its transactions into
    /// the active set under their original ids, atomically. Fails with
    /// `NotFound` if there is no such archive.
    async fn commit_restore(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError>;

    /// Permanently delete the archive for `month`. An absent key is not an error.
    async fn delete_archive(&self, month: MonthKey) -> Result<(), CoreError>;

    /// Precomputed summary kept by the store, if it maintains one.
    async fn remote_summary(&self, _month: MonthKey) -> Result<Option<MonthlySummary>, CoreError> {
        Ok(None)
    }
}

/// Persisted "last checked" month for the archive prompt.
pub trait PromptMarker: Send + Sync {
    fn last_checked(&self) -> Result<Option<MonthKey>, CoreError>;

    fn mark_checked(&mut self, month: MonthKey) -> Result<(), CoreError>;
}
