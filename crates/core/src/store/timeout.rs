use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::archive::{AvailableMonth, MonthlyArchive};
use crate::models::month::MonthKey;
use crate::models::summary::MonthlySummary;
use crate::models::transaction::{NewTransaction, Transaction, TransactionFilter, TransactionPatch};

use super::traits::{ArchiveStore, TransactionStore};

/// Bounds every call to the wrapped store by a fixed time limit.
///
/// An expired call surfaces as [`CoreError::Timeout`]; it is never retried.
/// Dropping the in-flight future is the only cancellation performed.
pub struct TimeoutStore<S> {
    inner: S,
    limit: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = u64::try_from(self.limit.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!("Store call '{operation}' exceeded {after_ms} ms");
                Err(CoreError::Timeout {
                    operation: operation.to_string(),
                    after_ms,
                })
            }
        }
    }
}

#[async_trait]
impl<S: TransactionStore> TransactionStore for TimeoutStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        self.bounded("list", self.inner.list(filter)).await
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, CoreError> {
        self.bounded("create", self.inner.create(transaction)).await
    }

    async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, CoreError> {
        self.bounded("update", self.inner.update(id, patch)).await
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.bounded("delete", self.inner.delete(id)).await
    }

    async fn list_available_months(&self) -> Result<Vec<AvailableMonth>, CoreError> {
        self.bounded("list_available_months", self.inner.list_available_months())
            .await
    }
}

#[async_trait]
impl<S: ArchiveStore> ArchiveStore for TimeoutStore<S> {
    async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError> {
        self.bounded("list_archives", self.inner.list_archives()).await
    }

    async fn get_archive(&self, month: MonthKey) -> Result<Option<MonthlyArchive>, CoreError> {
        self.bounded("get_archive", self.inner.get_archive(month)).await
    }

    async fn commit_archive(&self, archive: &MonthlyArchive) -> Result<(), CoreError> {
        self.bounded("commit_archive", self.inner.commit_archive(archive))
            .await
    }

    async fn commit_restore(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        self.bounded("commit_restore", self.inner.commit_restore(month))
            .await
    }

    async fn delete_archive(&self, month: MonthKey) -> Result<(), CoreError> {
        self.bounded("delete_archive", self.inner.delete_archive(month))
            .await
    }

    async fn remote_summary(&self, month: MonthKey) -> Result<Option<MonthlySummary>, CoreError> {
        self.bounded("remote_summary", self.inner.remote_summary(month))
            .await
    }
}
