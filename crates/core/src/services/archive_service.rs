use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::errors::CoreError;
use crate::models::archive::{ArchiveStats, MonthlyArchive};
use crate::models::month::MonthKey;
use crate::models::transaction::{Transaction, TransactionFilter};
use crate::services::aggregation_service::AggregationService;
use crate::store::traits::ArchiveStore;

/// Moves months between the active store and immutable archives.
///
/// Per month: Active → Archived → (Restored → Active) | Purged.
/// The store performs each transition as one persisted step; this service
/// decides what goes into it.
pub struct ArchiveService {
    aggregation: AggregationService,
}

impl ArchiveService {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationService::new(),
        }
    }

    /// Archive every active transaction dated in `month`.
    ///
    /// Fails with `NotFound` when there is nothing active for that month,
    /// including on a repeated call after a successful archive. If the month
    /// already has an archive (transactions were logged for it afterwards),
    /// the new ones are merged into it and the summary is recomputed.
    pub async fn archive_month<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        month: MonthKey,
        archived_at: DateTime<Utc>,
    ) -> Result<MonthlyArchive, CoreError> {
        let selected = self.active_transactions(store, month).await?;
        if selected.is_empty() {
            return Err(CoreError::NotFound(format!(
                "No active transactions for month {month}"
            )));
        }

        let transactions = match store.get_archive(month).await? {
            Some(existing) => {
                tracing::info!(
                    "Merging {} new transactions into existing archive {month}",
                    selected.len()
                );
                let known: HashSet<String> =
                    existing.transactions.iter().map(|t| t.id.clone()).collect();
                let mut merged = existing.transactions;
                merged.extend(selected.into_iter().filter(|t| !known.contains(&t.id)));
                merged
            }
            None => selected,
        };

        let archive = MonthlyArchive {
            month,
            summary: self.aggregation.summarize_archive(&transactions),
            transactions,
            archived_at,
        };
        store.commit_archive(&archive).await?;

        tracing::info!(
            "Archived {month}: {} transactions, balance {:.2}",
            archive.transactions.len(),
            archive.summary.balance
        );
        Ok(archive)
    }

    /// Put an archived month back into the active store, keeping ids.
    pub async fn restore_month<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        month: MonthKey,
    ) -> Result<MonthlyArchive, CoreError> {
        if store.get_archive(month).await?.is_none() {
            return Err(CoreError::NotFound(format!("No archive for month {month}")));
        }
        let archive = store.commit_restore(month).await?;
        tracing::info!(
            "Restored {month}: {} transactions back to the active set",
            archive.transactions.len()
        );
        Ok(archive)
    }

    /// Permanently delete an archive. An absent month is not an error.
    pub async fn delete_archive<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        month: MonthKey,
    ) -> Result<(), CoreError> {
        store.delete_archive(month).await?;
        tracing::info!("Purged archive {month}");
        Ok(())
    }

    pub async fn list_archives<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Vec<MonthlyArchive>, CoreError> {
        store.list_archives().await
    }

    /// The archive for `month`, or `NotFound`.
    pub async fn require_archive<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        month: MonthKey,
    ) -> Result<MonthlyArchive, CoreError> {
        store
            .get_archive(month)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("No archive for month {month}")))
    }

    pub async fn archive_stats<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<ArchiveStats, CoreError> {
        let archives = store.list_archives().await?;
        Ok(Self::stats_for(&archives))
    }

    /// Count, total transactions and earliest month over `archives`.
    pub fn stats_for(archives: &[MonthlyArchive]) -> ArchiveStats {
        ArchiveStats {
            total_archives: archives.len(),
            total_transactions: archives.iter().map(|a| a.transactions.len()).sum(),
            oldest_month: archives.iter().map(|a| a.month).min(),
        }
    }

    /// Months with active transactions and no archive yet, most recent first.
    pub async fn months_available_to_archive<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Vec<MonthKey>, CoreError> {
        let archived: HashSet<MonthKey> = store
            .list_archives()
            .await?
            .iter()
            .map(|a| a.month)
            .collect();
        let mut months: Vec<MonthKey> = store
            .list_available_months()
            .await?
            .into_iter()
            .map(|m| m.month_year)
            .filter(|m| !archived.contains(m))
            .collect();
        months.sort_by(|a, b| b.cmp(a));
        months.dedup();
        Ok(months)
    }

    async fn active_transactions<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        month: MonthKey,
    ) -> Result<Vec<Transaction>, CoreError> {
        let listed = store.list(&TransactionFilter::for_month(month)).await?;
        // Guard against stores that filter loosely.
        Ok(listed.into_iter().filter(|t| month.contains(t.date)).collect())
    }
}

impl Default for ArchiveService {
    fn default() -> Self {
        Self::new()
    }
}
