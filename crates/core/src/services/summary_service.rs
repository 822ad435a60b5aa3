use crate::errors::CoreError;
use crate::models::month::MonthKey;
use crate::models::summary::{MonthlySummary, SummaryCache};
use crate::models::transaction::{Transaction, TransactionFilter};
use crate::services::aggregation_service::AggregationService;
use crate::store::traits::ArchiveStore;

/// Resolves monthly summaries, treating every precomputed copy as a cache.
///
/// Lookup order:
/// 1. Local cache entry, if it agrees with the store's month
/// 2. Store-side summary, under the same check
/// 3. Fresh computation from the store's transactions
///
/// A precomputed summary agrees when both its transaction ids and its totals
/// match what the store holds now. Whatever is returned is written back to
/// the local cache.
pub struct SummaryService {
    aggregation: AggregationService,
}

impl SummaryService {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationService::new(),
        }
    }

    pub async fn monthly_summary<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        cache: &mut SummaryCache,
        month: MonthKey,
    ) -> Result<MonthlySummary, CoreError> {
        let transactions = store.list(&TransactionFilter::for_month(month)).await?;
        let fresh = self.aggregation.summarize_month(month, &transactions);

        if let Some(cached) = cache.get(month) {
            if agrees(cached, &transactions, &fresh) {
                tracing::debug!("Summary cache hit for {month}");
                return Ok(cached.clone());
            }
            tracing::warn!("Evicting stale summary for {month}");
            cache.invalidate(month);
        }

        if let Some(remote) = store.remote_summary(month).await? {
            if remote.month == month && agrees(&remote, &transactions, &fresh) {
                tracing::debug!("Using store summary for {month}");
                cache.insert(remote.clone());
                return Ok(remote);
            }
            tracing::debug!("Store summary for {month} is out of date, recomputing");
        }

        cache.insert(fresh.clone());
        Ok(fresh)
    }

    /// Recompute every cached month from the store and drop entries that no
    /// longer match. Returns the evicted months.
    pub async fn verify<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        cache: &mut SummaryCache,
    ) -> Result<Vec<MonthKey>, CoreError> {
        let mut evicted = Vec::new();
        for month in cache.months() {
            let transactions = store.list(&TransactionFilter::for_month(month)).await?;
            let fresh = self.aggregation.summarize_month(month, &transactions);
            let stale = cache.get(month).map_or(true, |cached| !agrees(cached, &transactions, &fresh));
            if stale {
                tracing::warn!("Evicting stale summary for {month}");
                cache.invalidate(month);
                evicted.push(month);
            }
        }
        Ok(evicted)
    }

    /// Drop the cache and recompute a summary for every month the store has.
    pub async fn rebuild<S: ArchiveStore + ?Sized>(
        &self,
        store: &S,
        cache: &mut SummaryCache,
    ) -> Result<usize, CoreError> {
        cache.clear();
        let months = store.list_available_months().await?;
        for available in &months {
            let month = available.month_year;
            let transactions = store.list(&TransactionFilter::for_month(month)).await?;
            cache.insert(self.aggregation.summarize_month(month, &transactions));
        }
        Ok(months.len())
    }
}

/// Totals closer than half a cent are treated as equal.
const TOTALS_TOLERANCE: f64 = 0.005;

/// Same transactions, same totals.
fn agrees(candidate: &MonthlySummary, transactions: &[Transaction], fresh: &MonthlySummary) -> bool {
    candidate.covers(transactions)
        && (candidate.total_income - fresh.total_income).abs() < TOTALS_TOLERANCE
        && (candidate.total_expenses - fresh.total_expenses).abs() < TOTALS_TOLERANCE
}

impl Default for SummaryService {
    fn default() -> Self {
        Self::new()
    }
}
