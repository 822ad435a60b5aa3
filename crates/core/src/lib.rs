pub mod errors;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;

use chrono::{DateTime, Local, NaiveDate, Utc};
use models::{
    analytics::{Aggregation, DashboardSnapshot},
    archive::{ArchiveStats, AvailableMonth, MonthlyArchive},
    month::MonthKey,
    settings::Settings,
    summary::{MonthlySummary, SummaryCache},
    transaction::{NewTransaction, Transaction, TransactionFilter, TransactionPatch},
};
use services::{
    aggregation_service::AggregationService,
    archive_service::ArchiveService,
    export_service::ExportService,
    history_service::{HistoryQuery, HistoryService},
    prompt_service::PromptService,
    summary_service::SummaryService,
};
use store::{
    http::HttpStore,
    local::LocalStore,
    marker::MemoryMarker,
    timeout::TimeoutStore,
    traits::{ArchiveStore, PromptMarker},
};

use errors::CoreError;

/// Main entry point for the Finance Tracker core library.
///
/// Holds the transaction store, the archive-prompt marker, settings and the
/// monthly summary cache. Operations are plain request/response futures;
/// pushing updates to a UI is left to the caller.
#[must_use]
pub struct FinanceTracker<S, M = MemoryMarker> {
    store: S,
    marker: M,
    settings: Settings,
    summaries: SummaryCache,
    aggregation_service: AggregationService,
    archive_service: ArchiveService,
    export_service: ExportService,
    history_service: HistoryService,
    prompt_service: PromptService,
    summary_service: SummaryService,
}

impl<S, M> std::fmt::Debug for FinanceTracker<S, M>
where
    S: ArchiveStore,
    M: PromptMarker,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinanceTracker")
            .field("store", &self.store.name())
            .field("settings", &self.settings)
            .field("cached_summaries", &self.summaries.len())
            .finish()
    }
}

impl FinanceTracker<TimeoutStore<LocalStore>> {
    /// In-memory tracker with default settings.
    pub fn in_memory() -> Self {
        let settings = Settings::default();
        let store = TimeoutStore::new(LocalStore::new(), settings.store_timeout());
        Self::new(store, MemoryMarker::new(), settings)
    }

    /// Tracker over the ledger file at `path`.
    pub fn open_local(path: impl AsRef<std::path::Path>, settings: Settings) -> Result<Self, CoreError> {
        let store = TimeoutStore::new(LocalStore::open(path)?, settings.store_timeout());
        Ok(Self::new(store, MemoryMarker::new(), settings))
    }
}

impl FinanceTracker<HttpStore> {
    /// Tracker talking to the remote API at `settings.api_base_url`.
    pub fn connect(settings: Settings) -> Result<Self, CoreError> {
        let store = HttpStore::new(settings.api_base_url.clone(), settings.store_timeout())?;
        Ok(Self::new(store, MemoryMarker::new(), settings))
    }
}

impl<S, M> FinanceTracker<S, M>
where
    S: ArchiveStore,
    M: PromptMarker,
{
    pub fn new(store: S, marker: M, settings: Settings) -> Self {
        Self {
            store,
            marker,
            settings,
            summaries: SummaryCache::new(),
            aggregation_service: AggregationService::new(),
            archive_service: ArchiveService::new(),
            export_service: ExportService::new(),
            history_service: HistoryService::new(),
            prompt_service: PromptService::new(),
            summary_service: SummaryService::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn marker(&self) -> &M {
        &self.marker
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Validate and store a new transaction. Invalid input never reaches the store.
    pub async fn add_transaction(&mut self, transaction: NewTransaction) -> Result<Transaction, CoreError> {
        transaction.validate()?;
        let created = self.store.create(transaction.normalized()).await?;
        self.summaries.invalidate(created.month());
        tracing::info!("Added {} transaction {} ({})", created.kind, created.id, created.date);
        Ok(created)
    }

    /// Apply a partial update to transaction `id`.
    pub async fn update_transaction(
        &mut self,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::ValidationError("Nothing to update".into()));
        }
        patch.validate()?;
        let date_changed = patch.date.is_some();
        let updated = self.store.update(id, patch).await?;
        // The old month is unknown when the date changed, so drop everything.
        if date_changed {
            self.summaries.clear();
        } else {
            self.summaries.invalidate(updated.month());
        }
        tracing::info!("Updated transaction {id}");
        Ok(updated)
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), CoreError> {
        self.store.delete(id).await?;
        self.summaries.clear();
        tracing::info!("Deleted transaction {id}");
        Ok(())
    }

    /// Active transactions matching `filter`, newest first.
    pub async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        self.store.list(filter).await
    }

    /// Active transactions of `month`, newest first.
    pub async fn get_month_transactions(&self, month: MonthKey) -> Result<Vec<Transaction>, CoreError> {
        self.store.list(&TransactionFilter::for_month(month)).await
    }

    /// Search/period refinements over all active transactions.
    pub async fn search_transactions(&self, query: &HistoryQuery) -> Result<Vec<Transaction>, CoreError> {
        let all = self.store.list(&TransactionFilter::all()).await?;
        Ok(self.history_service.search(&all, query, today()))
    }

    /// Distinct categories used by active transactions (optionally in one month).
    pub async fn categories(&self, month: Option<MonthKey>) -> Result<Vec<String>, CoreError> {
        let filter = month.map(TransactionFilter::for_month).unwrap_or_default();
        let transactions = self.store.list(&filter).await?;
        Ok(self.history_service.categories(&transactions))
    }

    /// Months that have active transactions, most recent first.
    pub async fn available_months(&self) -> Result<Vec<AvailableMonth>, CoreError> {
        self.store.list_available_months().await
    }

    /// Delete every active transaction dated in `month`. Returns how many
    /// were removed.
    pub async fn clear_month(&mut self, month: MonthKey) -> Result<usize, CoreError> {
        let transactions = self.get_month_transactions(month).await?;
        for t in &transactions {
            self.store.delete(&t.id).await?;
        }
        self.summaries.invalidate(month);
        tracing::info!("Cleared {} transactions from {month}", transactions.len());
        Ok(transactions.len())
    }

    // ── Aggregation ─────────────────────────────────────────────────

    /// Totals and category breakdowns for `month`, or for everything active.
    pub async fn aggregate(&self, month: Option<MonthKey>) -> Result<Aggregation, CoreError> {
        let filter = month.map(TransactionFilter::for_month).unwrap_or_default();
        let transactions = self.store.list(&filter).await?;
        Ok(self.aggregation_service.aggregate(&transactions, month))
    }

    /// Current month's aggregation plus the most recent transactions.
    pub async fn dashboard(&self) -> Result<DashboardSnapshot, CoreError> {
        self.dashboard_on(today()).await
    }

    pub async fn dashboard_on(&self, today: NaiveDate) -> Result<DashboardSnapshot, CoreError> {
        let month = MonthKey::of(today);
        let all = self.store.list(&TransactionFilter::all()).await?;
        Ok(DashboardSnapshot {
            month,
            aggregation: self.aggregation_service.aggregate(&all, Some(month)),
            recent_transactions: self
                .history_service
                .recent(&all, self.settings.recent_transactions),
        })
    }

    /// Monthly summary, served from the cache when it still matches the store.
    pub async fn monthly_summary(&mut self, month: MonthKey) -> Result<MonthlySummary, CoreError> {
        self.summary_service
            .monthly_summary(&self.store, &mut self.summaries, month)
            .await
    }

    /// Check cached summaries against the store. Returns the evicted months.
    pub async fn verify_summaries(&mut self) -> Result<Vec<MonthKey>, CoreError> {
        self.summary_service
            .verify(&self.store, &mut self.summaries)
            .await
    }

    /// Recompute summaries for every month with active transactions.
    pub async fn rebuild_summaries(&mut self) -> Result<usize, CoreError> {
        self.summary_service
            .rebuild(&self.store, &mut self.summaries)
            .await
    }

    #[must_use]
    pub fn summary_cache(&self) -> &SummaryCache {
        &self.summaries
    }

    // ── Archives ────────────────────────────────────────────────────

    /// Move all active transactions of `month` into its archive.
    pub async fn archive_month(&mut self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        self.archive_month_at(month, Utc::now()).await
    }

    /// [`Self::archive_month`] with an explicit `archivedAt` timestamp.
    pub async fn archive_month_at(
        &mut self,
        month: MonthKey,
        archived_at: DateTime<Utc>,
    ) -> Result<MonthlyArchive, CoreError> {
        let archive = self
            .archive_service
            .archive_month(&self.store, month, archived_at)
            .await?;
        self.summaries.invalidate(month);
        Ok(archive)
    }

    /// Archive the month containing today's date.
    pub async fn archive_current_month(&mut self) -> Result<MonthlyArchive, CoreError> {
        self.archive_month(MonthKey::of(today())).await
    }

    pub async fn restore_month(&mut self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        let archive = self.archive_service.restore_month(&self.store, month).await?;
        self.summaries.invalidate(month);
        Ok(archive)
    }

    /// Permanently delete an archive; absent months are fine.
    pub async fn delete_archive(&mut self, month: MonthKey) -> Result<(), CoreError> {
        self.archive_service.delete_archive(&self.store, month).await
    }

    pub async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError> {
        self.archive_service.list_archives(&self.store).await
    }

    pub async fn get_archive(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        self.archive_service.require_archive(&self.store, month).await
    }

    pub async fn archive_stats(&self) -> Result<ArchiveStats, CoreError> {
        self.archive_service.archive_stats(&self.store).await
    }

    /// Months with active transactions and no archive, most recent first.
    pub async fn months_available_to_archive(&self) -> Result<Vec<MonthKey>, CoreError> {
        self.archive_service
            .months_available_to_archive(&self.store)
            .await
    }

    // ── Archive prompt ──────────────────────────────────────────────

    /// Whether to suggest archiving last month. `true` at most once per
    /// calendar month of use.
    pub async fn should_prompt_archive(&mut self) -> Result<bool, CoreError> {
        self.should_prompt_archive_on(today()).await
    }

    pub async fn should_prompt_archive_on(&mut self, today: NaiveDate) -> Result<bool, CoreError> {
        self.prompt_service
            .should_prompt(&mut self.marker, &self.store, today)
            .await
    }

    // ── Export ──────────────────────────────────────────────────────

    pub async fn export_archive_json(&self, month: MonthKey) -> Result<String, CoreError> {
        let archive = self.get_archive(month).await?;
        self.export_service.archive_json(&archive, Utc::now())
    }

    pub async fn export_archive_csv(&self, month: MonthKey) -> Result<String, CoreError> {
        let archive = self.get_archive(month).await?;
        self.export_service.archive_csv(&archive, &self.settings)
    }

    /// Text report for an archived month.
    pub async fn export_archive_report(&self, month: MonthKey) -> Result<String, CoreError> {
        let archive = self.get_archive(month).await?;
        Ok(self
            .export_service
            .text_report(month, &archive.transactions, &self.settings))
    }

    /// JSON export of a month's active transactions. `NotFound` when empty.
    pub async fn export_month_json(&self, month: MonthKey) -> Result<String, CoreError> {
        let transactions = self.require_month_transactions(month).await?;
        self.export_service.month_json(month, &transactions)
    }

    /// CSV export of a month's active transactions. `NotFound` when empty.
    pub async fn export_month_csv(&self, month: MonthKey) -> Result<String, CoreError> {
        let transactions = self.require_month_transactions(month).await?;
        self.export_service
            .transactions_csv(&transactions, &self.settings)
    }

    /// Text report of a month's active transactions. `NotFound` when empty.
    pub async fn export_month_report(&self, month: MonthKey) -> Result<String, CoreError> {
        let transactions = self.require_month_transactions(month).await?;
        Ok(self
            .export_service
            .text_report(month, &transactions, &self.settings))
    }

    /// CSV export of whatever `filter` selects (may be just the header row).
    pub async fn export_transactions_csv(&self, filter: &TransactionFilter) -> Result<String, CoreError> {
        let transactions = self.store.list(filter).await?;
        self.export_service
            .transactions_csv(&transactions, &self.settings)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn require_month_transactions(&self, month: MonthKey) -> Result<Vec<Transaction>, CoreError> {
        let transactions = self.get_month_transactions(month).await?;
        if transactions.is_empty() {
            return Err(CoreError::NotFound(format!(
                "No active transactions for month {month}"
            )));
        }
        Ok(transactions)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
