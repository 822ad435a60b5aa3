// ═══════════════════════════════════════════════════════════════════
// Integration Tests: FinanceTracker facade end to end
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{Local, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::time::Duration;

use finance_tracker_core::errors::CoreError;
use finance_tracker_core::models::archive::{AvailableMonth, MonthlyArchive};
use finance_tracker_core::models::month::MonthKey;
use finance_tracker_core::models::settings::Settings;
use finance_tracker_core::models::transaction::{
    NewTransaction, Transaction, TransactionFilter, TransactionPatch, TransactionType,
};
use finance_tracker_core::services::history_service::HistoryQuery;
use finance_tracker_core::store::local::LocalStore;
use finance_tracker_core::store::marker::{FileMarker, MemoryMarker};
use finance_tracker_core::store::timeout::TimeoutStore;
use finance_tracker_core::store::traits::{ArchiveStore, TransactionStore};
use finance_tracker_core::FinanceTracker;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(y: i32, m: u32) -> MonthKey {
    MonthKey::new(y, m).unwrap()
}

fn tracker() -> FinanceTracker<LocalStore> {
    FinanceTracker::new(LocalStore::new(), MemoryMarker::new(), Settings::default())
}

/// Salary 1000, Mercado 300, Bus 100 in May 2024; Rent 800 in June 2024.
async fn seeded() -> FinanceTracker<LocalStore> {
    let mut t = tracker();
    t.add_transaction(NewTransaction::income("Salary", 1000.0, "Salary", date(2024, 5, 1)))
        .await
        .unwrap();
    t.add_transaction(NewTransaction::expense("Mercado", 300.0, "Alimentação", date(2024, 5, 12)))
        .await
        .unwrap();
    t.add_transaction(NewTransaction::expense("Bus pass", 100.0, "Transport", date(2024, 5, 20)))
        .await
        .unwrap();
    t.add_transaction(NewTransaction::expense("Rent", 800.0, "Housing", date(2024, 6, 5)))
        .await
        .unwrap();
    t
}

fn ids(transactions: &[Transaction]) -> HashSet<String> {
    transactions.iter().map(|t| t.id.clone()).collect()
}

// ═══════════════════════════════════════════════════════════════════
// Mock Store
// ═══════════════════════════════════════════════════════════════════

/// Never answers within any reasonable bound.
struct StalledStore;

#[async_trait]
impl TransactionStore for StalledStore {
    fn name(&self) -> &str {
        "StalledStore"
    }

    async fn list(&self, _filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, CoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Transaction::from_new("never", transaction))
    }

    async fn update(&self, id: &str, _patch: TransactionPatch) -> Result<Transaction, CoreError> {
        Err(CoreError::NotFound(format!("Transaction {id}")))
    }

    async fn delete(&self, _id: &str) -> Result<(), CoreError> {
        Ok(())
    }

    async fn list_available_months(&self) -> Result<Vec<AvailableMonth>, CoreError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ArchiveStore for StalledStore {
    async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_archive(&self, _month: MonthKey) -> Result<Option<MonthlyArchive>, CoreError> {
        Ok(None)
    }

    async fn commit_archive(&self, _archive: &MonthlyArchive) -> Result<(), CoreError> {
        Ok(())
    }

    async fn commit_restore(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        Err(CoreError::NotFound(format!("No archive for month {month}")))
    }

    async fn delete_archive(&self, _month: MonthKey) -> Result<(), CoreError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transactions
// ═══════════════════════════════════════════════════════════════════

mod transactions {
    use super::*;

    #[tokio::test]
    async fn add_normalizes_and_assigns_id() {
        let mut t = tracker();
        let created = t
            .add_transaction(NewTransaction::expense(" Mercado ", 300.0, "Alimentação", date(2024, 5, 12)))
            .await
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.amount, -300.0);
        assert_eq!(created.description, "Mercado");
        assert_eq!(created.kind, TransactionType::Expense);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_store() {
        let mut t = tracker();
        let err = t
            .add_transaction(NewTransaction::expense("ab", 300.0, "Food", date(2024, 5, 12)))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = t
            .add_transaction(NewTransaction::income("Salary", 0.0, "Work", date(2024, 5, 12)))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(t.get_transactions(&TransactionFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let mut t = seeded().await;
        let rent = t
            .get_transactions(&TransactionFilter::all().with_category("Housing"))
            .await
            .unwrap()
            .remove(0);

        let patch = TransactionPatch {
            amount: Some(850.0),
            ..Default::default()
        };
        let updated = t.update_transaction(&rent.id, patch).await.unwrap();
        assert_eq!(updated.amount, -850.0);

        t.delete_transaction(&rent.id).await.unwrap();
        assert!(t
            .delete_transaction(&rent.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn empty_or_invalid_patch_rejected() {
        let mut t = seeded().await;
        let any = t.get_transactions(&TransactionFilter::all()).await.unwrap().remove(0);

        assert!(t
            .update_transaction(&any.id, TransactionPatch::default())
            .await
            .unwrap_err()
            .is_validation());

        let bad = TransactionPatch {
            description: Some("x".into()),
            ..Default::default()
        };
        assert!(t.update_transaction(&any.id, bad).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let mut t = seeded().await;
        let patch = TransactionPatch {
            category: Some("Food".into()),
            ..Default::default()
        };
        assert!(t.update_transaction("nope", patch).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn month_listing_and_available_months() {
        let t = seeded().await;
        let may = t.get_month_transactions(month(2024, 5)).await.unwrap();
        assert_eq!(may.len(), 3);
        assert_eq!(may[0].date, date(2024, 5, 20));

        let months = t.available_months().await.unwrap();
        let keys: Vec<MonthKey> = months.iter().map(|m| m.month_year).collect();
        assert_eq!(keys, vec![month(2024, 6), month(2024, 5)]);
        assert_eq!(months[1].count, 3);
    }

    #[tokio::test]
    async fn search_and_categories() {
        let t = seeded().await;
        let found = t
            .search_transactions(&HistoryQuery {
                search: Some("merc".into()),
                period: None,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Mercado");

        assert_eq!(
            t.categories(None).await.unwrap(),
            vec!["Alimentação", "Housing", "Salary", "Transport"]
        );
        assert_eq!(t.categories(Some(month(2024, 6))).await.unwrap(), vec!["Housing"]);
    }

    #[tokio::test]
    async fn clear_month_deletes_only_that_month() {
        let mut t = seeded().await;
        assert_eq!(t.clear_month(month(2024, 5)).await.unwrap(), 3);
        assert_eq!(t.clear_month(month(2024, 5)).await.unwrap(), 0);
        assert_eq!(t.get_transactions(&TransactionFilter::all()).await.unwrap().len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Aggregation & summaries
// ═══════════════════════════════════════════════════════════════════

mod aggregation {
    use super::*;

    #[tokio::test]
    async fn month_aggregation() {
        let t = seeded().await;
        let agg = t.aggregate(Some(month(2024, 5))).await.unwrap();
        assert_eq!(agg.total_income, 1000.0);
        assert_eq!(agg.total_expenses, 400.0);
        assert_eq!(agg.balance, 600.0);
        assert_eq!(agg.expenses_by_category[0].name, "Alimentação");
        assert_eq!(agg.expenses_by_category[0].percentage, 75);
        assert_eq!(agg.expenses_by_category[1].percentage, 25);
    }

    #[tokio::test]
    async fn all_time_aggregation() {
        let t = seeded().await;
        let agg = t.aggregate(None).await.unwrap();
        assert_eq!(agg.total_expenses, 1200.0);
        assert_eq!(agg.balance, -200.0);
        assert_eq!(agg.transaction_count, 4);
    }

    #[tokio::test]
    async fn empty_month_is_all_zero() {
        let t = seeded().await;
        let agg = t.aggregate(Some(month(2020, 1))).await.unwrap();
        assert_eq!(agg.transaction_count, 0);
        assert_eq!(agg.balance, 0.0);
    }

    #[tokio::test]
    async fn dashboard_snapshot() {
        let t = seeded().await;
        let dash = t.dashboard_on(date(2024, 6, 15)).await.unwrap();
        assert_eq!(dash.month, month(2024, 6));
        assert_eq!(dash.aggregation.total_expenses, 800.0);
        assert_eq!(dash.aggregation.total_income, 0.0);
        assert_eq!(dash.recent_transactions.len(), 4);
        assert_eq!(dash.recent_transactions[0].description, "Rent");
    }

    #[tokio::test]
    async fn dashboard_respects_recent_setting() {
        let mut t = seeded().await;
        t.set_settings(Settings {
            recent_transactions: 2,
            ..Settings::default()
        });
        let dash = t.dashboard_on(date(2024, 6, 15)).await.unwrap();
        assert_eq!(dash.recent_transactions.len(), 2);
        assert_eq!(t.settings().recent_transactions, 2);
    }

    #[tokio::test]
    async fn summary_cache_follows_mutations() {
        let mut t = seeded().await;
        let first = t.monthly_summary(month(2024, 5)).await.unwrap();
        assert_eq!(first.balance, 600.0);
        assert!(t.summary_cache().get(month(2024, 5)).is_some());

        t.add_transaction(NewTransaction::income("Refund", 50.0, "Other", date(2024, 5, 25)))
            .await
            .unwrap();
        assert!(t.summary_cache().get(month(2024, 5)).is_none());

        let second = t.monthly_summary(month(2024, 5)).await.unwrap();
        assert_eq!(second.balance, 650.0);
        assert_eq!(second.transaction_count, 4);
    }

    #[tokio::test]
    async fn moving_a_transaction_between_months_refreshes_both() {
        let mut t = seeded().await;
        t.monthly_summary(month(2024, 5)).await.unwrap();
        t.monthly_summary(month(2024, 6)).await.unwrap();

        let rent = t.get_month_transactions(month(2024, 6)).await.unwrap().remove(0);
        let patch = TransactionPatch {
            date: Some(date(2024, 5, 31)),
            ..Default::default()
        };
        t.update_transaction(&rent.id, patch).await.unwrap();

        assert_eq!(t.monthly_summary(month(2024, 5)).await.unwrap().total_expenses, 1200.0);
        assert_eq!(t.monthly_summary(month(2024, 6)).await.unwrap().transaction_count, 0);
    }

    #[tokio::test]
    async fn verify_and_rebuild() {
        let mut t = seeded().await;
        assert_eq!(t.rebuild_summaries().await.unwrap(), 2);
        assert!(t.verify_summaries().await.unwrap().is_empty());

        // Change the store directly, bypassing the facade's invalidation.
        t.store()
            .create(NewTransaction::income("Side job", 10.0, "Work", date(2024, 6, 9)))
            .await
            .unwrap();
        assert_eq!(t.verify_summaries().await.unwrap(), vec![month(2024, 6)]);
    }

    #[tokio::test]
    async fn summary_tracks_amount_edits_made_directly_on_the_store() {
        let mut t = tracker();
        let salary = t
            .add_transaction(NewTransaction::income("Salary", 1000.0, "Work", date(2024, 5, 1)))
            .await
            .unwrap();
        assert_eq!(t.monthly_summary(month(2024, 5)).await.unwrap().total_income, 1000.0);

        let patch = TransactionPatch {
            amount: Some(5000.0),
            ..Default::default()
        };
        t.store().update(&salary.id, patch).await.unwrap();

        let summary = t.monthly_summary(month(2024, 5)).await.unwrap();
        assert_eq!(summary.total_income, 5000.0);
        assert_eq!(summary.balance, 5000.0);
    }

    #[tokio::test]
    async fn out_of_range_year_never_reaches_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let mut t = FinanceTracker::open_local(&path, Settings::default()).unwrap();
            let far = NaiveDate::from_ymd_opt(10000, 1, 5).unwrap();
            let err = t
                .add_transaction(NewTransaction::income("Salary", 10.0, "Work", far))
                .await
                .unwrap_err();
            assert!(err.is_validation());

            let kept = t
                .add_transaction(NewTransaction::income("Salary", 10.0, "Work", date(2024, 5, 1)))
                .await
                .unwrap();
            let patch = TransactionPatch {
                date: Some(far),
                ..Default::default()
            };
            assert!(t.update_transaction(&kept.id, patch).await.unwrap_err().is_validation());
            t.archive_month(month(2024, 5)).await.unwrap();
        }

        let t = FinanceTracker::open_local(&path, Settings::default()).unwrap();
        assert_eq!(t.list_archives().await.unwrap().len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Archive lifecycle
// ═══════════════════════════════════════════════════════════════════

mod archive {
    use super::*;

    fn at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn archive_restore_round_trip() {
        let mut t = seeded().await;
        let before = t.get_month_transactions(month(2024, 5)).await.unwrap();

        let archive = t.archive_month_at(month(2024, 5), at()).await.unwrap();
        assert_eq!(archive.summary.balance, 600.0);
        assert!(t.get_month_transactions(month(2024, 5)).await.unwrap().is_empty());
        assert_eq!(t.list_archives().await.unwrap().len(), 1);
        assert_eq!(t.months_available_to_archive().await.unwrap(), vec![month(2024, 6)]);

        let agg = t.aggregate(Some(month(2024, 5))).await.unwrap();
        assert_eq!(agg.transaction_count, 0);

        t.restore_month(month(2024, 5)).await.unwrap();
        let after = t.get_month_transactions(month(2024, 5)).await.unwrap();
        assert_eq!(ids(&before), ids(&after));
        assert!(t.list_archives().await.unwrap().is_empty());
        assert_eq!(t.aggregate(Some(month(2024, 5))).await.unwrap().balance, 600.0);
    }

    #[tokio::test]
    async fn archive_errors() {
        let mut t = seeded().await;
        assert!(t.archive_month(month(2023, 1)).await.unwrap_err().is_not_found());
        assert!(t.restore_month(month(2024, 5)).await.unwrap_err().is_not_found());
        assert!(t.get_archive(month(2024, 5)).await.unwrap_err().is_not_found());

        t.archive_month(month(2024, 5)).await.unwrap();
        assert!(t.archive_month(month(2024, 5)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn archive_current_month_uses_local_date() {
        let mut t = tracker();
        let today = Local::now().date_naive();
        t.add_transaction(NewTransaction::income("Today", 5.0, "Other", today))
            .await
            .unwrap();

        let archive = t.archive_current_month().await.unwrap();
        assert_eq!(archive.month, MonthKey::of(today));
    }

    #[tokio::test]
    async fn delete_archive_purges() {
        let mut t = seeded().await;
        t.archive_month(month(2024, 5)).await.unwrap();
        t.delete_archive(month(2024, 5)).await.unwrap();
        t.delete_archive(month(2024, 5)).await.unwrap();

        assert!(t.list_archives().await.unwrap().is_empty());
        assert!(t.get_month_transactions(month(2024, 5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats() {
        let mut t = seeded().await;
        t.archive_month(month(2024, 6)).await.unwrap();
        t.archive_month(month(2024, 5)).await.unwrap();
        let stats = t.archive_stats().await.unwrap();
        assert_eq!(stats.total_archives, 2);
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.oldest_month, Some(month(2024, 5)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Archive prompt
// ═══════════════════════════════════════════════════════════════════

mod prompt {
    use super::*;

    #[tokio::test]
    async fn once_per_month() {
        let mut t = seeded().await;
        assert!(t.should_prompt_archive_on(date(2024, 6, 3)).await.unwrap());
        assert!(!t.should_prompt_archive_on(date(2024, 6, 4)).await.unwrap());
        assert!(t.should_prompt_archive_on(date(2024, 7, 1)).await.unwrap());
    }

    #[tokio::test]
    async fn file_marker_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let marker_path = dir.path().join("archive-check");
        let store = LocalStore::new();
        store
            .create(NewTransaction::income("Salary", 10.0, "Work", date(2024, 5, 1)))
            .await
            .unwrap();

        let mut first = FinanceTracker::new(store, FileMarker::new(&marker_path), Settings::default());
        assert!(first.should_prompt_archive_on(date(2024, 6, 2)).await.unwrap());

        let store = LocalStore::from_ledger(first.store().snapshot().unwrap());
        let mut second = FinanceTracker::new(store, FileMarker::new(&marker_path), Settings::default());
        assert!(!second.should_prompt_archive_on(date(2024, 6, 20)).await.unwrap());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Exports
// ═══════════════════════════════════════════════════════════════════

mod exports {
    use super::*;

    #[tokio::test]
    async fn archive_exports() {
        let mut t = seeded().await;
        t.archive_month(month(2024, 5)).await.unwrap();

        let csv = t.export_archive_csv(month(2024, 5)).await.unwrap();
        assert!(csv.starts_with('\u{FEFF}'));
        assert!(csv.contains("\"12/05/2024\",\"Mercado\",\"Alimentação\",\"Despesa\",\"-300\"\n"));
        assert_eq!(csv.lines().count(), 4);

        let json = t.export_archive_json(month(2024, 5)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "JSON");
        assert_eq!(value["transactions"].as_array().unwrap().len(), 3);

        let report = t.export_archive_report(month(2024, 5)).await.unwrap();
        assert!(report.starts_with("RELATÓRIO FINANCEIRO - Maio 2024\n"));
        assert!(report.contains("Saldo Final: R$ 600,00"));
    }

    #[tokio::test]
    async fn archive_export_of_missing_month_is_not_found() {
        let t = seeded().await;
        assert!(t.export_archive_csv(month(2024, 5)).await.unwrap_err().is_not_found());
        assert!(t.export_archive_json(month(2024, 5)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn active_month_exports() {
        let t = seeded().await;
        let json = t.export_month_json(month(2024, 5)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["transactionCount"], 3);

        let csv = t.export_month_csv(month(2024, 6)).await.unwrap();
        assert!(csv.contains("\"05/06/2024\",\"Rent\",\"Housing\",\"Despesa\",\"-800\""));

        let report = t.export_month_report(month(2024, 6)).await.unwrap();
        assert!(report.contains("05/06/2024 | DESPESA | Housing | Rent | -R$ 800,00"));

        assert!(t.export_month_json(month(2020, 1)).await.unwrap_err().is_not_found());
        assert!(t.export_month_report(month(2020, 1)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn filtered_csv_export() {
        let t = seeded().await;
        let csv = t
            .export_transactions_csv(&TransactionFilter::all().with_kind(TransactionType::Income))
            .await
            .unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("\"Salary\",\"Salary\",\"Receita\",\"1000\""));

        let none = t
            .export_transactions_csv(&TransactionFilter::for_month(month(2020, 1)))
            .await
            .unwrap();
        assert_eq!(none.lines().count(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Backends
// ═══════════════════════════════════════════════════════════════════

mod backends {
    use super::*;

    #[tokio::test]
    async fn in_memory_tracker() {
        let mut t = FinanceTracker::in_memory();
        t.add_transaction(NewTransaction::income("Salary", 10.0, "Work", date(2024, 5, 1)))
            .await
            .unwrap();
        assert_eq!(t.store().limit(), Duration::from_secs(10));
        assert_eq!(t.aggregate(None).await.unwrap().total_income, 10.0);
    }

    #[tokio::test]
    async fn local_file_tracker_persists_archives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let mut t = FinanceTracker::open_local(&path, Settings::default()).unwrap();
            t.add_transaction(NewTransaction::income("Salary", 1000.0, "Work", date(2024, 5, 1)))
                .await
                .unwrap();
            t.add_transaction(NewTransaction::expense("Rent", 800.0, "Housing", date(2024, 6, 5)))
                .await
                .unwrap();
            t.archive_month(month(2024, 5)).await.unwrap();
        }

        let t = FinanceTracker::open_local(&path, Settings::default()).unwrap();
        assert_eq!(t.list_archives().await.unwrap().len(), 1);
        let active = t.get_transactions(&TransactionFilter::all()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].description, "Rent");
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let store = TimeoutStore::new(StalledStore, Duration::from_millis(30));
        let mut t = FinanceTracker::new(store, MemoryMarker::new(), Settings::default());

        let err = t
            .add_transaction(NewTransaction::income("Salary", 10.0, "Work", date(2024, 5, 1)))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        let err = t.aggregate(None).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { ref operation, after_ms: 30 } if operation == "list"));
    }

    #[test]
    fn http_tracker_builds_from_settings() {
        let settings = Settings {
            api_base_url: "http://127.0.0.1:3000/".into(),
            ..Settings::default()
        };
        let t = FinanceTracker::connect(settings).unwrap();
        assert_eq!(t.store().base_url(), "http://127.0.0.1:3000");
        assert_eq!(t.store().name(), "HttpStore");
    }
}
