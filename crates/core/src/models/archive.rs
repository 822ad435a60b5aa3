use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::month::MonthKey;
use super::transaction::Transaction;

/// Totals stored alongside an archived month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    /// `total_income - total_expenses`
    pub balance: f64,
}

/// Immutable snapshot of one month's transactions, removed from the active set.
///
/// The JSON layout is shared with other clients of the same store and must
/// not change: `{ month, transactions, summary, archivedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyArchive {
    pub month: MonthKey,
    pub transactions: Vec<Transaction>,
    pub summary: ArchiveSummary,
    pub archived_at: DateTime<Utc>,
}

impl MonthlyArchive {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Ids of the archived transactions, in archive order.
    pub fn transaction_ids(&self) -> Vec<&str> {
        self.transactions.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Aggregate figures over all archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStats {
    pub total_archives: usize,
    /// Sum of transaction counts across archives
    pub total_transactions: usize,
    /// Earliest archived month, if any
    pub oldest_month: Option<MonthKey>,
}

/// A month that has active transactions, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableMonth {
    pub month_year: MonthKey,
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}
