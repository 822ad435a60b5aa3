use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::month::MonthKey;
use super::transaction::Transaction;

/// Per-month totals over the active transactions.
///
/// Derived data: always recomputable from the store, never the source of
/// truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub transaction_count: usize,
    /// Ids of the transactions the totals were computed from
    pub transaction_ids: Vec<String>,
}

impl MonthlySummary {
    /// Whether this summary was computed from exactly `transactions`.
    pub fn covers(&self, transactions: &[Transaction]) -> bool {
        if self.transaction_count != transactions.len()
            || self.transaction_ids.len() != transactions.len()
        {
            return false;
        }
        let cached: BTreeSet<&str> = self.transaction_ids.iter().map(String::as_str).collect();
        let current: BTreeSet<&str> = transactions.iter().map(|t| t.id.as_str()).collect();
        cached == current
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedSummary {
    summary: MonthlySummary,
    computed_at: DateTime<Utc>,
}

/// In-memory fast path for [`MonthlySummary`] lookups.
#[derive(Debug, Clone, Default)]
pub struct SummaryCache {
    entries: HashMap<MonthKey, CachedSummary>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, month: MonthKey) -> Option<&MonthlySummary> {
        self.entries.get(&month).map(|c| &c.summary)
    }

    /// When the entry for `month` was computed.
    pub fn computed_at(&self, month: MonthKey) -> Option<DateTime<Utc>> {
        self.entries.get(&month).map(|c| c.computed_at)
    }

    pub fn insert(&mut self, summary: MonthlySummary) {
        self.entries.insert(
            summary.month,
            CachedSummary {
                summary,
                computed_at: Utc::now(),
            },
        );
    }

    /// Drop the entry for `month`. Returns `true` if one existed.
    pub fn invalidate(&mut self, month: MonthKey) -> bool {
        self.entries.remove(&month).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached months, oldest first.
    pub fn months(&self) -> Vec<MonthKey> {
        let mut months: Vec<MonthKey> = self.entries.keys().copied().collect();
        months.sort();
        months
    }
}
