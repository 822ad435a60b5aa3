use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::month::MonthKey;
use crate::models::transaction::Transaction;

/// Period presets offered when browsing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelativePeriod {
    /// From the first day of the current month
    ThisMonth,
    /// The whole previous calendar month
    LastMonth,
    /// From the first day of the month three months back
    Last3Months,
}

impl RelativePeriod {
    /// Inclusive date bounds relative to `today`. The upper bound is `None`
    /// when the period is open-ended.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, Option<NaiveDate>) {
        let current = MonthKey::of(today);
        match self {
            RelativePeriod::ThisMonth => (current.first_day(), None),
            RelativePeriod::LastMonth => {
                let previous = current.previous();
                (previous.first_day(), Some(previous.last_day()))
            }
            RelativePeriod::Last3Months => {
                let start = current.previous().previous().previous();
                (start.first_day(), None)
            }
        }
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let (from, to) = self.bounds(today);
        date >= from && to.map_or(true, |to| date <= to)
    }
}

/// Client-side refinements over an already-fetched transaction list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Case-insensitive match on description or category
    pub search: Option<String>,
    pub period: Option<RelativePeriod>,
}

/// Browsing helpers for the history and dashboard views.
pub struct HistoryService;

impl HistoryService {
    pub fn new() -> Self {
        Self
    }

    /// Apply `query`, returning newest first.
    pub fn search(
        &self,
        transactions: &[Transaction],
        query: &HistoryQuery,
        today: NaiveDate,
    ) -> Vec<Transaction> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut found: Vec<Transaction> = transactions
            .iter()
            .filter(|t| {
                needle.as_deref().map_or(true, |n| {
                    t.description.to_lowercase().contains(n) || t.category.to_lowercase().contains(n)
                })
            })
            .filter(|t| query.period.map_or(true, |p| p.contains(t.date, today)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found
    }

    /// The `count` most recent transactions.
    pub fn recent(&self, transactions: &[Transaction], count: usize) -> Vec<Transaction> {
        let mut sorted = transactions.to_vec();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted.truncate(count);
        sorted
    }

    /// Distinct category names, sorted.
    pub fn categories(&self, transactions: &[Transaction]) -> Vec<String> {
        let mut names: Vec<String> = transactions.iter().map(|t| t.category.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}
