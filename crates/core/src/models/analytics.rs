use serde::{Deserialize, Serialize};

use super::month::MonthKey;
use super::transaction::{Transaction, TransactionType};

/// One category's share of an income or expense subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub name: String,

    /// Sum of `abs(amount)` in this category
    pub total: f64,

    /// Number of transactions (always ≥ 1)
    pub count: usize,

    /// `total / count`
    pub average: f64,

    /// `round(100 × total / subtotal)`, 0 when the subtotal is 0
    pub percentage: u32,
}

/// The category with the most transactions across both types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFrequency {
    pub name: String,
    pub count: usize,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Totals and per-category breakdowns for a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    /// Month the figures are scoped to; `None` means all transactions
    pub period: Option<MonthKey>,

    pub total_income: f64,
    pub total_expenses: f64,

    /// `total_income - total_expenses`
    pub balance: f64,

    pub transaction_count: usize,
    pub income_count: usize,
    pub expense_count: usize,

    /// Sorted by total, largest first
    pub expenses_by_category: Vec<CategoryBreakdown>,
    pub incomes_by_category: Vec<CategoryBreakdown>,

    pub most_frequent_category: Option<CategoryFrequency>,
}

impl Aggregation {
    /// All-zero result for an empty transaction set.
    pub fn empty(period: Option<MonthKey>) -> Self {
        Self {
            period,
            total_income: 0.0,
            total_expenses: 0.0,
            balance: 0.0,
            transaction_count: 0,
            income_count: 0,
            expense_count: 0,
            expenses_by_category: Vec::new(),
            incomes_by_category: Vec::new(),
            most_frequent_category: None,
        }
    }

    pub fn biggest_expense_category(&self) -> Option<&CategoryBreakdown> {
        self.expenses_by_category.first()
    }

    pub fn biggest_income_category(&self) -> Option<&CategoryBreakdown> {
        self.incomes_by_category.first()
    }
}

/// What the dashboard shows: the current month plus the latest entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub month: MonthKey,
    pub aggregation: Aggregation,
    /// Newest first, across all active months
    pub recent_transactions: Vec<Transaction>,
}
