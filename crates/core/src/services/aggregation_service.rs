use std::collections::HashMap;

use crate::models::analytics::{Aggregation, CategoryBreakdown, CategoryFrequency};
use crate::models::archive::ArchiveSummary;
use crate::models::month::MonthKey;
use crate::models::summary::MonthlySummary;
use crate::models::transaction::{Transaction, TransactionType};

/// Computes totals and per-category breakdowns over transaction sets.
///
/// Pure business logic with no I/O and no store calls. Every path goes through
/// `Transaction::magnitude`, so the stored sign of an amount never matters:
/// the type decides the direction.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate the transactions that fall in `period` (all of them when `None`).
    pub fn aggregate(&self, transactions: &[Transaction], period: Option<MonthKey>) -> Aggregation {
        let scoped = Self::filter_period(transactions, period);
        if scoped.is_empty() {
            return Aggregation::empty(period);
        }

        let (total_income, income_count) = Self::subtotal(&scoped, TransactionType::Income);
        let (total_expenses, expense_count) = Self::subtotal(&scoped, TransactionType::Expense);

        let expenses_by_category = self.category_breakdown(&scoped, TransactionType::Expense);
        let incomes_by_category = self.category_breakdown(&scoped, TransactionType::Income);
        let most_frequent_category =
            Self::most_frequent_category(&expenses_by_category, &incomes_by_category);

        Aggregation {
            period,
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            transaction_count: scoped.len(),
            income_count,
            expense_count,
            expenses_by_category,
            incomes_by_category,
            most_frequent_category,
        }
    }

    /// Transactions dated inside `period`, in input order.
    pub fn filter_period(transactions: &[Transaction], period: Option<MonthKey>) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|t| period.map_or(true, |m| m.contains(t.date)))
            .collect()
    }

    /// Per-category totals for one transaction type, largest total first.
    ///
    /// Categories keep the order they were first seen in when totals tie.
    pub fn category_breakdown(
        &self,
        transactions: &[&Transaction],
        kind: TransactionType,
    ) -> Vec<CategoryBreakdown> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, f64, usize)> = Vec::new();

        for t in transactions.iter().filter(|t| t.kind == kind) {
            match index.get(t.category.as_str()) {
                Some(&idx) => {
                    groups[idx].1 += t.magnitude();
                    groups[idx].2 += 1;
                }
                None => {
                    index.insert(t.category.as_str(), groups.len());
                    groups.push((t.category.as_str(), t.magnitude(), 1));
                }
            }
        }

        let subtotal: f64 = groups.iter().map(|(_, total, _)| total).sum();

        let mut breakdown: Vec<CategoryBreakdown> = groups
            .into_iter()
            .map(|(name, total, count)| CategoryBreakdown {
                name: name.to_string(),
                total,
                count,
                average: total / count as f64,
                percentage: percentage_of(total, subtotal),
            })
            .collect();

        // Stable: ties keep encounter order.
        breakdown.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        breakdown
    }

    /// Highest transaction count across expense then income categories.
    /// The first entry wins a tie.
    pub fn most_frequent_category(
        expenses: &[CategoryBreakdown],
        incomes: &[CategoryBreakdown],
    ) -> Option<CategoryFrequency> {
        let candidates = expenses
            .iter()
            .map(|c| (c, TransactionType::Expense))
            .chain(incomes.iter().map(|c| (c, TransactionType::Income)));

        let mut best: Option<(&CategoryBreakdown, TransactionType)> = None;
        for (category, kind) in candidates {
            if best.map_or(true, |(b, _)| category.count > b.count) {
                best = Some((category, kind));
            }
        }

        best.map(|(c, kind)| CategoryFrequency {
            name: c.name.clone(),
            count: c.count,
            kind,
        })
    }

    /// Totals stored with an archive.
    pub fn summarize_archive(&self, transactions: &[Transaction]) -> ArchiveSummary {
        let all: Vec<&Transaction> = transactions.iter().collect();
        let (total_income, _) = Self::subtotal(&all, TransactionType::Income);
        let (total_expenses, _) = Self::subtotal(&all, TransactionType::Expense);
        ArchiveSummary {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
        }
    }

    /// Monthly summary over the transactions of `month`.
    pub fn summarize_month(&self, month: MonthKey, transactions: &[Transaction]) -> MonthlySummary {
        let scoped = Self::filter_period(transactions, Some(month));
        let (total_income, _) = Self::subtotal(&scoped, TransactionType::Income);
        let (total_expenses, _) = Self::subtotal(&scoped, TransactionType::Expense);
        MonthlySummary {
            month,
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            transaction_count: scoped.len(),
            transaction_ids: scoped.iter().map(|t| t.id.clone()).collect(),
        }
    }

    fn subtotal(transactions: &[&Transaction], kind: TransactionType) -> (f64, usize) {
        transactions
            .iter()
            .filter(|t| t.kind == kind)
            .fold((0.0, 0), |(sum, count), t| (sum + t.magnitude(), count + 1))
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}

/// `round(100 × part / whole)`, 0 when `whole` is 0.
pub fn percentage_of(part: f64, whole: f64) -> u32 {
    if whole > 0.0 {
        (part / whole * 100.0).round() as u32
    } else {
        0
    }
}
