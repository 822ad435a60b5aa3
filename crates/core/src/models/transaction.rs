use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::month::MonthKey;
use crate::errors::CoreError;

/// Minimum number of characters in a transaction description.
pub const MIN_DESCRIPTION_CHARS: usize = 3;

/// Smallest accepted magnitude for an amount.
pub const MIN_AMOUNT: f64 = 0.01;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Wire name, as used in filters and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(CoreError::ValidationError(format!(
                "Unknown transaction type '{other}': expected 'income' or 'expense'"
            ))),
        }
    }
}

/// A single income or expense entry.
///
/// `amount` may carry either sign; every aggregation works on its magnitude
/// and takes the direction from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque identifier assigned by the store
    pub id: String,

    pub description: String,

    pub amount: f64,

    #[serde(rename = "type")]
    pub kind: TransactionType,

    pub category: String,

    /// Calendar date (no time component)
    pub date: NaiveDate,
}

impl Transaction {
    /// Build a transaction from validated input and a store-assigned id.
    pub fn from_new(id: impl Into<String>, new: NewTransaction) -> Self {
        Self {
            id: id.into(),
            description: new.description,
            amount: new.amount,
            kind: new.kind,
            category: new.category,
            date: new.date,
        }
    }

    /// `abs(amount)`.
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }

    /// Contribution to a balance: `+abs` for income, `-abs` for expense.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Income => self.magnitude(),
            TransactionType::Expense => -self.magnitude(),
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// A transaction before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn new(
        kind: TransactionType,
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            kind,
            category: category.into(),
            date,
        }
    }

    pub fn income(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionType::Income, description, amount, category, date)
    }

    pub fn expense(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionType::Expense, description, amount, category, date)
    }

    /// Check required fields. Runs before anything reaches a store.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_description(&self.description)?;
        validate_amount(self.amount)?;
        validate_category(&self.category)?;
        validate_date(self.date)?;
        Ok(())
    }

    /// Trim text fields and store expenses as `-abs`, incomes as `+abs`.
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_string(),
            amount: signed_for(self.kind, self.amount),
            kind: self.kind,
            category: self.category.trim().to_string(),
            date: self.date,
        }
    }
}

/// Partial update for an existing transaction. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }

    /// Validate every field that is present.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(category) = &self.category {
            validate_category(category)?;
        }
        if let Some(date) = self.date {
            validate_date(date)?;
        }
        Ok(())
    }

    /// Apply the patch, re-deriving the amount sign from the resulting type.
    pub fn apply_to(&self, transaction: &mut Transaction) {
        if let Some(description) = &self.description {
            transaction.description = description.trim().to_string();
        }
        if let Some(kind) = self.kind {
            transaction.kind = kind;
        }
        if let Some(amount) = self.amount {
            transaction.amount = amount;
        }
        if self.kind.is_some() || self.amount.is_some() {
            transaction.amount = signed_for(transaction.kind, transaction.amount);
        }
        if let Some(category) = &self.category {
            transaction.category = category.trim().to_string();
        }
        if let Some(date) = self.date {
            transaction.date = date;
        }
    }
}

/// Query accepted by [`crate::store::traits::TransactionStore::list`].
///
/// All fields are optional. `page` is 1-based and only applies together
/// with `limit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_month(month: MonthKey) -> Self {
        Self {
            year: Some(month.year()),
            month: Some(month.month()),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_page(mut self, page: usize, limit: usize) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// Field predicate, ignoring paging.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        use chrono::Datelike;

        self.year.map_or(true, |y| transaction.date.year() == y)
            && self.month.map_or(true, |m| transaction.date.month() == m)
            && self.kind.map_or(true, |k| transaction.kind == k)
            && self
                .category
                .as_deref()
                .map_or(true, |c| transaction.category == c)
    }

    /// Filter, order newest first, then apply paging.
    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let mut selected: Vec<Transaction> = transactions
            .iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.date.cmp(&a.date));

        match self.limit {
            Some(limit) => {
                let page = self.page.unwrap_or(1).max(1);
                selected
                    .into_iter()
                    .skip((page - 1).saturating_mul(limit))
                    .take(limit)
                    .collect()
            }
            None => selected,
        }
    }
}

fn signed_for(kind: TransactionType, amount: f64) -> f64 {
    match kind {
        TransactionType::Income => amount.abs(),
        TransactionType::Expense => -amount.abs(),
    }
}

fn validate_description(description: &str) -> Result<(), CoreError> {
    let len = description.trim().chars().count();
    if len < MIN_DESCRIPTION_CHARS {
        return Err(CoreError::ValidationError(format!(
            "Description must have at least {MIN_DESCRIPTION_CHARS} characters (got {len})"
        )));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !amount.is_finite() {
        return Err(CoreError::ValidationError(
            "Amount must be a finite number".into(),
        ));
    }
    if amount.abs() < MIN_AMOUNT {
        return Err(CoreError::ValidationError(format!(
            "Amount must be at least {MIN_AMOUNT} in magnitude (got {amount})"
        )));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), CoreError> {
    if category.trim().is_empty() {
        return Err(CoreError::ValidationError("Category is required".into()));
    }
    Ok(())
}

/// The date must fall in a month that has a `YYYY-MM` key.
fn validate_date(date: NaiveDate) -> Result<(), CoreError> {
    use chrono::Datelike;

    MonthKey::new(date.year(), date.month())
        .map(|_| ())
        .map_err(|_| {
            CoreError::ValidationError(format!(
                "Date {date} is out of range: year must be between 1 and 9999"
            ))
        })
}
