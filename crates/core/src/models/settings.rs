use serde::{Deserialize, Serialize};

use super::transaction::TransactionType;

/// Labels used by the CSV and text exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportLabels {
    pub date: String,
    pub description: String,
    pub category: String,
    pub kind: String,
    pub amount: String,
    pub income: String,
    pub expense: String,
    pub report_title: String,
    pub total_income: String,
    pub total_expenses: String,
    pub balance: String,
    pub transaction_count: String,
    pub details: String,
}

impl ExportLabels {
    /// Human label for a transaction type.
    pub fn kind_label(&self, kind: TransactionType) -> &str {
        match kind {
            TransactionType::Income => &self.income,
            TransactionType::Expense => &self.expense,
        }
    }

    /// CSV header row: Date, Description, Category, Type, Amount.
    pub fn header(&self) -> [&str; 5] {
        [
            &self.date,
            &self.description,
            &self.category,
            &self.kind,
            &self.amount,
        ]
    }

    /// English labels.
    pub fn english() -> Self {
        Self {
            date: "Date".into(),
            description: "Description".into(),
            category: "Category".into(),
            kind: "Type".into(),
            amount: "Amount".into(),
            income: "Income".into(),
            expense: "Expense".into(),
            report_title: "FINANCIAL REPORT".into(),
            total_income: "Total income".into(),
            total_expenses: "Total expenses".into(),
            balance: "Balance".into(),
            transaction_count: "Transactions".into(),
            details: "TRANSACTION DETAILS".into(),
        }
    }
}

impl Default for ExportLabels {
    fn default() -> Self {
        Self {
            date: "Data".into(),
            description: "Descrição".into(),
            category: "Categoria".into(),
            kind: "Tipo".into(),
            amount: "Valor".into(),
            income: "Receita".into(),
            expense: "Despesa".into(),
            report_title: "RELATÓRIO FINANCEIRO".into(),
            total_income: "Total de Receitas".into(),
            total_expenses: "Total de Despesas".into(),
            balance: "Saldo Final".into(),
            transaction_count: "Total de Transações".into(),
            details: "DETALHAMENTO DAS TRANSAÇÕES".into(),
        }
    }
}

/// User-configurable settings, loaded from a JSON file next to the ledger.
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Upper bound for a single Transaction Store call.
    pub store_timeout_secs: u64,

    /// Base URL of the remote store API.
    pub api_base_url: String,

    /// How many entries the dashboard lists as "recent".
    pub recent_transactions: usize,

    /// Prefix CSV exports with a UTF-8 byte-order mark (spreadsheet compatibility).
    pub csv_bom: bool,

    /// Symbol printed in front of amounts in text reports.
    pub currency_symbol: String,

    pub labels: ExportLabels,
}

impl Settings {
    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_timeout_secs: 10,
            api_base_url: "http://localhost:3000".to_string(),
            recent_transactions: 5,
            csv_bom: true,
            currency_symbol: "R$".to_string(),
            labels: ExportLabels::default(),
        }
    }
}
