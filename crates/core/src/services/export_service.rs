use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::CoreError;
use crate::models::archive::MonthlyArchive;
use crate::models::month::MonthKey;
use crate::models::settings::Settings;
use crate::models::transaction::Transaction;
use crate::services::aggregation_service::AggregationService;

const UTF8_BOM: &str = "\u{FEFF}";
const RULE_WIDTH: usize = 60;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveExport<'a> {
    #[serde(flatten)]
    archive: &'a MonthlyArchive,
    exported_at: DateTime<Utc>,
    format: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthExport<'a> {
    month: MonthKey,
    summary: MonthExportSummary,
    transactions: &'a [Transaction],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthExportSummary {
    total_income: f64,
    total_expenses: f64,
    balance: f64,
    transaction_count: usize,
}

/// Renders archives and transaction sets as JSON, CSV or a text report.
///
/// The core computes all the numbers; callers only save or display the
/// returned text.
pub struct ExportService {
    aggregation: AggregationService,
}

impl ExportService {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationService::new(),
        }
    }

    /// Pretty-printed archive plus `exportedAt` and `format: "JSON"`.
    pub fn archive_json(
        &self,
        archive: &MonthlyArchive,
        exported_at: DateTime<Utc>,
    ) -> Result<String, CoreError> {
        let export = ArchiveExport {
            archive,
            exported_at,
            format: "JSON",
        };
        serde_json::to_string_pretty(&export)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize archive {}: {e}", archive.month)))
    }

    /// Header row plus one fully quoted row per archived transaction.
    pub fn archive_csv(&self, archive: &MonthlyArchive, settings: &Settings) -> Result<String, CoreError> {
        self.transactions_csv(&archive.transactions, settings)
    }

    /// CSV for any transaction list, in the given order.
    ///
    /// Columns: Date (dd/mm/yyyy), Description, Category, Type (human
    /// label), Amount (raw stored number).
    pub fn transactions_csv(
        &self,
        transactions: &[Transaction],
        settings: &Settings,
    ) -> Result<String, CoreError> {
        let labels = &settings.labels;
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(labels.header())?;
        for t in transactions {
            writer.write_record([
                t.date.format("%d/%m/%Y").to_string(),
                t.description.clone(),
                t.category.clone(),
                labels.kind_label(t.kind).to_string(),
                t.amount.to_string(),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV: {e}")))?;
        let body = String::from_utf8(bytes)
            .map_err(|e| CoreError::Serialization(format!("CSV is not valid UTF-8: {e}")))?;

        Ok(if settings.csv_bom {
            format!("{UTF8_BOM}{body}")
        } else {
            body
        })
    }

    /// JSON export of a month's active transactions with their totals.
    pub fn month_json(&self, month: MonthKey, transactions: &[Transaction]) -> Result<String, CoreError> {
        let summary = self.aggregation.summarize_archive(transactions);
        let export = MonthExport {
            month,
            summary: MonthExportSummary {
                total_income: summary.total_income,
                total_expenses: summary.total_expenses,
                balance: summary.balance,
                transaction_count: transactions.len(),
            },
            transactions,
        };
        serde_json::to_string_pretty(&export)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize month {month}: {e}")))
    }

    /// Plain-text report: title, totals block, then
    /// `date | TYPE | category | description | amount` per transaction.
    pub fn text_report(&self, month: MonthKey, transactions: &[Transaction], settings: &Settings) -> String {
        let labels = &settings.labels;
        let symbol = &settings.currency_symbol;
        let summary = self.aggregation.summarize_archive(transactions);

        let mut out = format!("{} - {}\n", labels.report_title, month.display_name());
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");

        out.push_str(&format!(
            "{}: {}\n",
            labels.total_income,
            format_currency(summary.total_income, symbol)
        ));
        out.push_str(&format!(
            "{}: {}\n",
            labels.total_expenses,
            format_currency(summary.total_expenses, symbol)
        ));
        out.push_str(&format!(
            "{}: {}\n",
            labels.balance,
            format_currency(summary.balance, symbol)
        ));
        out.push_str(&format!("{}: {}\n\n", labels.transaction_count, transactions.len()));

        out.push_str(&format!("{}:\n", labels.details));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        for t in transactions {
            out.push_str(&format!(
                "{} | {} | {} | {} | {}\n",
                t.date.format("%d/%m/%Y"),
                labels.kind_label(t.kind).to_uppercase(),
                t.category,
                t.description,
                format_currency(t.amount, symbol)
            ));
        }
        out
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Brazilian-style money text: `R$ 1.234,56`, `-R$ 300,00`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{symbol} {grouped},{frac_part}")
}
