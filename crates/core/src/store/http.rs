use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::archive::{AvailableMonth, MonthlyArchive};
use crate::models::month::MonthKey;
use crate::models::summary::MonthlySummary;
use crate::models::transaction::{NewTransaction, Transaction, TransactionFilter, TransactionPatch};

use super::traits::{ArchiveStore, TransactionStore};

/// Remote store speaking JSON over HTTP.
///
/// Endpoints, relative to the base URL:
/// - `GET/POST /transactions`, `PATCH/DELETE /transactions/{id}`
/// - `GET /transactions/months`
/// - `GET/POST /archives`, `GET/DELETE /archives/{month}`
/// - `POST /archives/{month}/restore` (server moves the data in one step)
/// - `GET /monthly-summaries/{month}`
///
/// Status mapping: 404 → `NotFound`, 400/422 → `ValidationError`, other
/// non-2xx → `StoreError`; client timeouts → `Timeout`.
pub struct HttpStore {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::StoreError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL below the base. Each segment is percent-encoded, so an
    /// opaque id can never escape into another path, query or fragment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CoreError::StoreError(format!("Invalid base URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| CoreError::StoreError(format!("Base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, CoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        check_status(operation, response).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, CoreError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    self.transport_error(operation, e)
                } else {
                    CoreError::Deserialization(format!("Failed to parse {operation} response: {e}"))
                }
            })
    }

    fn transport_error(&self, operation: &str, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            tracing::warn!("HTTP {operation} timed out after {:?}", self.timeout);
            return CoreError::Timeout {
                operation: operation.to_string(),
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }
        CoreError::from(e)
    }
}

/// Query string pairs for a transaction filter.
pub fn filter_query(filter: &TransactionFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(year) = filter.year {
        query.push(("year", year.to_string()));
    }
    if let Some(month) = filter.month {
        query.push(("month", month.to_string()));
    }
    if let Some(kind) = filter.kind {
        query.push(("type", kind.as_str().to_string()));
    }
    if let Some(category) = &filter.category {
        query.push(("category", category.clone()));
    }
    if let Some(page) = filter.page {
        query.push(("page", page.to_string()));
    }
    if let Some(limit) = filter.limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

/// Map a non-success status to the matching error kind.
pub fn status_error(operation: &str, status: StatusCode, body: &str) -> CoreError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    match status {
        StatusCode::NOT_FOUND => CoreError::NotFound(format!("{operation}: {detail}")),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            CoreError::ValidationError(format!("{operation}: {detail}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CoreError::Timeout {
            operation: operation.to_string(),
            after_ms: 0,
        },
        _ => CoreError::StoreError(format!("{operation}: {detail}")),
    }
}

async fn check_status(operation: &str, response: Response) -> Result<Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(operation, status, &body))
}

#[async_trait]
impl TransactionStore for HttpStore {
    fn name(&self) -> &str {
        "HttpStore"
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, CoreError> {
        let request = self
            .client
            .get(self.endpoint(&["transactions"])?)
            .query(&filter_query(filter));
        let mut transactions: Vec<Transaction> = self.fetch("list", request).await?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, CoreError> {
        let request = self
            .client
            .post(self.endpoint(&["transactions"])?)
            .json(&transaction);
        self.fetch("create", request).await
    }

    async fn update(&self, id: &str, patch: TransactionPatch) -> Result<Transaction, CoreError> {
        let request = self
            .client
            .patch(self.endpoint(&["transactions", id])?)
            .json(&patch);
        self.fetch("update", request).await
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let request = self.client.delete(self.endpoint(&["transactions", id])?);
        self.send("delete", request).await?;
        Ok(())
    }

    async fn list_available_months(&self) -> Result<Vec<AvailableMonth>, CoreError> {
        let request = self.client.get(self.endpoint(&["transactions", "months"])?);
        let mut months: Vec<AvailableMonth> = self.fetch("list_available_months", request).await?;
        months.sort_by(|a, b| b.month_year.cmp(&a.month_year));
        Ok(months)
    }
}

#[async_trait]
impl ArchiveStore for HttpStore {
    async fn list_archives(&self) -> Result<Vec<MonthlyArchive>, CoreError> {
        let request = self.client.get(self.endpoint(&["archives"])?);
        self.fetch("list_archives", request).await
    }

    async fn get_archive(&self, month: MonthKey) -> Result<Option<MonthlyArchive>, CoreError> {
        let request = self.client.get(self.endpoint(&["archives", &month.to_string()])?);
        match self.fetch("get_archive", request).await {
            Ok(archive) => Ok(Some(archive)),
            Err(CoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn commit_archive(&self, archive: &MonthlyArchive) -> Result<(), CoreError> {
        let request = self.client.post(self.endpoint(&["archives"])?).json(archive);
        self.send("commit_archive", request).await?;
        Ok(())
    }

    async fn commit_restore(&self, month: MonthKey) -> Result<MonthlyArchive, CoreError> {
        let request = self
            .client
            .post(self.endpoint(&["archives", &month.to_string(), "restore"])?);
        self.fetch("commit_restore", request).await
    }

    async fn delete_archive(&self, month: MonthKey) -> Result<(), CoreError> {
        let request = self.client.delete(self.endpoint(&["archives", &month.to_string()])?);
        match self.send("delete_archive", request).await {
            Ok(_) | Err(CoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn remote_summary(&self, month: MonthKey) -> Result<Option<MonthlySummary>, CoreError> {
        let request = self
            .client
            .get(self.endpoint(&["monthly-summaries", &month.to_string()])?);
        match self.fetch("remote_summary", request).await {
            Ok(summary) => Ok(Some(summary)),
            Err(CoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
