use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::month::MonthKey;
use crate::models::transaction::TransactionFilter;
use crate::store::traits::{PromptMarker, TransactionStore};

/// Decides, once per calendar month of use, whether to suggest archiving
/// the previous month.
pub struct PromptService;

impl PromptService {
    pub fn new() -> Self {
        Self
    }

    /// `true` at most once per calendar month of `today`.
    ///
    /// When the month differs from the persisted marker, the marker is moved
    /// to the current month first, then the answer is whether any active
    /// transaction is dated in the preceding month. The marker is updated
    /// even when the store lookup afterwards fails.
    pub async fn should_prompt<S: TransactionStore + ?Sized>(
        &self,
        marker: &mut dyn PromptMarker,
        store: &S,
        today: NaiveDate,
    ) -> Result<bool, CoreError> {
        let current = MonthKey::of(today);
        if marker.last_checked()? == Some(current) {
            return Ok(false);
        }
        marker.mark_checked(current)?;

        let previous = current.previous();
        let filter = TransactionFilter::for_month(previous).with_page(1, 1);
        let pending = store.list(&filter).await?;
        let prompt = pending.iter().any(|t| previous.contains(t.date));

        tracing::debug!("Archive prompt check for {current}: previous month {previous} pending = {prompt}");
        Ok(prompt)
    }
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}
