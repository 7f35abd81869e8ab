use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::schema::TransactionDraft;

pub const MANUAL_ENTRY_NOTE: &str = "Manual Entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Cash out: stored as a negative amount.
    #[default]
    Expense,
    /// Cash in: stored as a positive amount.
    Income,
}

/// A record typed in by the user rather than extracted from a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEntry {
    pub kind: EntryKind,
    /// Magnitude as typed; the sign comes from `kind`.
    pub amount: String,
    pub description: String,
    pub category: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub is_subscription: bool,
}

impl ManualEntry {
    pub fn into_draft(self) -> Result<TransactionDraft> {
        let description = self.description.trim();
        let category = self.category.trim();
        if description.is_empty() {
            return Err(StatementError::InvalidEntry(
                "Description is required".to_string(),
            ));
        }
        if category.is_empty() {
            return Err(StatementError::InvalidEntry(
                "Category is required".to_string(),
            ));
        }

        let magnitude: f64 = self.amount.trim().parse().map_err(|_| {
            StatementError::InvalidEntry(format!("'{}' is not a valid amount", self.amount))
        })?;
        if !magnitude.is_finite() {
            return Err(StatementError::InvalidEntry(format!(
                "'{}' is not a valid amount",
                self.amount
            )));
        }

        let amount = match self.kind {
            EntryKind::Expense => -magnitude.abs(),
            EntryKind::Income => magnitude.abs(),
        };
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());

        Ok(TransactionDraft {
            date: date.format("%Y-%m-%d").to_string(),
            description: description.to_string(),
            amount,
            category: category.to_string(),
            notes: Some(MANUAL_ENTRY_NOTE.to_string()),
            // Only expenses can recur as subscriptions.
            is_subscription: self.kind == EntryKind::Expense && self.is_subscription,
        })
    }
}
