use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, StatementError};
use crate::utils::parse_date;

pub const DEFAULT_CATEGORY: &str = "Other";

/// A single ledger entry. Negative amounts are outflows, positive amounts inflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,

    /// `YYYY-MM-DD`. Kept as text because the model occasionally returns dates
    /// that do not parse, and those rows are preserved rather than dropped.
    #[serde(alias = "Date")]
    pub date: String,

    #[serde(alias = "Description")]
    pub description: String,

    #[serde(alias = "Amount")]
    pub amount: f64,

    #[serde(alias = "Category", default)]
    pub category: String,

    #[serde(alias = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(alias = "IsSubscription", default)]
    pub is_subscription: bool,
}

impl Transaction {
    pub fn from_draft(id: String, draft: TransactionDraft) -> Self {
        Self {
            id,
            date: draft.date,
            description: draft.description,
            amount: draft.amount,
            category: draft.category,
            notes: draft.notes,
            is_subscription: draft.is_subscription,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Category label used for aggregation; blank categories fall into "Other".
    pub fn category_or_default(&self) -> &str {
        let trimmed = self.category.trim();
        if trimmed.is_empty() {
            DEFAULT_CATEGORY
        } else {
            trimmed
        }
    }
}

/// A transaction without an id: what the model extracts and what manual entry produces.
/// This struct is serialized to JSON Schema and passed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[schemars(description = "Transaction date in YYYY-MM-DD format.")]
    pub date: String,

    #[schemars(description = "A concise description of the transaction.")]
    pub description: String,

    #[schemars(description = "Transaction amount. Negative for expenses, positive for deposits.")]
    pub amount: f64,

    #[schemars(description = "Auto-detected category (e.g., Groceries, Dining, Salary).")]
    pub category: String,

    #[schemars(description = "Any relevant details about the transaction.")]
    pub notes: Option<String>,

    #[schemars(
        description = "True when the transaction is a recurring subscription or membership charge."
    )]
    pub is_subscription: bool,
}

/// One base64-encoded image ready to be attached to a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn jpeg(data: impl Into<String>) -> Self {
        Self::new("image/jpeg", data)
    }

    /// `data:<mime>;base64,<data>`, the form a stored face reference takes.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Inverse of [`ImagePayload::to_data_url`]. Bare base64 without a
    /// `data:` prefix is taken to be JPEG.
    pub fn from_data_url(raw: &str) -> Self {
        let raw = raw.trim();
        raw.strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(mime_type, data)| Self::new(mime_type, data))
            .unwrap_or_else(|| Self::jpeg(raw))
    }
}

/// An uploaded statement file held in memory for the duration of a batch.
#[derive(Debug, Clone)]
pub struct StatementFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl StatementFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StatementError::InvalidEntry(format!("Invalid file name: {:?}", path)))?
            .to_string();

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}
