use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::currency::CurrencyCode;
use crate::error::{Result, StatementError};
use crate::pipeline::DEFAULT_RENDER_SCALE;

pub const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";
pub const DEFAULT_DATA_DIR: &str = ".statement-analyzer";

/// Which transactions the insight summary looks at after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsightScope {
    /// Only the batch that was just imported.
    NewBatchOnly,
    /// The whole ledger, including earlier imports and manual entries.
    #[default]
    FullLedger,
}

impl std::str::FromStr for InsightScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new_batch_only" | "batch" => Ok(InsightScope::NewBatchOnly),
            "full_ledger" | "full" => Ok(InsightScope::FullLedger),
            other => Err(format!("Unknown insight scope: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Not serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: String,
    pub data_dir: PathBuf,
    pub render_scale: f32,
    pub insight_scope: InsightScope,
    pub display_currency: CurrencyCode,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL_NAME.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            render_scale: DEFAULT_RENDER_SCALE,
            insight_scope: InsightScope::default(),
            display_currency: CurrencyCode::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Reads `GEMINI_API_KEY` (falling back to `API_KEY`), `GEMINI_MODEL`,
    /// `STATEMENT_DATA_DIR`, `STATEMENT_INSIGHT_SCOPE` and `STATEMENT_CURRENCY`.
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY")),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            data_dir: non_empty("STATEMENT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            render_scale: defaults.render_scale,
            insight_scope: non_empty("STATEMENT_INSIGHT_SCOPE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.insight_scope),
            display_currency: non_empty("STATEMENT_CURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.display_currency),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            StatementError::Configuration("GEMINI_API_KEY environment variable not set".to_string())
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
