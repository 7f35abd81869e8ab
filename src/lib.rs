//! # Statement Analyzer
//!
//! Turns bank statement PDFs and photos into a categorised, persisted
//! transaction ledger using a Gemini model, and answers questions about it.
//!
//! ## Core Concepts
//!
//! - **Document Pipeline**: Every upload becomes a list of images; PDFs are rendered page by page
//! - **Analysis Batch**: All images of an import go to the model in a single structured request
//! - **Ledger**: The merged transaction list, newest first, snapshotted to local storage
//! - **Display Currency**: Amounts are stored in USD and converted only when formatted
//! - **Identity Gate**: A local PIN or face-match lock in front of the ledger
//!
//! ## Example
//!
//! ```rust,ignore
//! use statement_analyzer::*;
//!
//! let config = AnalyzerConfig::from_env();
//! let mut session = AppSession::open(config.clone())?;
//!
//! let analyzer = StatementAnalyzer::new(GeminiClient::from_env()?, DocumentPipeline::with_pdftoppm())
//!     .with_model_name(config.model.clone());
//! let files = vec![StatementFile::from_path("march.pdf".as_ref()).await?];
//!
//! let batch = session.import(&analyzer, &files, None).await?;
//! println!("Imported {} transactions", batch.len());
//! println!("Net: {}", session.display_amount(session.summary().net()));
//! ```

pub mod analytics;
pub mod auth;
pub mod config;
pub mod currency;
pub mod error;
pub mod ingestion;
pub mod ledger;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod session;
pub mod storage;
pub mod utils;

pub use analytics::{
    category_breakdown, spending_by_period, subscriptions, to_tsv, CategorySlice, Period,
    PeriodTotal, TransactionSummary,
};
pub use auth::{Camera, CameraSession, FaceVerifier, GateState, IdentityGate, PinOutcome};
pub use config::{AnalyzerConfig, InsightScope};
pub use currency::{format_amount, format_amount_for_code, CurrencyCode, CurrencyConfig};
pub use error::{Result, StatementError};
pub use ingestion::{EntryKind, ManualEntry};
pub use ledger::LedgerStore;
pub use llm::*;
pub use pipeline::{DocumentPipeline, PageRenderer, PdftoppmRenderer};
pub use schema::*;
pub use session::AppSession;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
