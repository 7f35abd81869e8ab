use log::{debug, error, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

use crate::config::DEFAULT_MODEL_NAME;
use crate::error::{Result, StatementError};
use crate::llm::prompts::EXTRACTION_PROMPT;
use crate::llm::types::*;
use crate::llm::utils::{clean_json_output, gemini_schema};
use crate::pipeline::{DocumentPipeline, PageRenderer};
use crate::schema::{StatementFile, Transaction, TransactionDraft};
use crate::utils::{fresh_id, sort_by_date, SortOrder};

/// The declared response shape for statement extraction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResponse {
    #[schemars(description = "Every transaction found across all provided images.")]
    pub transactions: Vec<TransactionDraft>,
}

/// Drives one import batch: convert every file, send a single extraction
/// request, decode and order the result. Does not touch the ledger.
pub struct StatementAnalyzer<M: GenerativeModel, R: PageRenderer> {
    model: M,
    pipeline: DocumentPipeline<R>,
    model_name: String,
}

impl<M: GenerativeModel, R: PageRenderer> StatementAnalyzer<M, R> {
    pub fn new(model: M, pipeline: DocumentPipeline<R>) -> Self {
        Self {
            model,
            pipeline,
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Files are converted one at a time in the given order. Unsupported files
    /// are skipped; any other failure aborts the whole batch.
    ///
    /// The returned transactions carry fresh ids and are sorted oldest first;
    /// entries with an unparsable date keep their position.
    ///
    /// Progress updates never wait on the receiver. When the channel is full
    /// the update is dropped, so a consumer that only drains after the batch
    /// sees at most the channel capacity worth of events.
    pub async fn analyze(
        &self,
        files: &[StatementFile],
        progress: Option<Sender<Progress>>,
    ) -> Result<Vec<Transaction>> {
        if !self.model.is_configured() {
            return Err(StatementError::Configuration(
                "GEMINI_API_KEY environment variable not set".to_string(),
            ));
        }

        let total = files.len();
        info!("Analyzing batch of {} file(s)", total);

        let mut payloads = Vec::new();
        for (processed, file) in files.iter().enumerate() {
            send_event(&progress, Progress::preparing(processed, total, &file.name));

            match self.pipeline.prepare(file).await {
                Ok(mut file_payloads) => payloads.append(&mut file_payloads),
                Err(StatementError::UnsupportedFile { name, mime_type }) => {
                    warn!(
                        "Unsupported file type: {}. Skipping file: {}",
                        mime_type, name
                    );
                }
                Err(e) => {
                    error!("Failed to prepare {}: {}", file.name, e);
                    return Err(e);
                }
            }
        }

        if payloads.is_empty() {
            return Err(StatementError::NoValidInput);
        }

        send_event(&progress, Progress::analyzing(total));
        debug!("Sending {} image payload(s) to {}", payloads.len(), self.model_name);

        let request = GenerationRequest::new(
            self.model_name.clone(),
            vec![Content::user_with_images(EXTRACTION_PROMPT, &payloads)],
        )
        .with_json_schema(gemini_schema::<ExtractionResponse>()?);

        let raw = self.model.generate(request).await.map_err(|e| {
            error!("Statement analysis request failed: {}", e);
            e
        })?;

        send_event(&progress, Progress::finalizing(total));

        let drafts = parse_extraction_response(&raw).map_err(|e| {
            error!("Failed to parse Gemini response: {}", raw);
            e
        })?;

        let transactions = assign_ids(drafts);
        info!("Extracted {} transactions", transactions.len());
        Ok(transactions)
    }
}

fn send_event(sender: &Option<Sender<Progress>>, event: Progress) {
    let Some(tx) = sender else {
        return;
    };
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            debug!("Progress channel full, dropping update: {}", event.message);
        }
        Err(TrySendError::Closed(_)) => {}
    }
}

/// Strict decode of the model output: the whole `transactions` array or nothing.
pub fn parse_extraction_response(raw: &str) -> Result<Vec<TransactionDraft>> {
    let response: ExtractionResponse = serde_json::from_str(clean_json_output(raw))
        .map_err(|e| StatementError::MalformedResponse(e.to_string()))?;
    Ok(response.transactions)
}

fn assign_ids(drafts: Vec<TransactionDraft>) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let id = fresh_id(|candidate| transactions.iter().any(|t| t.id == candidate));
        transactions.push(Transaction::from_draft(id, draft));
    }
    sort_by_date(
        &mut transactions,
        Transaction::parsed_date,
        SortOrder::Ascending,
    );
    transactions
}
