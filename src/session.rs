use log::{error, info};
use tokio::sync::mpsc::Sender;

use crate::analytics::{category_breakdown, CategorySlice, TransactionSummary};
use crate::auth::IdentityGate;
use crate::config::AnalyzerConfig;
use crate::currency::{format_amount, CurrencyCode};
use crate::error::Result;
use crate::ingestion::ManualEntry;
use crate::ledger::LedgerStore;
use crate::llm::assistant::{ChatSession, InsightGenerator};
use crate::llm::extractor::StatementAnalyzer;
use crate::llm::types::{GenerativeModel, Progress};
use crate::pipeline::PageRenderer;
use crate::schema::{StatementFile, Transaction};
use crate::storage::{FileStore, KeyValueStore};

/// Application state owned by one user session: the ledger, its backing
/// store, the access gate and the last insight text.
pub struct AppSession<S: KeyValueStore> {
    config: AnalyzerConfig,
    store: S,
    ledger: LedgerStore,
    gate: IdentityGate,
    insights: Option<String>,
    currency: CurrencyCode,
}

impl AppSession<FileStore> {
    /// Opens the file-backed store under `config.data_dir`.
    pub fn open(config: AnalyzerConfig) -> Result<Self> {
        let store = FileStore::open(&config.data_dir)?;
        Ok(Self::init(config, store))
    }
}

impl<S: KeyValueStore> AppSession<S> {
    pub fn init(config: AnalyzerConfig, store: S) -> Self {
        let ledger = LedgerStore::load(&store);
        let currency = config.display_currency;
        Self {
            config,
            store,
            ledger,
            gate: IdentityGate::new(),
            insights: None,
            currency,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gate(&self) -> &IdentityGate {
        &self.gate
    }

    /// Gate plus store, borrowed together for face registration and verification.
    pub fn gate_and_store(&mut self) -> (&mut IdentityGate, &mut S) {
        (&mut self.gate, &mut self.store)
    }

    pub fn insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn set_currency(&mut self, currency: CurrencyCode) {
        self.currency = currency;
    }

    /// Formats a USD amount in the selected display currency.
    pub fn display_amount(&self, amount: f64) -> String {
        format_amount(amount, self.currency)
    }

    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary::from_transactions(self.ledger.transactions())
    }

    pub fn categories(&self) -> Vec<CategorySlice> {
        category_breakdown(self.ledger.transactions())
    }

    /// Runs one analysis batch and merges the result into the ledger.
    /// On failure, including a failed snapshot write, the ledger is left
    /// exactly as it was.
    pub async fn import<M, R>(
        &mut self,
        analyzer: &StatementAnalyzer<M, R>,
        files: &[StatementFile],
        progress: Option<Sender<Progress>>,
    ) -> Result<Vec<Transaction>>
    where
        M: GenerativeModel,
        R: PageRenderer,
    {
        let batch = analyzer.analyze(files, progress).await?;
        let mut next = self.ledger.clone();
        next.merge(batch.clone());
        self.commit(next)?;
        info!(
            "Imported {} transactions from {} file(s)",
            batch.len(),
            files.len()
        );
        Ok(batch)
    }

    /// Regenerates the insight text for the given batch. The generator's scope
    /// decides whether the batch or the whole ledger is summarised.
    pub async fn refresh_insights<M: GenerativeModel>(
        &mut self,
        generator: &InsightGenerator<M>,
        batch: &[Transaction],
    ) -> &str {
        let text = generator.generate(batch, self.ledger.transactions()).await;
        self.insights.insert(text).as_str()
    }

    pub fn add_manual(&mut self, entry: ManualEntry) -> Result<String> {
        let draft = entry.into_draft()?;
        let mut next = self.ledger.clone();
        let id = next.add(draft);
        self.commit(next)?;
        Ok(id)
    }

    /// Deleting the last remaining entry is treated as an explicit clear and
    /// also drops the stored snapshot.
    pub fn remove(&mut self, id: &str) -> Result<Option<Transaction>> {
        let mut next = self.ledger.clone();
        let Some(removed) = next.remove(id) else {
            return Ok(None);
        };
        if next.is_empty() {
            next.clear(&mut self.store)?;
            self.ledger = next;
        } else {
            self.commit(next)?;
        }
        Ok(Some(removed))
    }

    /// Deletes every transaction and the stored snapshot. The face reference
    /// is kept.
    pub fn reset(&mut self) -> Result<()> {
        self.ledger.clear(&mut self.store)?;
        self.insights = None;
        Ok(())
    }

    /// Starts a chat over the ledger as it is right now.
    pub fn start_chat<M: GenerativeModel>(&self, model: M) -> Result<ChatSession<M>> {
        Ok(ChatSession::new(model, self.ledger.transactions())?
            .with_model_name(self.config.model.clone()))
    }

    pub fn logout(&mut self) {
        self.gate.lock();
        self.insights = None;
    }

    /// Saves `next` and adopts it only once the write succeeded. An empty
    /// ledger is never written, so the stored snapshot is left alone.
    fn commit(&mut self, next: LedgerStore) -> Result<()> {
        if let Err(e) = next.save(&mut self.store) {
            error!("Failed to save ledger, keeping previous state: {}", e);
            return Err(e);
        }
        self.ledger = next;
        Ok(())
    }
}
