use statement_analyzer::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

struct RecordingModel {
    configured: bool,
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingModel {
    fn replying(reply: &str) -> Self {
        Self {
            configured: true,
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: &str) -> Self {
        Self {
            configured: true,
            reply: Err(error.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("{}")
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl GenerativeModel for RecordingModel {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.reply
            .clone()
            .map_err(StatementError::AnalysisService)
    }
}

#[derive(Default)]
struct CountingRenderer {
    pages: usize,
    calls: AtomicUsize,
}

impl PageRenderer for CountingRenderer {
    async fn render_pages(&self, _pdf: &[u8], _scale: f32) -> Result<Vec<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![vec![0xFF, 0xD8, 0xFF]; self.pages])
    }
}

fn image(name: &str) -> StatementFile {
    StatementFile::new(name, "image/png", vec![137, 80, 78, 71])
}

fn five_transactions() -> String {
    let rows: Vec<String> = (1..=5)
        .map(|day| {
            format!(
                r#"{{"date":"2024-03-0{day}","description":"Item {day}","amount":-{day}0.0,"category":"Shopping","isSubscription":false}}"#
            )
        })
        .collect();
    format!(r#"{{"transactions":[{}]}}"#, rows.join(","))
}

fn drain(rx: &mut mpsc::Receiver<Progress>) -> Vec<Progress> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_two_images_become_one_request_and_five_entries() {
    let analyzer = StatementAnalyzer::new(
        RecordingModel::replying(&five_transactions()),
        DocumentPipeline::new(CountingRenderer::default()),
    );
    let mut session = AppSession::init(AnalyzerConfig::default(), MemoryStore::new());
    let before = session.transactions().len();

    let (tx, mut rx) = mpsc::channel(16);
    let batch = session
        .import(&analyzer, &[image("a.png"), image("b.png")], Some(tx))
        .await
        .unwrap();

    assert_eq!(batch.len(), 5);
    assert_eq!(session.transactions().len(), before + 5);

    let ids: HashSet<&str> = session.transactions().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), 5);

    // Newest first once merged.
    assert_eq!(session.transactions()[0].date, "2024-03-05");
    assert_eq!(session.transactions()[4].date, "2024-03-01");

    assert_eq!(analyzer.model().request_count(), 1);
    let requests = analyzer.model().requests.lock().unwrap();
    assert_eq!(requests[0].contents[0].image_count(), 2);
    assert!(requests[0].response_schema.is_some());

    let events = drain(&mut rx);
    let stages: Vec<ProgressStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            ProgressStage::Preparing,
            ProgressStage::Preparing,
            ProgressStage::Analyzing,
            ProgressStage::Finalizing,
        ]
    );
    assert!(events.iter().all(|e| e.total == 2));
    assert_eq!(events[1].processed_count, 1);
    assert_eq!(events[1].message, "Preparing b.png...");
}

#[tokio::test]
async fn test_pdf_pages_and_images_share_one_request() {
    let renderer = CountingRenderer {
        pages: 3,
        ..Default::default()
    };
    let analyzer = StatementAnalyzer::new(
        RecordingModel::replying(r#"{"transactions":[]}"#),
        DocumentPipeline::new(renderer),
    );

    let files = vec![
        StatementFile::new("statement.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
        image("receipt.jpg"),
        StatementFile::new("notes.txt", "text/plain", b"hello".to_vec()),
    ];
    let transactions = analyzer.analyze(&files, None).await.unwrap();
    assert!(transactions.is_empty());

    let requests = analyzer.model().requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].contents[0].image_count(), 4);
}

#[tokio::test]
async fn test_text_only_batch_never_reaches_the_model() {
    let analyzer = StatementAnalyzer::new(
        RecordingModel::replying(&five_transactions()),
        DocumentPipeline::new(CountingRenderer::default()),
    );

    let files = vec![StatementFile::new("notes.txt", "text/plain", b"hi".to_vec())];
    let (tx, mut rx) = mpsc::channel(16);
    let result = analyzer.analyze(&files, Some(tx)).await;

    assert!(matches!(result, Err(StatementError::NoValidInput)));
    assert_eq!(analyzer.model().request_count(), 0);
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, ProgressStage::Preparing);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_work() {
    let analyzer = StatementAnalyzer::new(
        RecordingModel::unconfigured(),
        DocumentPipeline::new(CountingRenderer {
            pages: 1,
            ..Default::default()
        }),
    );
    let pdf = StatementFile::new("statement.pdf", "application/pdf", b"%PDF".to_vec());

    let (tx, mut rx) = mpsc::channel(16);
    let result = analyzer.analyze(&[pdf], Some(tx)).await;

    assert!(matches!(result, Err(StatementError::Configuration(_))));
    assert_eq!(analyzer.model().request_count(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_failed_analysis_keeps_existing_ledger() {
    let mut session = AppSession::init(AnalyzerConfig::default(), MemoryStore::new());
    session
        .add_manual(ManualEntry {
            kind: EntryKind::Income,
            amount: "100".to_string(),
            description: "Gift".to_string(),
            category: "Income".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            is_subscription: false,
        })
        .unwrap();
    let snapshot = session.transactions().to_vec();

    let malformed = StatementAnalyzer::new(
        RecordingModel::replying(r#"{"rows": []}"#),
        DocumentPipeline::new(CountingRenderer::default()),
    );
    assert!(matches!(
        session.import(&malformed, &[image("a.png")], None).await,
        Err(StatementError::MalformedResponse(_))
    ));

    let offline = StatementAnalyzer::new(
        RecordingModel::failing("HTTP 503"),
        DocumentPipeline::new(CountingRenderer::default()),
    );
    assert!(matches!(
        session.import(&offline, &[image("a.png")], None).await,
        Err(StatementError::AnalysisService(_))
    ));

    assert_eq!(session.transactions(), snapshot.as_slice());
}

#[tokio::test]
async fn test_ledger_survives_reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = AnalyzerConfig {
        data_dir: dir.path().join("ledger"),
        ..AnalyzerConfig::default()
    };

    let analyzer = StatementAnalyzer::new(
        RecordingModel::replying(&five_transactions()),
        DocumentPipeline::new(CountingRenderer::default()),
    );

    let ids: Vec<String> = {
        let mut session = AppSession::open(config.clone()).unwrap();
        session.import(&analyzer, &[image("a.png")], None).await.unwrap();
        session.transactions().iter().map(|t| t.id.clone()).collect()
    };

    let reopened = AppSession::open(config.clone()).unwrap();
    let reloaded: Vec<String> = reopened.transactions().iter().map(|t| t.id.clone()).collect();
    assert_eq!(reloaded, ids);

    // A second import of the same statement appends rather than replaces.
    let mut reopened = reopened;
    reopened.import(&analyzer, &[image("a.png")], None).await.unwrap();
    assert_eq!(reopened.transactions().len(), 10);

    reopened.reset().unwrap();
    assert!(AppSession::open(config).unwrap().ledger().is_empty());
}

#[test]
fn test_corrupt_snapshot_loads_as_empty() {
    let mut store = MemoryStore::new();
    store.set("transactions", "{not a list").unwrap();

    assert!(matches!(
        LedgerStore::try_load(&store),
        Err(StatementError::PersistenceCorruption(_))
    ));
    let session = AppSession::init(AnalyzerConfig::default(), store);
    assert!(session.ledger().is_empty());
}

#[test]
fn test_pin_entry_flow() {
    let mut gate = IdentityGate::new();
    for digit in [9, 9, 9] {
        assert_eq!(gate.press_digit(digit), PinOutcome::Pending);
    }
    assert_eq!(gate.press_digit(9), PinOutcome::Rejected);
    assert_eq!(gate.state(), GateState::Locked);

    assert!(gate.tick(Instant::now() + Duration::from_millis(600)));
    assert_eq!(gate.pin_len(), 0);

    for digit in [1, 2, 3] {
        gate.press_digit(digit);
    }
    assert_eq!(gate.press_digit(4), PinOutcome::Unlocked);
    assert_eq!(gate.state(), GateState::Unlocked);

    gate.lock();
    assert_eq!(gate.state(), GateState::Locked);
}

#[test]
fn test_dashboard_figures() {
    let draft = |description: &str, amount: f64, category: &str| TransactionDraft {
        date: "2024-05-01".to_string(),
        description: description.to_string(),
        amount,
        category: category.to_string(),
        notes: None,
        is_subscription: false,
    };

    let mut ledger = LedgerStore::new();
    ledger.add(draft("Groceries", -80.0, "Food"));
    ledger.add(draft("Bus", -20.0, "Transport"));
    ledger.add(draft("Salary", 500.0, "Income"));

    let summary = TransactionSummary::from_transactions(ledger.transactions());
    assert_eq!(summary.count, 3);
    assert!((summary.total_income - 500.0).abs() < 1e-9);
    assert!((summary.total_spending - 100.0).abs() < 1e-9);
    assert!((summary.net() - 400.0).abs() < 1e-9);

    let slices = category_breakdown(ledger.transactions());
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].name, "Food");
    assert!((slices[0].percentage - 80.0).abs() < 1e-9);
    assert!((slices[0].bar_ratio - 1.0).abs() < 1e-9);
    assert!((slices[1].bar_ratio - 0.25).abs() < 1e-9);

    assert_eq!(format_amount(summary.net(), CurrencyCode::Usd), "$400.00");
    assert_eq!(format_amount(-1234.5, CurrencyCode::Inr), "-₹1,03,080.75");
}
