use dotenv::dotenv;
use statement_analyzer::{
    category_breakdown, AnalyzerConfig, AppSession, DocumentPipeline, GeminiClient,
    InsightGenerator, PdftoppmRenderer, Progress, ProgressStage, StatementAnalyzer, StatementFile,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    println!("🚀 Starting statement analysis...\n");

    let config = AnalyzerConfig::from_env();
    let client = GeminiClient::from_env()?;

    let doc_dir = Path::new("demos").join("statements");
    if !doc_dir.exists() {
        fs::create_dir_all(&doc_dir).await?;
        println!("⚠️  Created 'demos/statements'. Place statement PDFs or images there.");
        return Ok(());
    }

    let mut dir_stream = fs::read_dir(&doc_dir).await?;
    let mut paths: Vec<PathBuf> = Vec::new();
    while let Ok(Some(entry)) = dir_stream.next_entry().await {
        paths.push(entry.path());
    }
    paths.sort();

    if paths.is_empty() {
        println!("⚠️  No files found in {:?}.", doc_dir);
        return Ok(());
    }

    if !PdftoppmRenderer::is_available() {
        println!("⚠️  pdftoppm not found; PDF files will fail to render.");
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(StatementFile::from_path(path).await?);
    }

    let mut session = AppSession::open(config.clone())?;
    println!(
        "📒 Ledger at {:?} holds {} transactions.\n",
        config.data_dir,
        session.transactions().len()
    );

    let analyzer = StatementAnalyzer::new(
        client.clone(),
        DocumentPipeline::with_pdftoppm().with_scale(config.render_scale),
    )
    .with_model_name(config.model.clone());

    let (tx, mut rx) = mpsc::channel::<Progress>(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event.stage {
                ProgressStage::Preparing => {
                    println!("📄 [{}/{}] {}", event.processed_count, event.total, event.message)
                }
                ProgressStage::Analyzing => println!("🤖 {}", event.message),
                ProgressStage::Finalizing => println!("⚙️  {}", event.message),
            }
        }
    });

    let batch = session.import(&analyzer, &files, Some(tx)).await;
    printer.await?;
    let batch = batch?;

    println!("\n✅ Imported {} transactions:", batch.len());
    for t in &batch {
        println!(
            "   {} | {:<32} | {:>14} | {}",
            t.date,
            t.description,
            session.display_amount(t.amount),
            t.category
        );
    }

    let summary = session.summary();
    println!("\n💰 Income:   {}", session.display_amount(summary.total_income));
    println!("💸 Spending: {}", session.display_amount(summary.total_spending));
    println!("📈 Net:      {}", session.display_amount(summary.net()));

    println!("\n📊 Spending by category:");
    for slice in category_breakdown(session.transactions()) {
        println!(
            "   {:<20} {:>14} ({:.1}%)",
            slice.name,
            session.display_amount(slice.value),
            slice.percentage
        );
    }

    let insights = InsightGenerator::new(client, config.insight_scope)
        .with_model_name(config.model.clone());
    println!("\n💡 {}", session.refresh_insights(&insights, &batch).await);

    Ok(())
}
