use dotenv::dotenv;
use statement_analyzer::{AnalyzerConfig, AppSession, GeminiClient};
use std::error::Error;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    println!("💬 Starting Ledger Chat...\n");

    let config = AnalyzerConfig::from_env();
    let session = AppSession::open(config)?;
    if session.ledger().is_empty() {
        println!("⚠️  The ledger is empty. Run the analyze_statements demo first.");
        return Ok(());
    }
    println!(
        "✅ Loaded {} transactions.\n",
        session.transactions().len()
    );

    let mut chat = session.start_chat(GeminiClient::from_env()?)?;
    if let Some(greeting) = chat.transcript().first() {
        println!("🤖 {}", greeting.text);
    }
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let prompt = input.trim();

        if prompt.eq_ignore_ascii_case("quit") || prompt.eq_ignore_ascii_case("exit") {
            break;
        }

        if prompt.is_empty() {
            continue;
        }

        println!("\nThinking...");

        if let Some(reply) = chat.send(prompt).await {
            println!("\n{}\n", reply.text);
            println!("------------------------------------------------------------------");
        }
    }

    Ok(())
}
