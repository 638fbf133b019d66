use clap::Parser;
use finance_agent_router::{agent::Orchestrator, config::AppConfig, models::Message};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "finance-assistant")]
#[command(about = "Ask financial questions; agents gather data and summarize it", long_about = None)]
struct Args {
    /// Question to answer once; starts an interactive session when omitted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    query: Vec<String>,
}

/// Run one query, printing each message as the loop appends it
async fn ask(orchestrator: &Orchestrator, thread_id: &str, query: &str) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            println!("{}\n", message);
        }
    });

    let result = orchestrator.run_streaming(thread_id, query, Some(&tx)).await;
    drop(tx);
    if let Err(e) = printer.await {
        warn!(error = %e, "Printer task failed");
    }

    if let Err(e) = result {
        eprintln!("An error occurred: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so answers stay readable on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;
    let orchestrator = Orchestrator::from_config(&config)?;
    let thread_id = uuid::Uuid::new_v4().to_string();

    info!(thread_id = %thread_id, "Finance assistant starting");

    if !args.query.is_empty() {
        let query = args.query.join(" ");
        ask(&orchestrator, &thread_id, &query).await;
        return Ok(());
    }

    println!("Welcome to the Financial Assistant powered by Multi-Agent Routing!");
    println!("Ask about stock prices, company profiles, financial ratios and more.");
    println!("Type 'exit' to end the session.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Your question: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            println!("Thank you for using the Financial Assistant. Goodbye!");
            break;
        }
        if query.is_empty() {
            continue;
        }

        ask(&orchestrator, &thread_id, query).await;
        println!("\n{}\n", "-".repeat(50));
    }

    Ok(())
}
