use reviewprobe::client::{ModelClient, OpenAiClient};
use reviewprobe::corpus::load_papers;
use reviewprobe::limiter::RateLimiter;
use reviewprobe::report::{print_summary, write_csv, write_json};
use reviewprobe::runner::Runner;
use reviewprobe::ProviderConfig;

use clap::{Parser, Subcommand};
use colored::*;
use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ReviewProbe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        /// The model name (e.g., gpt-4o-mini)
        #[arg(short, long, default_value = "gpt-4o-mini")]
        model: String,

        /// Directory containing the paper corpus (*.txt files)
        #[arg(short, long, default_value = "research_papers")]
        papers: PathBuf,

        /// Run only on sample_paper.txt instead of the full corpus
        #[arg(long, default_value = "false")]
        sample_only: bool,

        /// Minimum seconds between call starts per model
        #[arg(long, default_value = "6")]
        rate_limit_delay: u64,

        /// Custom API base URL (e.g., a local OpenAI-compatible endpoint)
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long, default_value = "8")]
        concurrency: usize,

        #[arg(short, long, default_value = "report.json")]
        output: String,

        /// Also export the result table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

// Every configured provider currently maps to the OpenAI-compatible client;
// additional providers slot in here, selected by provider id.
fn build_client(
    provider: &ProviderConfig,
    api_key: &str,
    base_url: Option<&str>,
) -> Arc<dyn ModelClient> {
    match base_url {
        Some(url) => Arc::new(OpenAiClient::new_with_base_url(
            api_key.to_string(),
            provider.model.clone(),
            url.to_string(),
        )),
        None => Arc::new(OpenAiClient::new(
            api_key.to_string(),
            provider.model.clone(),
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            model,
            papers,
            sample_only,
            rate_limit_delay,
            base_url,
            concurrency,
            output,
            csv,
        } => {
            println!("{}", "Initializing ReviewProbe...".bold().cyan());

            let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

            // 1. Provider configs: one per model under test
            let providers = vec![ProviderConfig::new(
                "openai",
                model.clone(),
                Duration::from_secs(*rate_limit_delay),
                Color::Blue,
            )];

            // 2. One client per provider
            let clients: Vec<Arc<dyn ModelClient>> = providers
                .iter()
                .map(|p| build_client(p, &api_key, base_url.as_deref()))
                .collect();

            // 3. One rate-limit gate per distinct model
            let limiter = Arc::new(RateLimiter::new(&providers));
            for p in &providers {
                println!(
                    "Initialized rate-limit gate for model: {}",
                    p.colored_model()
                );
            }

            // 4. Load the corpus
            let papers = load_papers(papers, *sample_only);
            println!("Loaded {} papers for testing.", papers.len());

            // 5. Run the full condition matrix
            let runner = Runner::new(*concurrency);
            let results = runner.run(&papers, &providers, &clients, limiter).await?;

            if results.is_empty() {
                eprintln!("{}", "No results were generated. Skipping export.".yellow());
                return Ok(());
            }

            // 6. Report
            write_json(&results, Path::new(output))?;
            println!("Results for {} tests saved to {}", results.len(), output);
            if let Some(csv_path) = csv {
                write_csv(&results, csv_path)?;
                println!("CSV table saved to {}", csv_path.display());
            }
            print_summary(&results);
        }
    }

    Ok(())
}
