// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Build the logger (stderr, "info" unless RUST_LOG says otherwise)
// 2. Parse the command line and read the config from the environment
// 3. Crawl from the start URL, printing the link tree to stdout
// 4. Exit with proper code (0 = crawl ran, 1 = bad arguments or output error)
//
// Pages that fail to download do NOT change the exit code. They are logged
// and the crawl carries on without them.
// =============================================================================

mod cli;
mod config;
mod crawl;
mod extract;
mod fetch;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::CrawlConfig;
use crawl::Crawler;
use fetch::HttpFetcher;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;

// A single-threaded runtime is all we need: every request is awaited
// before the next one starts
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let logger = build_logger();

    // The logger is handed around explicitly; nothing is installed globally
    let exit_code = match run(logger.clone()).with_subscriber(logger).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

// Builds the stderr logger
//
// Returns: a Dispatch filtered by RUST_LOG, or at "info" when it is unset
// or invalid
fn build_logger() -> Dispatch {
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    Dispatch::new(subscriber)
}

async fn run(logger: Dispatch) -> Result<()> {
    let cli = Cli::parse();
    tracing::debug!(?cli, "Parsed arguments");

    // Checked before anything touches the network
    let start_url = cli.start_url()?;
    let config = CrawlConfig::from_env()?;

    let fetcher = HttpFetcher::new()?;
    let crawler = Crawler::new(fetcher, config).with_dispatch(logger);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    crawler.run(start_url, &mut out).await?;

    Ok(())
}
