use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

use stockwatch_rs::app;
use stockwatch_rs::config::Settings;
use stockwatch_rs::dashboard;
use stockwatch_rs::dashboard::render::{format_change, format_percent, format_price};
use stockwatch_rs::news::NewsOutcome;
use stockwatch_rs::quote::resolver::Resolution;
use stockwatch_rs::refresher;
use stockwatch_rs::telemetry;

#[derive(Parser)]
#[command(name = "stockwatch", about = "Quote and news dashboard for a fixed set of symbols")]
struct Cli {
    /// Extra TOML config file layered over config/default.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the browser dashboard
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Fetch quotes once and rewrite the snapshot file (run from a scheduler)
    Refresh {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Resolve one configured symbol and print it
    Quote { symbol: String },
    /// Print news entries for a keyword
    News { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env
    telemetry::init_tracing("info,stockwatch_rs=debug");

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Serve { bind } => {
            telemetry::init_metrics()?;
            let addr = bind.unwrap_or(settings.dashboard.bind);
            let state = Arc::new(app::build_state(&settings)?);
            dashboard::run_server(addr, state).await?;
        }
        Command::Refresh { output } => {
            if let Some(path) = output {
                settings.source.snapshot_path = path;
            }
            let adapter = app::refresh_adapter(&settings)?;
            let store = app::snapshot_store(&settings)?;
            let snapshot = refresher::refresh_snapshot(&adapter, &settings.symbol_set(), &store, Utc::now()).await?;
            println!(
                "Wrote {} items to {}",
                snapshot.items.len(),
                settings.source.snapshot_path.display()
            );
        }
        Command::Quote { symbol } => {
            let symbols = settings.symbol_set();
            let cfg = symbols
                .get(&symbol)
                .with_context(|| format!("{} is not a configured symbol (have: {})", symbol, symbols.symbols().join(", ")))?;
            let resolver = app::build_resolver(&settings)?;
            match resolver.resolve(cfg).await {
                Resolution::Available { quote, change } => {
                    println!("{} ({})", quote.display_name, quote.symbol);
                    println!("  Price:    {}", format_price(change.latest));
                    println!("  Change:   {}", format_change(change.change));
                    println!("  Change %: {}", format_percent(change.change_percent));
                }
                Resolution::Unavailable { symbol, display_name, reason } => {
                    println!("⚠️  {} ({}): {}", display_name, symbol, reason.message());
                }
            }
        }
        Command::News { query } => {
            let state = app::build_state(&settings)?;
            match state.news.search(&query).await {
                NewsOutcome::Entries(entries) => {
                    for e in entries {
                        println!("- {}\n  {}", e.title, e.link);
                    }
                }
                NewsOutcome::Empty | NewsOutcome::Unavailable => {
                    println!("No news right now; the feed may be empty or unreachable.");
                }
            }
        }
    }

    Ok(())
}
