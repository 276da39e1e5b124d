//! trade-insight command line
//!
//! Loads a snapshot (a JSON export, or the built-in demo network) and prints
//! recommendations for one user.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trade_insight::{
    InMemorySource, InsightError, InsightService, JsonFileSource, PipelineConfig,
    RecommendationReport, RecordSource, UserId,
};

#[derive(Parser, Debug)]
#[command(name = "insight", version, about = "Recommendations from your network's top traders")]
struct Args {
    /// Target user id
    #[arg(short, long, required_unless_present = "list_users")]
    user: Option<String>,

    /// JSON snapshot export; the demo network is used when omitted
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Give up on the request after this many milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// List the users in the snapshot and exit
    #[arg(long)]
    list_users: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = PipelineConfig::from_env().context("invalid pipeline configuration")?;

    let source: Box<dyn RecordSource> = match &args.snapshot {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(InMemorySource::demo()?),
    };
    let service = InsightService::from_source(config, source.as_ref())
        .await
        .with_context(|| format!("failed to load snapshot from {}", source.name()))?;

    if args.list_users {
        for user in service.users().await {
            println!("{:<16} {}", user.id.as_str(), user.handle);
        }
        return Ok(());
    }

    let Some(user) = args.user.map(UserId::from) else {
        anyhow::bail!("--user is required");
    };

    let outcome = tokio::time::timeout(
        Duration::from_millis(args.timeout_ms),
        service.recommend(&user),
    )
    .await
    .with_context(|| format!("recommendation request timed out after {}ms", args.timeout_ms))?;

    match outcome {
        Ok(report) if args.json => {
            println!("{}", serde_json::to_string_pretty(report.as_ref())?);
        }
        Ok(report) => print_report(&report),
        Err(e @ InsightError::InsufficientSignal { .. }) => {
            tracing::warn!(user = %user, "{e}");
            println!("{}", e.user_message());
        }
        Err(e) => return Err(e).with_context(|| format!("could not build recommendations for {user}")),
    }

    Ok(())
}

fn print_report(report: &RecommendationReport) {
    let rule = "═".repeat(64);

    println!("{rule}");
    print!("{}", report.summary());
    println!("{rule}");

    for (i, rec) in report.recommendations.iter().enumerate() {
        println!(
            "{}. {} {}  (confidence {:.0}%)",
            i + 1,
            rec.action.to_string().to_uppercase(),
            rec.symbol,
            rec.confidence * 100.0
        );
        println!("   {}", rec.reasoning);
        println!();
    }

    println!("{rule}");
    println!("Top performers in your network (as of {}):", report.as_of.format("%Y-%m-%d %H:%M UTC"));
    for peer in &report.top_performers {
        println!(
            "  #{:<2} {:<16} P/L ${:>10.2}  influence {:>5.1}",
            peer.rank,
            peer.handle.as_deref().unwrap_or(peer.user.as_str()),
            peer.metrics.total_pnl,
            peer.metrics.social_influence
        );
    }
    println!("{rule}");
}
