// Matchcast entry point.
//
// Startup sequence:
// 1. Parse CLI arguments
// 2. Initialize tracing (log to file, stdout carries the result paths)
// 3. Load config, seeding config/ from defaults/ on first run
// 4. Build scorer and stats provider
// 5. Run the projection pipeline for the slate date
// 6. Write the games and hitters documents

use matchcast_app::config;
use matchcast_app::output;
use matchcast_app::pipeline::{Pipeline, PipelineOptions};
use matchcast_app::provider::MlbStatsApi;
use matchcast_baseball::scorer::Scorer;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

/// Rank the hitters facing each probable starter on a slate.
#[derive(Debug, Parser)]
#[command(name = "matchcast", version, about)]
struct Cli {
    /// Slate date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Directory holding config/, defaults/, logs/ and the output directory.
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve working directory")?,
    };

    init_tracing(&base_dir)?;
    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    info!(%date, base_dir = %base_dir.display(), "matchcast starting up");

    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: slots 1-{}, lineup window {} days, concurrency {}",
        config.eligibility.max_projected_slot,
        config.windows.lineup_days,
        config.provider.max_concurrency
    );

    let scorer = Scorer::new(config.scoring.weights).context("invalid scoring weights")?;
    let provider =
        MlbStatsApi::from_config(&config.provider).context("failed to build stats client")?;
    let pipeline = Pipeline::new(provider, scorer, PipelineOptions::from_config(&config));

    let report = pipeline.run(date).await?;

    let out_dir = base_dir.join(&config.output.dir);
    let written = output::write_documents(
        &report,
        config.eligibility.min_season_pa_combined,
        &out_dir,
    )
    .context("failed to write output documents")?;

    println!("{}", written.games.display());
    println!("{}", written.hitters.display());
    info!("matchcast finished");
    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "matchcast_app=info,matchcast_baseball=info,warn";

/// Send logs to `<base_dir>/logs/matchcast.log`; `RUST_LOG` overrides the
/// default filter. Stdout stays free for the output paths.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let log_path = base_dir.join("logs").join("matchcast.log");
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
