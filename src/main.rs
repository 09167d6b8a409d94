use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use apod_pipeline::config::{nasa_api_key, Config};
use apod_pipeline::db::{DatabaseManager, DatabaseStorage};
use apod_pipeline::logging;
use apod_pipeline::pipeline::{self, extract, load, transform};
use apod_pipeline::pipeline::extract::ExtractSummary;
use apod_pipeline::pipeline::load::LoadSummary;
use apod_pipeline::pipeline::transform::TransformSummary;
use apod_pipeline::storage::ApodStorage;

#[derive(Parser)]
#[command(name = "apod_pipeline")]
#[command(about = "NASA APOD ETL pipeline: extract, stage, and load daily astronomy metadata")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw APOD records into the raw JSON artifact
    Extract {
        /// Lookback window in days (overrides config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Normalize the raw artifact into the staged CSV
    Transform,
    /// Upsert the staged CSV into the destination table
    Load {
        /// Attempt remaining batches after a batch failure
        #[arg(long)]
        keep_going: bool,
    },
    /// Run extract, transform and load sequentially
    Run {
        /// Lookback window in days (overrides config)
        #[arg(long)]
        days: Option<u32>,
        /// Attempt remaining batches after a batch failure
        #[arg(long)]
        keep_going: bool,
    },
}

fn print_extract_summary(summary: &ExtractSummary) {
    println!(
        "✅ Fetched {} APOD records from {} to {}",
        summary.records, summary.start_date, summary.end_date
    );
    println!("   Raw artifact: {}", summary.artifact.display());
}

fn print_transform_summary(summary: &TransformSummary) {
    println!(
        "✅ Staged {} of {} records ({} dropped)",
        summary.rows_written, summary.records_read, summary.rows_dropped
    );
    println!("   Staged artifact: {}", summary.artifact.display());
}

fn print_load_summary(summary: &LoadSummary) {
    println!(
        "✅ Upserted {} of {} rows in {} batches",
        summary.rows_upserted, summary.rows_read, summary.batches
    );
    if !summary.failed_batches.is_empty() {
        println!("⚠️  {} batches failed:", summary.failed_batches.len());
        for failure in &summary.failed_batches {
            println!("   - {failure}");
        }
    }
}

async fn connect_storage() -> anyhow::Result<Arc<dyn ApodStorage>> {
    info!("Initializing database storage...");
    let manager = DatabaseManager::new().await?;
    manager.run_migrations().await?;
    Ok(Arc::new(DatabaseStorage::new(manager)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Extract { days } => {
            if let Some(days) = days {
                config.extract.lookback_days = days;
            }
            config.validate()?;

            println!("📡 Running extract stage...");
            let api_key = nasa_api_key()?;
            let summary = extract::run(&config, &api_key).await?;
            print_extract_summary(&summary);
        }
        Commands::Transform => {
            config.validate()?;

            println!("🔧 Running transform stage...");
            let summary = transform::run(&config)?;
            print_transform_summary(&summary);
        }
        Commands::Load { keep_going } => {
            config.validate()?;

            println!("💾 Running load stage...");
            let storage = connect_storage().await?;
            let summary = load::run(&config, storage, keep_going).await?;
            print_load_summary(&summary);
            if !summary.failed_batches.is_empty() {
                anyhow::bail!("{} load batches failed", summary.failed_batches.len());
            }
        }
        Commands::Run { days, keep_going } => {
            if let Some(days) = days {
                config.extract.lookback_days = days;
            }
            config.validate()?;

            println!("🚀 Running full pipeline (extract + transform + load)...");
            let api_key = nasa_api_key()?;
            let storage = connect_storage().await?;
            let summary = pipeline::run_full(&config, &api_key, storage, keep_going).await?;

            print_extract_summary(&summary.extract);
            print_transform_summary(&summary.transform);
            print_load_summary(&summary.load);
            if !summary.load.failed_batches.is_empty() {
                anyhow::bail!("{} load batches failed", summary.load.failed_batches.len());
            }
            println!("✅ Full pipeline completed successfully!");
        }
    }
    Ok(())
}
