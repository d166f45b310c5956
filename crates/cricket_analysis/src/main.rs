//! Cricket delivery-type analysis CLI
//!
//! cleaned_match_info.csv + cleaned_deliveries.csv → per-cluster CSVs + PNG charts

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_core::{ChartOutcomes, PipelineConfig};

#[derive(Parser)]
#[command(name = "cricket_analysis")]
#[command(about = "Cluster deliveries into delivery types and summarise batters and bowlers", long_about = None)]
struct Cli {
    /// Directory containing cleaned_match_info.csv and cleaned_deliveries.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory receiving the CSV and PNG outputs
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Log pipeline stages to stderr
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = PipelineConfig {
        data_dir: cli.data_dir,
        output_dir: cli.out_dir,
        ..Default::default()
    };

    let report = cricket_core::run(&config).with_context(|| {
        format!(
            "Analysis failed for inputs in {}",
            config.data_dir.display()
        )
    })?;
    println!("✅ Analysis complete. CSVs saved.");

    let charts = cricket_core::render_charts(&report.aggregates, &config);
    print_chart_failures(&charts);

    tracing::info!(
        merged = report.merged_rows,
        sampled = report.sampled_rows,
        batter_rows = report.aggregates.batter_stats.len(),
        bowlers = report.aggregates.bowler_economy.len(),
        "run summary"
    );
    Ok(())
}

fn print_chart_failures(charts: &ChartOutcomes) {
    if let Err(e) = &charts.heatmap {
        println!("⚠️ Strike rate heatmap generation failed: {}", e);
    }
    if let Err(e) = &charts.bowler_chart {
        println!("⚠️ Horizontal bar chart generation failed: {}", e);
    }
}
