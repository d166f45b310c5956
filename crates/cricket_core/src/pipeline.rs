//! # Pipeline
//!
//! load → merge → sample → clean → scale/cluster → aggregate → export
//!
//! Every stage here is fatal on error. Charts are a separate step,
//! [`crate::visualize::render_charts`], run once the export has landed, so
//! a chart failure never touches the CSVs.

use crate::aggregate::{aggregate, Aggregates};
use crate::cluster::{cluster_deliveries, DeliveryClusters};
use crate::config::{PipelineConfig, MATCH_ID};
use crate::delivery::DeliveryFrame;
use crate::error::Result;
use crate::export::{export_all, ExportedFiles};
use crate::merge::{inner_join, sample_fraction};
use crate::table::Table;

/// Everything the fatal stages produced.
#[derive(Debug)]
pub struct AnalysisReport {
    pub merged_rows: usize,
    pub sampled_rows: usize,
    /// Missing cells replaced with 0 after sampling
    pub filled_cells: usize,
    pub clusters: DeliveryClusters,
    pub aggregates: Aggregates,
    pub exported: ExportedFiles,
}

/// Load both input files from `config.data_dir`, analyse them and export
/// the summary tables.
pub fn run(config: &PipelineConfig) -> Result<AnalysisReport> {
    let matches = Table::from_csv_path(&config.match_info_path())?;
    let deliveries = Table::from_csv_path(&config.deliveries_path())?;
    analyze(&matches, &deliveries, config)
}

/// Run every stage after loading, up to and including the CSV export.
pub fn analyze(
    matches: &Table,
    deliveries: &Table,
    config: &PipelineConfig,
) -> Result<AnalysisReport> {
    let merged = inner_join(deliveries, matches, MATCH_ID)?;
    let mut sample = sample_fraction(&merged, config.sample_fraction, config.seed)?;
    let filled_cells = sample.fill_missing_with_zero();
    tracing::info!(filled_cells, "filled missing values with 0");

    let frame = DeliveryFrame::from_table(&sample)?;
    let clusters = cluster_deliveries(&frame.features, config)?;
    let aggregates = aggregate(&frame, &clusters.labels)?;
    let exported = export_all(&aggregates, config)?;

    Ok(AnalysisReport {
        merged_rows: merged.len(),
        sampled_rows: sample.len(),
        filled_cells,
        clusters,
        aggregates,
        exported,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{BowlerTrend, BowlerTrends};
    use crate::config::{BATTER_PATTERNS_FILE, BOWLER_ECONOMY_FILE, BOWLER_TRENDS_FILE};
    use crate::error::PipelineError;
    use crate::merge::sample_size;
    use crate::visualize::{render_charts, PlotError};
    use std::fmt::Write as _;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const DELIVERY_HEADER: &str =
        "match_id,over,ball_number,batter,bowler,runs_batter,pressure_index,bowler_economy,batter_strike_rate";

    const BATTERS: [&str; 6] = ["Kohli", "Sharma", "Root", "Smith", "Williamson", "Babar"];
    const BOWLERS: [&str; 4] = ["Bumrah", "Starc", "Anderson", "Rashid"];

    /// Deterministic synthetic season: 5 matches (one without deliveries),
    /// plus deliveries for a match id that has no metadata.
    fn write_inputs(dir: &Path, deliveries_per_match: usize) {
        let mut matches = String::from("match_id,venue,season\n");
        for m in 1..=5 {
            writeln!(matches, "{},Ground {},20{}", m, m, 20 + m).unwrap();
        }

        let mut deliveries = format!("{}\n", DELIVERY_HEADER);
        for m in 1..=5 {
            // match 5 has metadata only; match 6 has deliveries only
            let match_id = if m == 5 { 6 } else { m };
            for i in 0..deliveries_per_match {
                let over = i / 6;
                let ball = i % 6 + 1;
                let batter = BATTERS[(i + m) % BATTERS.len()];
                let bowler = BOWLERS[(over + m) % BOWLERS.len()];
                let runs = (i * 7 + m) % 7;
                let pressure = ((i * 13 + m * 3) % 17) as f64 / 10.0;
                let economy = 4.0 + ((over * 5 + m) % 9) as f64 * 0.75;
                // Every 11th ball is missing its strike rate
                let strike_rate = if i % 11 == 0 {
                    String::new()
                } else {
                    format!("{:.1}", 60.0 + ((i * 31 + m) % 200) as f64)
                };
                writeln!(
                    deliveries,
                    "{},{},{},{},{},{},{},{},{}",
                    match_id, over, ball, batter, bowler, runs, pressure, economy, strike_rate
                )
                .unwrap();
            }
        }

        std::fs::write(dir.join(crate::config::MATCH_INFO_FILE), matches).unwrap();
        std::fs::write(dir.join(crate::config::DELIVERIES_FILE), deliveries).unwrap();
    }

    fn setup(deliveries_per_match: usize) -> (TempDir, PipelineConfig) {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), deliveries_per_match);
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        (dir, config)
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_full_run_produces_csvs() -> Result<()> {
        let (dir, config) = setup(60);
        let report = run(&config)?;

        // 4 joinable matches × 60 deliveries
        assert_eq!(report.merged_rows, 240);
        assert_eq!(report.sampled_rows, sample_size(240, 0.3));
        assert!(report.clusters.labels.iter().all(|&l| l < 4));

        for file in [BATTER_PATTERNS_FILE, BOWLER_TRENDS_FILE, BOWLER_ECONOMY_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
        assert!(read(&report.exported.batter_patterns)
            .starts_with("batter,delivery_type,total_runs,avg_runs,balls_faced,avg_strike_rate\n"));
        assert!(read(&report.exported.bowler_economy).starts_with("bowler,bowler_economy\n"));
        assert!(read(&report.exported.bowler_trends).starts_with("bowler,"));
        Ok(())
    }

    #[test]
    fn test_reruns_are_byte_identical() -> Result<()> {
        let (_first_dir, first) = setup(45);
        let (_second_dir, second) = setup(45);

        let a = run(&first)?;
        let b = run(&second)?;

        assert_eq!(read(&a.exported.batter_patterns), read(&b.exported.batter_patterns));
        assert_eq!(read(&a.exported.bowler_trends), read(&b.exported.bowler_trends));
        assert_eq!(read(&a.exported.bowler_economy), read(&b.exported.bowler_economy));
        Ok(())
    }

    #[test]
    fn test_trend_rows_sum_to_sampled_deliveries() -> Result<()> {
        let (_dir, config) = setup(60);
        let report = run(&config)?;

        let total: u64 = report
            .aggregates
            .bowler_trends
            .rows
            .iter()
            .map(|r| r.total())
            .sum();
        assert_eq!(total, report.sampled_rows as u64);
        assert_eq!(
            report.aggregates.bowler_economy.len(),
            report.aggregates.bowler_trends.rows.len()
        );

        let faced: u64 = report
            .aggregates
            .batter_stats
            .iter()
            .map(|s| s.balls_faced)
            .sum();
        assert_eq!(faced, report.sampled_rows as u64);
        Ok(())
    }

    #[test]
    fn test_missing_strike_rates_are_filled() -> Result<()> {
        let (_dir, config) = setup(60);
        let report = run(&config)?;
        assert!(report.filled_cells > 0);
        Ok(())
    }

    #[test]
    fn test_single_cluster_scenario() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut deliveries = format!("{}\n", DELIVERY_HEADER);
        for i in 0..10 {
            let batter = if i % 2 == 0 { "Kohli" } else { "Root" };
            let bowler = if i < 5 { "Bumrah" } else { "Anderson" };
            writeln!(
                deliveries,
                "1,{},{},{},{},{},{},{},{}",
                i / 6,
                i % 6 + 1,
                batter,
                bowler,
                i % 4,
                i as f64 * 0.3,
                5.0 + i as f64,
                100.0 + i as f64 * 10.0
            )
            .unwrap();
        }
        let deliveries = Table::from_csv_reader(deliveries.as_bytes(), Path::new("deliveries.csv"))?;
        let matches = Table::from_csv_reader("match_id,venue\n1,Oval\n".as_bytes(), Path::new("matches.csv"))?;

        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            sample_fraction: 1.0,
            n_clusters: 1,
            ..Default::default()
        };
        let report = analyze(&matches, &deliveries, &config)?;

        assert!(report.clusters.labels.iter().all(|&l| l == 0));
        let patterns = read(&report.exported.batter_patterns);
        let lines: Vec<&str> = patterns.lines().skip(1).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Kohli,0,"));
        assert!(lines[1].starts_with("Root,0,"));
        assert_eq!(read(&report.exported.bowler_trends), "bowler,0\nAnderson,5\nBumrah,5\n");
        Ok(())
    }

    #[test]
    fn test_heatmap_failure_does_not_stop_exports() -> Result<()> {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let aggregates = Aggregates {
            batter_stats: Vec::new(),
            bowler_trends: BowlerTrends {
                delivery_types: vec![0, 1, 2, 3],
                rows: vec![BowlerTrend {
                    bowler: "Bumrah".into(),
                    counts: vec![3, 1, 4, 1],
                }],
            },
            bowler_economy: Vec::new(),
        };

        let exported = export_all(&aggregates, &config)?;
        let charts = render_charts(&aggregates, &config);

        assert!(matches!(charts.heatmap, Err(PlotError::InvalidData(_))));
        assert_eq!(
            read(&exported.batter_patterns),
            "batter,delivery_type,total_runs,avg_runs,balls_faced,avg_strike_rate\n"
        );
        assert_eq!(read(&exported.bowler_trends), "bowler,0,1,2,3\nBumrah,3,1,4,1\n");
        assert_eq!(read(&exported.bowler_economy), "bowler,bowler_economy\n");
        Ok(())
    }

    #[test]
    fn test_charts_run_after_export() -> Result<()> {
        let (dir, config) = setup(60);
        let report = run(&config)?;

        // Exports are complete before any chart is attempted
        assert!(!dir.path().join(crate::config::HEATMAP_FILE).exists());
        assert!(!dir.path().join(crate::config::BOWLER_CHART_FILE).exists());

        let charts = render_charts(&report.aggregates, &config);
        match &charts.heatmap {
            Ok(path) => assert!(path.exists()),
            Err(e) => assert!(e.is_render_failure(), "unexpected error: {}", e),
        }
        match &charts.bowler_chart {
            Ok(path) => assert!(path.exists()),
            // A delivery type can end up empty in a small sample
            Err(PlotError::MissingDeliveryType(t)) => assert!(*t < 4),
            Err(e) => assert!(e.is_render_failure(), "unexpected error: {}", e),
        }
        Ok(())
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(PipelineError::Io { .. })));
        assert!(!dir.path().join(BATTER_PATTERNS_FILE).exists());
    }

    #[test]
    fn test_empty_join_is_fatal() {
        let dir = tempdir().unwrap();
        let deliveries = Table::from_csv_reader(
            format!("{}\n9,0,1,A,B,1,0.1,6.0,100.0\n", DELIVERY_HEADER).as_bytes(),
            Path::new("deliveries.csv"),
        )
        .unwrap();
        let matches =
            Table::from_csv_reader("match_id\n1\n".as_bytes(), Path::new("matches.csv")).unwrap();
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        assert!(matches!(
            analyze(&matches, &deliveries, &config),
            Err(PipelineError::Cluster(_))
        ));
        assert!(!dir.path().join(BATTER_PATTERNS_FILE).exists());
    }
}
