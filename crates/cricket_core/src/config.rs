//! Pipeline constants
//!
//! Every value the analysis depends on lives here. `Default` gives the
//! production values; tests override individual fields.

use std::path::PathBuf;

pub const MATCH_INFO_FILE: &str = "cleaned_match_info.csv";
pub const DELIVERIES_FILE: &str = "cleaned_deliveries.csv";

pub const BATTER_PATTERNS_FILE: &str = "output_batter_patterns.csv";
pub const BOWLER_TRENDS_FILE: &str = "output_bowler_trends.csv";
pub const BOWLER_ECONOMY_FILE: &str = "output_bowler_economy.csv";

pub const HEATMAP_FILE: &str = "batter_strike_rate_heatmap_top20.png";
pub const BOWLER_CHART_FILE: &str = "bowler_delivery_distribution_top20.png";

/// Join key shared by the match and delivery files.
pub const MATCH_ID: &str = "match_id";

/// Feature columns fed to the clusterer, in matrix column order.
pub const FEATURE_COLUMNS: [&str; 4] = ["over", "ball_number", "pressure_index", "bowler_economy"];

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the two input CSVs
    pub data_dir: PathBuf,
    /// Directory receiving the CSV and PNG outputs
    pub output_dir: PathBuf,
    /// Fraction of merged rows kept for the analysis
    pub sample_fraction: f64,
    /// Seed shared by sampling and k-means initialisation
    pub seed: u64,
    pub n_clusters: usize,
    pub kmeans_max_iter: usize,
    pub kmeans_tol: f64,
    pub kmeans_n_init: usize,
    /// Batters shown in the heatmap and bowlers shown in the bar chart
    pub top_n: usize,
    /// Heatmap strike rates are clipped to this ceiling
    pub strike_rate_ceiling: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            sample_fraction: 0.3,
            seed: 42,
            n_clusters: 4,
            kmeans_max_iter: 300,
            kmeans_tol: 1e-4,
            kmeans_n_init: 1,
            top_n: 20,
            strike_rate_ceiling: 250.0,
        }
    }
}

impl PipelineConfig {
    pub fn match_info_path(&self) -> PathBuf {
        self.data_dir.join(MATCH_INFO_FILE)
    }

    pub fn deliveries_path(&self) -> PathBuf {
        self.data_dir.join(DELIVERIES_FILE)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
