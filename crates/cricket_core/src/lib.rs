//! # cricket_core - Delivery-Type Analysis for Ball-by-Ball Cricket Data
//!
//! Batch pipeline over cleaned match and delivery CSVs:
//!
//! 1. Load both tables and inner-join them on `match_id`
//! 2. Draw a seeded 30% sample and zero-fill missing values
//! 3. Standardise four per-ball features and cluster them into delivery types
//! 4. Summarise batters and bowlers per delivery type
//! 5. Export three CSV tables
//! 6. Render two PNG charts as a separate, non-fatal step
//!
//! ## Features
//! - Reproducible: the same inputs and seed give byte-identical CSVs
//! - Chart failures are reported, never fatal

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod merge;
pub mod pipeline;
pub mod table;
pub mod visualize;

pub use aggregate::{Aggregates, BatterStat, BowlerEconomy, BowlerTrend, BowlerTrends, CsvRow, Runs};
pub use cluster::{cluster_deliveries, ClusterError, DeliveryClusters, KMeans, StandardScaler};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{analyze, run, AnalysisReport};
pub use table::{Table, Value};
pub use visualize::{render_charts, ChartOutcomes, PlotError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
