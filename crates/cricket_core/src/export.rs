//! CSV export of the three summary tables.
//!
//! Files are truncated and rewritten on every run; no index column is
//! written.

use std::path::{Path, PathBuf};

use crate::aggregate::{Aggregates, BowlerTrends, CsvRow};
use crate::config::{PipelineConfig, BATTER_PATTERNS_FILE, BOWLER_ECONOMY_FILE, BOWLER_TRENDS_FILE};
use crate::error::{PipelineError, Result};

/// Where each exported table landed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub batter_patterns: PathBuf,
    pub bowler_trends: PathBuf,
    pub bowler_economy: PathBuf,
}

pub fn export_all(aggregates: &Aggregates, config: &PipelineConfig) -> Result<ExportedFiles> {
    let files = ExportedFiles {
        batter_patterns: config.output_path(BATTER_PATTERNS_FILE),
        bowler_trends: config.output_path(BOWLER_TRENDS_FILE),
        bowler_economy: config.output_path(BOWLER_ECONOMY_FILE),
    };

    write_rows(&files.batter_patterns, &aggregates.batter_stats)?;
    write_bowler_trends(&files.bowler_trends, &aggregates.bowler_trends)?;
    write_rows(&files.bowler_economy, &aggregates.bowler_economy)?;

    tracing::info!(dir = %config.output_dir.display(), "exported summary tables");
    Ok(files)
}

/// Serialize rows under the row type's fixed header.
///
/// An empty slice still produces the header line.
pub fn write_rows<T: CsvRow>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;
    writer
        .write_record(T::COLUMNS)
        .map_err(|e| PipelineError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Wide table: `bowler` followed by one column per observed delivery type.
pub fn write_bowler_trends(path: &Path, trends: &BowlerTrends) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;

    let mut header = vec!["bowler".to_string()];
    header.extend(trends.delivery_types.iter().map(|t| t.to_string()));
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for row in &trends.rows {
        let mut record = vec![row.bowler.clone()];
        record.extend(row.counts.iter().map(|c| c.to_string()));
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::csv(path, e))?;
    }

    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
