use std::path::PathBuf;
use thiserror::Error;

use crate::cluster::ClusterError;

/// Errors that terminate a pipeline run.
///
/// Chart rendering has its own error type ([`crate::visualize::PlotError`])
/// because those failures are reported and skipped instead of propagated.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Column '{column}' row {row}: expected a number, found '{value}'")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Clustering failed: {0}")]
    Cluster(#[from] ClusterError),
}

impl PipelineError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
