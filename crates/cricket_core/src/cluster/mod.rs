//! # Cluster Module
//!
//! Discovers latent delivery types by standardising the per-ball features
//! and partitioning them with k-means.
//!
//! - `scaler` - z-score normalisation fitted on the sample
//! - `kmeans` - seeded k-means with k-means++ initialisation

pub mod kmeans;
pub mod scaler;

pub use kmeans::{KMeans, KMeansModel};
pub use scaler::StandardScaler;

use thiserror::Error;

use crate::config::{PipelineConfig, FEATURE_COLUMNS};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("Feature matrix is empty")]
    EmptyInput,

    #[error("Cluster count must be at least 1")]
    ZeroClusters,

    #[error("{samples} samples cannot form {clusters} clusters")]
    TooFewSamples { samples: usize, clusters: usize },

    #[error("Row {row} contains a non-finite feature value")]
    NonFinite { row: usize },
}

/// Delivery-type assignment for every sampled row.
#[derive(Debug, Clone)]
pub struct DeliveryClusters {
    /// Delivery type per row, in `0..n_clusters`
    pub labels: Vec<u32>,
    pub n_clusters: usize,
    /// Cluster centres in original feature units
    pub centers: Vec<[f64; 4]>,
    pub inertia: f64,
}

/// Scale the feature rows and assign each one a delivery type.
pub fn cluster_deliveries(
    features: &[[f64; 4]],
    config: &PipelineConfig,
) -> Result<DeliveryClusters, ClusterError> {
    let (scaler, scaled) = StandardScaler::fit_transform(features)?;

    let model = KMeans::new(config.n_clusters)
        .max_iter(config.kmeans_max_iter)
        .tol(config.kmeans_tol)
        .n_init(config.kmeans_n_init)
        .seed(config.seed)
        .fit(&scaled)?;

    let centers = scaler.inverse_transform(&model.centers);
    for (label, center) in centers.iter().enumerate() {
        tracing::debug!(
            delivery_type = label,
            "{}={:.2} {}={:.2} {}={:.2} {}={:.2}",
            FEATURE_COLUMNS[0],
            center[0],
            FEATURE_COLUMNS[1],
            center[1],
            FEATURE_COLUMNS[2],
            center[2],
            FEATURE_COLUMNS[3],
            center[3],
        );
    }
    tracing::info!(
        rows = features.len(),
        clusters = config.n_clusters,
        iterations = model.n_iter,
        inertia = model.inertia,
        "clustered deliveries"
    );

    Ok(DeliveryClusters {
        labels: model.labels,
        n_clusters: config.n_clusters,
        centers,
        inertia: model.inertia,
    })
}
