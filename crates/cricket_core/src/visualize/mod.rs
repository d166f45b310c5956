//! # Visualize Module
//!
//! PNG charts built from the aggregates with the [`plotters`] bitmap
//! backend.
//!
//! - `heatmap` - average strike rate per delivery type for the top batters
//! - `bowler_chart` - delivery-type counts for the top bowlers
//!
//! Chart failures never abort a run. [`render_charts`] attempts both charts
//! and hands back each outcome for the caller to report.

pub mod bowler_chart;
pub mod heatmap;

use std::path::PathBuf;

use plotters::style::RGBColor;
use thiserror::Error;

use crate::aggregate::Aggregates;
use crate::config::PipelineConfig;

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save chart: {0}")]
    Save(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Delivery type {0} has no count column")]
    MissingDeliveryType(u32),
}

pub type PlotResult<T> = std::result::Result<T, PlotError>;

/// Outcome of each chart step.
#[derive(Debug)]
pub struct ChartOutcomes {
    pub heatmap: PlotResult<PathBuf>,
    pub bowler_chart: PlotResult<PathBuf>,
}

/// Render both charts; a failure in one does not stop the other.
pub fn render_charts(aggregates: &Aggregates, config: &PipelineConfig) -> ChartOutcomes {
    let heatmap = heatmap::strike_rate_heatmap(&aggregates.batter_stats, config);
    if let Err(e) = &heatmap {
        tracing::warn!(error = %e, "strike rate heatmap skipped");
    }

    let bowler_chart = bowler_chart::delivery_distribution_chart(&aggregates.bowler_trends, config);
    if let Err(e) = &bowler_chart {
        tracing::warn!(error = %e, "bowler distribution chart skipped");
    }

    ChartOutcomes {
        heatmap,
        bowler_chart,
    }
}

impl PlotError {
    /// True for failures raised by the drawing backend rather than by the data.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            PlotError::DrawingArea(_)
                | PlotError::ChartConfig(_)
                | PlotError::Drawing(_)
                | PlotError::Save(_)
        )
    }
}

/// Linear interpolation over evenly spaced colour stops; `t` is clamped to [0, 1].
pub(crate) fn color_ramp(stops: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    if stops.len() < 2 {
        let (r, g, b) = stops.first().copied().unwrap_or((0, 0, 0));
        return RGBColor(r, g, b);
    }

    let scaled = t * (stops.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = scaled - lower as f64;
    let (r0, g0, b0) = stops[lower];
    let (r1, g1, b1) = stops[lower + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_ramp_endpoints_and_midpoint() {
        let stops = [(0, 0, 0), (200, 100, 50)];
        assert_eq!(color_ramp(&stops, 0.0), RGBColor(0, 0, 0));
        assert_eq!(color_ramp(&stops, 1.0), RGBColor(200, 100, 50));
        assert_eq!(color_ramp(&stops, 0.5), RGBColor(100, 50, 25));
        assert_eq!(color_ramp(&stops, 7.0), RGBColor(200, 100, 50));
        assert_eq!(color_ramp(&stops, f64::NAN), RGBColor(0, 0, 0));
    }

    #[test]
    fn test_render_failure_classification() {
        assert!(PlotError::Save("disk full".into()).is_render_failure());
        assert!(PlotError::Drawing("no font".into()).is_render_failure());
        assert!(!PlotError::InvalidData("empty".into()).is_render_failure());
        assert!(!PlotError::MissingDeliveryType(2).is_render_failure());
    }
}
