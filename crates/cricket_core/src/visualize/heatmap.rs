//! Strike-rate heatmap for the highest-scoring batters.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{color_ramp, PlotError, PlotResult};
use crate::aggregate::BatterStat;
use crate::config::{PipelineConfig, HEATMAP_FILE};

const TITLE: &str = "Avg Strike Rate by Delivery Type (Top 20 Batters)";

/// YlGnBu
const RAMP: [(u8, u8, u8); 9] = [
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

const GRID: RGBColor = RGBColor(128, 128, 128);

/// Batter × delivery-type matrix of clipped average strike rates.
#[derive(Debug, Clone, PartialEq)]
pub struct StrikeRateMatrix {
    /// Row labels, ascending
    pub batters: Vec<String>,
    /// Column labels, ascending
    pub delivery_types: Vec<u32>,
    /// `cells[row][col]`; `None` where the batter never met that type
    pub cells: Vec<Vec<Option<f64>>>,
}

impl StrikeRateMatrix {
    fn value_range(&self) -> (f64, f64) {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// The `n` batters with the most runs summed over all delivery types.
///
/// Ties keep the batter that sorts first.
pub fn top_batters(stats: &[BatterStat], n: usize) -> Vec<String> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for stat in stats {
        *totals.entry(stat.batter.as_str()).or_default() += stat.total_runs.as_f64();
    }

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(batter, _)| batter.to_string())
        .collect()
}

/// Select the top batters, clip their strike rates at `ceiling`, and pivot
/// to a batter × delivery-type matrix.
pub fn strike_rate_matrix(
    stats: &[BatterStat],
    top_n: usize,
    ceiling: f64,
) -> PlotResult<StrikeRateMatrix> {
    let top: BTreeSet<String> = top_batters(stats, top_n).into_iter().collect();
    let selected: Vec<&BatterStat> = stats.iter().filter(|s| top.contains(&s.batter)).collect();

    if selected.is_empty() {
        return Err(PlotError::InvalidData(
            "no batter statistics to plot".to_string(),
        ));
    }

    let batters: Vec<String> = top.into_iter().collect();
    let delivery_types: Vec<u32> = selected
        .iter()
        .map(|s| s.delivery_type)
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();

    let mut cells = vec![vec![None; delivery_types.len()]; batters.len()];
    for stat in selected {
        let row = batters.binary_search(&stat.batter);
        let col = delivery_types.binary_search(&stat.delivery_type);
        if let (Ok(row), Ok(col)) = (row, col) {
            if cells[row][col].is_some() {
                return Err(PlotError::InvalidData(format!(
                    "duplicate entry for batter '{}' and delivery type {}",
                    stat.batter, stat.delivery_type
                )));
            }
            cells[row][col] = Some(stat.avg_strike_rate.min(ceiling));
        }
    }

    Ok(StrikeRateMatrix {
        batters,
        delivery_types,
        cells,
    })
}

/// Build and save the heatmap; returns the image path.
pub fn strike_rate_heatmap(stats: &[BatterStat], config: &PipelineConfig) -> PlotResult<PathBuf> {
    let matrix = strike_rate_matrix(stats, config.top_n, config.strike_rate_ceiling)?;
    let path = config.output_path(HEATMAP_FILE);
    render_heatmap(&matrix, &path)?;
    tracing::info!(path = %path.display(), batters = matrix.batters.len(), "saved strike rate heatmap");
    Ok(path)
}

/// Draw an annotated heatmap, first batter at the top.
pub fn render_heatmap(matrix: &StrikeRateMatrix, path: &Path) -> PlotResult<()> {
    let n_rows = matrix.batters.len();
    let n_cols = matrix.delivery_types.len();
    if n_rows == 0 || n_cols == 0 {
        return Err(PlotError::InvalidData("heatmap has no cells".to_string()));
    }

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(170)
        .build_cartesian_2d(0f64..n_cols as f64, 0f64..n_rows as f64)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let (lo, hi) = matrix.value_range();
    let span = if hi > lo { hi - lo } else { 1.0 };

    // Row 0 is drawn at the top
    let cell_y = |row: usize| (n_rows - 1 - row) as f64;

    let mut cells = Vec::new();
    let mut labels = Vec::new();
    for (row, values) in matrix.cells.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            let t = (value - lo) / span;
            let (x, y) = (col as f64, cell_y(row));
            cells.push(Rectangle::new(
                [(x, y), (x + 1.0, y + 1.0)],
                color_ramp(&RAMP, t).filled(),
            ));

            let text_color = if t > 0.6 { WHITE } else { BLACK };
            labels.push(Text::new(
                format!("{:.1}", value),
                (x + 0.5, y + 0.5),
                ("sans-serif", 14)
                    .into_font()
                    .color(&text_color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ));
        }
    }

    chart
        .draw_series(cells)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    chart
        .draw_series((0..n_rows).flat_map(|row| {
            (0..n_cols).map(move |col| {
                let (x, y) = (col as f64, cell_y(row));
                Rectangle::new([(x, y), (x + 1.0, y + 1.0)], GRID.stroke_width(1))
            })
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    chart
        .draw_series(labels)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    // Axis tick labels, placed in pixel space next to the plotting area
    let tick_style = ("sans-serif", 14).into_font().color(&BLACK);
    for (col, delivery_type) in matrix.delivery_types.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(col as f64 + 0.5, 0.0));
        root.draw(&Text::new(
            delivery_type.to_string(),
            (px, py + 8),
            tick_style.pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }
    for (row, batter) in matrix.batters.iter().enumerate() {
        let (px, py) = chart.backend_coord(&(0.0, cell_y(row) + 0.5));
        root.draw(&Text::new(
            batter.clone(),
            (px - 8, py),
            tick_style.pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    let desc_style = ("sans-serif", 16).into_font().color(&BLACK);
    let (x_mid, bottom) = chart.backend_coord(&(n_cols as f64 / 2.0, 0.0));
    root.draw(&Text::new(
        "Delivery Type",
        (x_mid, bottom + 30),
        desc_style.pos(Pos::new(HPos::Center, VPos::Top)),
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;
    root.draw(&Text::new(
        "Batter",
        (10, chart.backend_coord(&(0.0, n_rows as f64 / 2.0)).1),
        desc_style.pos(Pos::new(HPos::Left, VPos::Center)),
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Save(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Runs;
    use tempfile::tempdir;

    fn stat(batter: &str, delivery_type: u32, runs: i64, strike_rate: f64) -> BatterStat {
        BatterStat {
            batter: batter.to_string(),
            delivery_type,
            total_runs: Runs::Whole(runs),
            avg_runs: 1.0,
            balls_faced: 1,
            avg_strike_rate: strike_rate,
        }
    }

    #[test]
    fn test_top_batters_sums_across_types() {
        let stats = vec![
            stat("A", 0, 10, 100.0),
            stat("A", 1, 30, 100.0),
            stat("B", 0, 35, 100.0),
            stat("C", 2, 5, 100.0),
        ];
        assert_eq!(top_batters(&stats, 2), vec!["A", "B"]);
    }

    #[test]
    fn test_top_batters_ties_keep_label_order() {
        let stats = vec![stat("Y", 0, 10, 1.0), stat("X", 0, 10, 1.0), stat("Z", 0, 10, 1.0)];
        assert_eq!(top_batters(&stats, 2), vec!["X", "Y"]);
    }

    #[test]
    fn test_matrix_clips_strike_rate() {
        let stats = vec![stat("A", 0, 10, 600.0), stat("A", 1, 10, 90.0)];
        let matrix = strike_rate_matrix(&stats, 20, 250.0).unwrap();

        assert_eq!(matrix.cells, vec![vec![Some(250.0), Some(90.0)]]);
        assert!(matrix.cells.iter().flatten().flatten().all(|&v| v <= 250.0));
    }

    #[test]
    fn test_matrix_leaves_gaps_for_absent_pairs() {
        let stats = vec![stat("A", 0, 10, 120.0), stat("B", 3, 20, 80.0)];
        let matrix = strike_rate_matrix(&stats, 20, 250.0).unwrap();

        assert_eq!(matrix.batters, vec!["A", "B"]);
        assert_eq!(matrix.delivery_types, vec![0, 3]);
        assert_eq!(matrix.cells[0], vec![Some(120.0), None]);
        assert_eq!(matrix.cells[1], vec![None, Some(80.0)]);
    }

    #[test]
    fn test_matrix_only_keeps_top_batters() {
        let stats: Vec<BatterStat> = (0..25)
            .map(|i| stat(&format!("B{:02}", i), 0, i, 100.0))
            .collect();
        let matrix = strike_rate_matrix(&stats, 20, 250.0).unwrap();
        assert_eq!(matrix.batters.len(), 20);
        assert!(!matrix.batters.contains(&"B00".to_string()));
    }

    #[test]
    fn test_empty_stats_fail() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = strike_rate_heatmap(&[], &config).unwrap_err();
        assert!(matches!(err, PlotError::InvalidData(_)));
        assert!(!dir.path().join(HEATMAP_FILE).exists());
    }

    #[test]
    fn test_render_writes_png_when_fonts_available() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let stats = vec![stat("A", 0, 10, 120.0), stat("B", 1, 20, 80.0)];

        // Headless hosts without system fonts fail at text rendering
        match strike_rate_heatmap(&stats, &config) {
            Ok(path) => assert!(path.exists()),
            Err(e) => assert!(e.is_render_failure(), "unexpected error: {}", e),
        }
    }
}
