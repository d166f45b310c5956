//! Grouped horizontal bar chart of delivery types for the busiest bowlers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::{color_ramp, PlotError, PlotResult};
use crate::aggregate::BowlerTrends;
use crate::config::{PipelineConfig, BOWLER_CHART_FILE};

const TITLE: &str = "Bowler Delivery Type Distribution (Top 20 Bowlers)";

/// magma
const RAMP: [(u8, u8, u8); 6] = [
    (0, 0, 4),
    (59, 15, 112),
    (140, 41, 129),
    (222, 73, 104),
    (254, 159, 109),
    (252, 253, 191),
];

/// Fraction of each bowler's slot covered by its bars
const GROUP_HEIGHT: f64 = 0.8;

/// One bowler × delivery-type count in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCount {
    pub bowler: String,
    pub delivery_type: u32,
    pub count: u64,
}

/// Long-form counts for the top bowlers plus their display order.
#[derive(Debug, Clone, PartialEq)]
pub struct BowlerDistribution {
    /// Bowlers by ascending total deliveries; drawn top to bottom
    pub order: Vec<String>,
    pub delivery_types: Vec<u32>,
    /// Ordered by delivery type, then by bowler rank
    pub counts: Vec<DeliveryCount>,
}

/// Pick the `top_n` bowlers by total deliveries over types `0..n_clusters`
/// and unpivot their counts.
///
/// Every expected delivery type must have a column in `trends`.
pub fn top_bowler_distribution(
    trends: &BowlerTrends,
    n_clusters: usize,
    top_n: usize,
) -> PlotResult<BowlerDistribution> {
    let delivery_types: Vec<u32> = (0..n_clusters as u32).collect();
    let columns = delivery_types
        .iter()
        .map(|&t| trends.column_of(t).ok_or(PlotError::MissingDeliveryType(t)))
        .collect::<PlotResult<Vec<usize>>>()?;

    let mut ranked: Vec<(&str, Vec<u64>, u64)> = trends
        .rows
        .iter()
        .map(|row| {
            let counts: Vec<u64> = columns.iter().map(|&c| row.counts[c]).collect();
            let total = counts.iter().sum();
            (row.bowler.as_str(), counts, total)
        })
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2));
    ranked.truncate(top_n);

    if ranked.is_empty() {
        return Err(PlotError::InvalidData("no bowlers to plot".to_string()));
    }

    let mut counts = Vec::with_capacity(ranked.len() * delivery_types.len());
    for (col, &delivery_type) in delivery_types.iter().enumerate() {
        for (bowler, row_counts, _) in &ranked {
            counts.push(DeliveryCount {
                bowler: bowler.to_string(),
                delivery_type,
                count: row_counts[col],
            });
        }
    }

    let order = bowler_order(&counts);
    Ok(BowlerDistribution {
        order,
        delivery_types,
        counts,
    })
}

/// Bowlers sorted by ascending summed count; ties keep label order.
pub fn bowler_order(counts: &[DeliveryCount]) -> Vec<String> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for c in counts {
        *totals.entry(c.bowler.as_str()).or_default() += c.count;
    }
    let mut order: Vec<(&str, u64)> = totals.into_iter().collect();
    order.sort_by_key(|&(_, total)| total);
    order.into_iter().map(|(b, _)| b.to_string()).collect()
}

/// Build and save the bar chart; returns the image path.
pub fn delivery_distribution_chart(
    trends: &BowlerTrends,
    config: &PipelineConfig,
) -> PlotResult<PathBuf> {
    let distribution = top_bowler_distribution(trends, config.n_clusters, config.top_n)?;
    let path = config.output_path(BOWLER_CHART_FILE);
    render_bowler_chart(&distribution, &path)?;
    tracing::info!(path = %path.display(), bowlers = distribution.order.len(), "saved bowler distribution chart");
    Ok(path)
}

/// Colour of the `idx`-th of `n` delivery types, sampled inside the ramp.
fn series_color(idx: usize, n: usize) -> RGBColor {
    color_ramp(&RAMP, (idx + 1) as f64 / (n + 1) as f64)
}

pub fn render_bowler_chart(distribution: &BowlerDistribution, path: &Path) -> PlotResult<()> {
    let n_bowlers = distribution.order.len();
    let n_types = distribution.delivery_types.len();
    if n_bowlers == 0 || n_types == 0 {
        return Err(PlotError::InvalidData("bar chart has no bars".to_string()));
    }

    let max_count = distribution.counts.iter().map(|c| c.count).max().unwrap_or(0);
    let x_max = (max_count as f64 * 1.05).max(1.0);

    let root = BitMapBackend::new(path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(180)
        .build_cartesian_2d(0f64..x_max, 0f64..n_bowlers as f64)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc("Delivery Count")
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    // First bowler in `order` occupies the top slot
    let slot: BTreeMap<&str, f64> = distribution
        .order
        .iter()
        .enumerate()
        .map(|(rank, b)| (b.as_str(), (n_bowlers - 1 - rank) as f64))
        .collect();
    let bar_height = GROUP_HEIGHT / n_types as f64;
    let pad = (1.0 - GROUP_HEIGHT) / 2.0;

    for (idx, &delivery_type) in distribution.delivery_types.iter().enumerate() {
        let color = series_color(idx, n_types);
        // Bars run top-down within a slot in delivery-type order
        let offset = pad + (n_types - 1 - idx) as f64 * bar_height;
        let bars: Vec<Rectangle<(f64, f64)>> = distribution
            .counts
            .iter()
            .filter(|c| c.delivery_type == delivery_type)
            .filter_map(|c| slot.get(c.bowler.as_str()).map(|&y| (y, c.count)))
            .map(|(y, count)| {
                Rectangle::new(
                    [(0.0, y + offset), (count as f64, y + offset + bar_height)],
                    color.filled(),
                )
            })
            .collect();

        chart
            .draw_series(bars)
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(format!("Delivery Type {}", delivery_type))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::LowerRight)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let tick_style = ("sans-serif", 13).into_font().color(&BLACK);
    for (bowler, &y) in &slot {
        let (px, py) = chart.backend_coord(&(0.0, y + 0.5));
        root.draw(&Text::new(
            bowler.to_string(),
            (px - 8, py),
            tick_style.pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }
    root.draw(&Text::new(
        "Bowler",
        (10, chart.backend_coord(&(0.0, n_bowlers as f64 / 2.0)).1),
        ("sans-serif", 16)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center)),
    ))
    .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Save(e.to_string()))?;
    Ok(())
}
