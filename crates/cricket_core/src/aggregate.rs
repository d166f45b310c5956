//! # Aggregate Module
//!
//! Per-cluster summaries computed from the clustered sample:
//! - batter stats per (batter, delivery type)
//! - bowler delivery-type counts, pivoted wide
//! - bowler mean economy
//!
//! Groups are emitted in label order (then delivery type), one row per
//! combination present in the sample.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::delivery::DeliveryFrame;
use crate::error::{PipelineError, Result};

/// Summed runs, kept integral when every source value was an integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Runs {
    Whole(i64),
    Fractional(f64),
}

impl Runs {
    pub fn as_f64(self) -> f64 {
        match self {
            Runs::Whole(v) => v as f64,
            Runs::Fractional(v) => v,
        }
    }
}

/// A row type with a fixed CSV header.
///
/// `COLUMNS` must list the serialized field names in declaration order.
pub trait CsvRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

/// One row of `output_batter_patterns.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatterStat {
    pub batter: String,
    pub delivery_type: u32,
    pub total_runs: Runs,
    pub avg_runs: f64,
    pub balls_faced: u64,
    pub avg_strike_rate: f64,
}

impl CsvRow for BatterStat {
    const COLUMNS: &'static [&'static str] = &[
        "batter",
        "delivery_type",
        "total_runs",
        "avg_runs",
        "balls_faced",
        "avg_strike_rate",
    ];
}

/// Delivery counts for one bowler, aligned with [`BowlerTrends::delivery_types`].
#[derive(Debug, Clone, PartialEq)]
pub struct BowlerTrend {
    pub bowler: String,
    pub counts: Vec<u64>,
}

impl BowlerTrend {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Wide bowler × delivery-type count table.
#[derive(Debug, Clone, PartialEq)]
pub struct BowlerTrends {
    /// Delivery types present anywhere in the sample, ascending
    pub delivery_types: Vec<u32>,
    pub rows: Vec<BowlerTrend>,
}

impl BowlerTrends {
    /// Column position of a delivery type, if it was observed.
    pub fn column_of(&self, delivery_type: u32) -> Option<usize> {
        self.delivery_types.iter().position(|&t| t == delivery_type)
    }
}

/// One row of `output_bowler_economy.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlerEconomy {
    pub bowler: String,
    pub bowler_economy: f64,
}

impl CsvRow for BowlerEconomy {
    const COLUMNS: &'static [&'static str] = &["bowler", "bowler_economy"];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub batter_stats: Vec<BatterStat>,
    pub bowler_trends: BowlerTrends,
    pub bowler_economy: Vec<BowlerEconomy>,
}

#[derive(Default)]
struct BatterAcc {
    runs: f64,
    strike_rate: f64,
    balls: u64,
}

/// Compute all three summary tables. `labels` must hold one delivery type
/// per frame row.
pub fn aggregate(frame: &DeliveryFrame, labels: &[u32]) -> Result<Aggregates> {
    if labels.len() != frame.len() {
        return Err(PipelineError::InvalidParameter(format!(
            "{} delivery-type labels for {} rows",
            labels.len(),
            frame.len()
        )));
    }

    let aggregates = Aggregates {
        batter_stats: batter_stats(frame, labels),
        bowler_trends: bowler_trends(frame, labels),
        bowler_economy: bowler_economy(frame),
    };
    tracing::info!(
        batter_rows = aggregates.batter_stats.len(),
        bowler_rows = aggregates.bowler_trends.rows.len(),
        economy_rows = aggregates.bowler_economy.len(),
        "aggregated delivery types"
    );
    Ok(aggregates)
}

pub fn batter_stats(frame: &DeliveryFrame, labels: &[u32]) -> Vec<BatterStat> {
    let mut groups: BTreeMap<(u32, u32), BatterAcc> = BTreeMap::new();
    for (row, (&code, &label)) in frame.batter.codes().iter().zip(labels).enumerate() {
        let acc = groups.entry((code, label)).or_default();
        acc.runs += frame.runs_batter.values[row];
        acc.strike_rate += frame.batter_strike_rate[row];
        acc.balls += 1;
    }

    groups
        .into_iter()
        .map(|((code, delivery_type), acc)| {
            let balls = acc.balls as f64;
            let total_runs = if frame.runs_batter.integral {
                Runs::Whole(acc.runs.round() as i64)
            } else {
                Runs::Fractional(acc.runs)
            };
            BatterStat {
                batter: frame.batter.label(code).to_string(),
                delivery_type,
                total_runs,
                avg_runs: acc.runs / balls,
                balls_faced: acc.balls,
                avg_strike_rate: acc.strike_rate / balls,
            }
        })
        .collect()
}

pub fn bowler_trends(frame: &DeliveryFrame, labels: &[u32]) -> BowlerTrends {
    let delivery_types: Vec<u32> = labels
        .iter()
        .copied()
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();

    let mut per_bowler: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
    for (&code, &label) in frame.bowler.codes().iter().zip(labels) {
        let counts = per_bowler
            .entry(code)
            .or_insert_with(|| vec![0; delivery_types.len()]);
        // label comes from `labels`, so it is always in `delivery_types`
        if let Ok(col) = delivery_types.binary_search(&label) {
            counts[col] += 1;
        }
    }

    let rows = per_bowler
        .into_iter()
        .map(|(code, counts)| BowlerTrend {
            bowler: frame.bowler.label(code).to_string(),
            counts,
        })
        .collect();

    BowlerTrends {
        delivery_types,
        rows,
    }
}

pub fn bowler_economy(frame: &DeliveryFrame) -> Vec<BowlerEconomy> {
    let mut groups: BTreeMap<u32, (f64, u64)> = BTreeMap::new();
    for (row, &code) in frame.bowler.codes().iter().enumerate() {
        let (sum, n) = groups.entry(code).or_insert((0.0, 0));
        *sum += frame.bowler_economy[row];
        *n += 1;
    }

    groups
        .into_iter()
        .map(|(code, (sum, n))| BowlerEconomy {
            bowler: frame.bowler.label(code).to_string(),
            bowler_economy: sum / n as f64,
        })
        .collect()
}
