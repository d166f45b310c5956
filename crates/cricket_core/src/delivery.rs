//! Typed view of the cleaned, sampled delivery table.
//!
//! Batter and bowler identifiers are dictionary-encoded ([`Categorical`]);
//! everything the clusterer and aggregator need is pulled into flat columns.

use rustc_hash::FxHashMap;

use crate::config::FEATURE_COLUMNS;
use crate::error::Result;
use crate::table::{NumericColumn, Table};

pub const BATTER: &str = "batter";
pub const BOWLER: &str = "bowler";
pub const RUNS_BATTER: &str = "runs_batter";
pub const BATTER_STRIKE_RATE: &str = "batter_strike_rate";
pub const BOWLER_ECONOMY: &str = "bowler_economy";

/// Dictionary-encoded string column.
///
/// Categories are sorted, so ordering by code is ordering by label.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    categories: Vec<String>,
    codes: Vec<u32>,
}

impl Categorical {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        let mut categories = labels.clone();
        categories.sort();
        categories.dedup();

        let lookup: FxHashMap<&str, u32> = categories
            .iter()
            .enumerate()
            .map(|(code, label)| (label.as_str(), code as u32))
            .collect();
        let codes = labels.iter().map(|label| lookup[label.as_str()]).collect();

        Self { categories, codes }
    }

    /// Recode a table column; every cell is rendered to its text label.
    pub fn from_column(table: &Table, name: &str) -> Result<Self> {
        Ok(Self::from_labels(table.column(name)?.map(|v| v.to_string())))
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    pub fn label(&self, code: u32) -> &str {
        &self.categories[code as usize]
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Column-oriented deliveries ready for clustering and aggregation.
#[derive(Debug, Clone)]
pub struct DeliveryFrame {
    pub batter: Categorical,
    pub bowler: Categorical,
    pub runs_batter: NumericColumn,
    pub batter_strike_rate: Vec<f64>,
    pub bowler_economy: Vec<f64>,
    /// One row per delivery, ordered as [`FEATURE_COLUMNS`]
    pub features: Vec<[f64; 4]>,
}

impl DeliveryFrame {
    /// Extract the analysis columns. Any missing column is an error, as is
    /// a non-numeric cell in a numeric column.
    pub fn from_table(table: &Table) -> Result<Self> {
        let batter = Categorical::from_column(table, BATTER)?;
        let bowler = Categorical::from_column(table, BOWLER)?;
        let runs_batter = table.numeric_column(RUNS_BATTER)?;
        let batter_strike_rate = table.numeric_column(BATTER_STRIKE_RATE)?.values;
        let bowler_economy = table.numeric_column(BOWLER_ECONOMY)?.values;

        let feature_columns = FEATURE_COLUMNS
            .iter()
            .map(|name| table.numeric_column(name).map(|c| c.values))
            .collect::<Result<Vec<_>>>()?;
        let features = (0..table.len())
            .map(|row| std::array::from_fn(|f| feature_columns[f][row]))
            .collect();

        tracing::info!(
            rows = table.len(),
            batters = batter.categories().len(),
            bowlers = bowler.categories().len(),
            "built delivery frame"
        );

        Ok(Self {
            batter,
            bowler,
            runs_batter,
            batter_strike_rate,
            bowler_economy,
            features,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
