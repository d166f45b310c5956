//! Merge and downsample the delivery and match tables.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::error::{PipelineError, Result};
use crate::table::{JoinKey, Table};

/// Inner join of `left` and `right` on `key` (many-to-one or many-to-many).
///
/// Output rows follow `left` order; each left row is repeated once per
/// matching right row. Columns are all left columns followed by the right
/// columns other than `key`. Non-key names present on both sides get the
/// suffixes `_x` (left) and `_y` (right).
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = left.column_index(key)?;
    let right_key = right.column_index(key)?;

    let mut right_index: FxHashMap<JoinKey, Vec<usize>> = FxHashMap::default();
    for (idx, row) in right.rows().iter().enumerate() {
        if let Some(k) = row[right_key].join_key() {
            right_index.entry(k).or_default().push(idx);
        }
    }

    let overlaps = |name: &str| {
        name != key
            && left.columns().iter().any(|c| c == name)
            && right.columns().iter().any(|c| c == name)
    };

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| if overlaps(c.as_str()) { format!("{}_x", c) } else { c.clone() })
        .collect();
    columns.extend(
        right
            .columns()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != right_key)
            .map(|(_, c)| if overlaps(c.as_str()) { format!("{}_y", c) } else { c.clone() }),
    );

    let mut rows = Vec::new();
    for left_row in left.rows() {
        let Some(k) = left_row[left_key].join_key() else {
            continue;
        };
        let Some(matches) = right_index.get(&k) else {
            continue;
        };
        for &right_idx in matches {
            let mut merged = left_row.clone();
            merged.extend(
                right.rows()[right_idx]
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| *idx != right_key)
                    .map(|(_, cell)| cell.clone()),
            );
            rows.push(merged);
        }
    }

    tracing::info!(
        left = left.len(),
        right = right.len(),
        merged = rows.len(),
        key,
        "inner join complete"
    );
    Table::new(columns, rows)
}

/// Rows kept when sampling `fraction` of `rows` (round half to even).
pub fn sample_size(rows: usize, fraction: f64) -> usize {
    (fraction * rows as f64).round_ties_even() as usize
}

/// Uniform random subset without replacement, reproducible for a given seed.
///
/// Rows come back in draw order, not source order.
pub fn sample_fraction(table: &Table, fraction: f64, seed: u64) -> Result<Table> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(PipelineError::InvalidParameter(format!(
            "sample fraction {} outside [0, 1]",
            fraction
        )));
    }

    let amount = sample_size(table.len(), fraction);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let indices = rand::seq::index::sample(&mut rng, table.len(), amount).into_vec();

    tracing::info!(rows = table.len(), sampled = amount, seed, "sampled merged table");
    Ok(table.select_rows(&indices))
}
