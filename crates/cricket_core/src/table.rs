//! # Table Module
//!
//! Row-oriented in-memory table loaded from a headed CSV file.
//!
//! Cells are typed once at load time (missing / integer / float / text) and
//! never coerced afterwards, except by [`Table::fill_missing_with_zero`].

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::{PipelineError, Result};

/// Tokens read as missing values besides the empty field.
const NA_TOKENS: [&str; 10] = [
    "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer a cell type from raw CSV text.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            return Value::Missing;
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Value::Int(v);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Value::Missing,
            Ok(v) => Value::Float(v),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell; `None` for text and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Missing | Value::Text(_) => None,
        }
    }

    /// Key used for equality joins. Missing cells never join.
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            Value::Missing => None,
            Value::Int(v) => Some(JoinKey::number(*v as f64)),
            Value::Float(v) => Some(JoinKey::number(*v)),
            Value::Text(s) => Some(JoinKey::Text(s.clone())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Hashable join key; integer and float cells with equal value compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Number(u64),
    Text(String),
}

impl JoinKey {
    fn number(v: f64) -> Self {
        // -0.0 and 0.0 must hash identically
        let normalized = if v == 0.0 { 0.0 } else { v };
        JoinKey::Number(normalized.to_bits())
    }
}

/// A numeric column pulled out of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub values: Vec<f64>,
    /// True when every source cell was an integer
    pub integral: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PipelineError::InvalidParameter(format!(
                "row {} has {} fields, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Load a headed CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file, path)
    }

    /// Load headed CSV text from any reader. `source` only labels errors.
    pub fn from_csv_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| PipelineError::csv(source, e))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::csv(source, e))?;
            rows.push(record.iter().map(Value::infer).collect());
        }

        tracing::debug!(
            path = %source.display(),
            rows = rows.len(),
            columns = columns.len(),
            "loaded table"
        );
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Numeric view of a column. Text or missing cells are an error.
    pub fn numeric_column(&self, name: &str) -> Result<NumericColumn> {
        let mut values = Vec::with_capacity(self.rows.len());
        let mut integral = true;
        for (row, cell) in self.column(name)?.enumerate() {
            match cell {
                Value::Int(v) => values.push(*v as f64),
                Value::Float(v) => {
                    integral = false;
                    values.push(*v);
                }
                Value::Missing | Value::Text(_) => {
                    return Err(PipelineError::NotNumeric {
                        column: name.to_string(),
                        row,
                        value: cell.to_string(),
                    })
                }
            }
        }
        Ok(NumericColumn { values, integral })
    }

    /// Replace every missing cell with 0, whatever the column holds.
    ///
    /// A column holding any text gets integer 0. Any other column gets
    /// float 0.0, so a numeric column with a gap no longer reads as
    /// integral. Returns the number of cells replaced.
    pub fn fill_missing_with_zero(&mut self) -> usize {
        let fills: Vec<Value> = (0..self.columns.len())
            .map(|col| {
                if self.rows.iter().any(|row| matches!(row[col], Value::Text(_))) {
                    Value::Int(0)
                } else {
                    Value::Float(0.0)
                }
            })
            .collect();

        let mut filled = 0;
        for row in &mut self.rows {
            for (cell, fill) in row.iter_mut().zip(&fills) {
                if cell.is_missing() {
                    *cell = fill.clone();
                    filled += 1;
                }
            }
        }
        filled
    }

    /// New table holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(csv: &str) -> Table {
        Table::from_csv_reader(csv.as_bytes(), Path::new("inline.csv")).unwrap()
    }

    #[test]
    fn test_value_inference() {
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer(" 4.5 "), Value::Float(4.5));
        assert_eq!(Value::infer("V Kohli"), Value::Text("V Kohli".to_string()));
        assert_eq!(Value::infer(""), Value::Missing);
        assert_eq!(Value::infer("NaN"), Value::Missing);
        assert_eq!(Value::infer("NA"), Value::Missing);
    }

    #[test]
    fn test_join_key_matches_int_and_float() {
        assert_eq!(Value::Int(7).join_key(), Value::Float(7.0).join_key());
        assert_ne!(Value::Int(7).join_key(), Value::Text("7".into()).join_key());
        assert!(Value::Missing.join_key().is_none());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"match_id,venue\n1,Eden Gardens\n2,\n").unwrap();

        let loaded = Table::from_csv_path(file.path())?;
        assert_eq!(loaded.columns(), ["match_id", "venue"]);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.rows()[1][1], Value::Missing);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Table::from_csv_path(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_ragged_row_is_error() {
        let err = Table::from_csv_reader("a,b\n1,2\n3\n".as_bytes(), Path::new("bad.csv"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Csv { .. }));
    }

    #[test]
    fn test_missing_column() {
        let t = table("a,b\n1,2\n");
        assert!(matches!(
            t.column_index("c"),
            Err(PipelineError::MissingColumn(name)) if name == "c"
        ));
    }

    #[test]
    fn test_numeric_column_tracks_integrality() -> Result<()> {
        let t = table("runs,rate\n1,1.5\n4,2\n");
        assert!(t.numeric_column("runs")?.integral);
        let rate = t.numeric_column("rate")?;
        assert!(!rate.integral);
        assert_eq!(rate.values, vec![1.5, 2.0]);
        Ok(())
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let t = table("over\n1\nten\n");
        assert!(matches!(
            t.numeric_column("over"),
            Err(PipelineError::NotNumeric { row: 1, .. })
        ));
    }

    #[test]
    fn test_fill_missing_with_zero_is_blunt() {
        let mut t = table("batter,rate\n,10.5\nRohit,\n");
        assert_eq!(t.fill_missing_with_zero(), 2);
        assert_eq!(t.rows()[0][0], Value::Int(0));
        assert_eq!(t.rows()[1][1], Value::Float(0.0));
    }

    #[test]
    fn test_filled_integer_column_is_no_longer_integral() -> Result<()> {
        let mut t = table("runs,extras\n4,1\n,0\n4,2\n");
        t.fill_missing_with_zero();

        let runs = t.numeric_column("runs")?;
        assert!(!runs.integral);
        assert_eq!(runs.values, vec![4.0, 0.0, 4.0]);
        assert!(t.numeric_column("extras")?.integral);
        Ok(())
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let t = table("x\n10\n20\n30\n");
        let picked = t.select_rows(&[2, 0]);
        assert_eq!(picked.rows(), [vec![Value::Int(30)], vec![Value::Int(10)]]);
    }
}
