use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{self, GeometryError};

/// One parsed CSV table: a header row naming the columns, then the data rows
/// in file order. Loaded once and immutable for the lifetime of a render.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
}

/// One row of input data. Cells are kept as raw text; numeric coercion
/// happens at the point a number is actually required.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    cells: Vec<String>,
}

impl Record {
    pub fn new(cells: Vec<String>) -> Self {
        Record { cells }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// Column addressed either by 0-based index or by (case-insensitive) name.
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

pub fn parse_column_selector(input: &str) -> ColumnSelector {
    match input.parse::<usize>() {
        Ok(index) => ColumnSelector::Index(index),
        Err(_) => ColumnSelector::Name(input.to_string()),
    }
}

/// The two columns the geometry core consumes, threaded explicitly instead
/// of living in module-level state.
#[derive(Debug, Clone)]
pub struct FieldSelectors {
    pub category: String,
    pub value: String,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Dataset { headers, records }
    }

    /// Read a headered CSV table. An input with zero data rows loads fine;
    /// emptiness is rejected by the summary pass, where the mean becomes
    /// undefined.
    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result.context("Failed to read CSV record")?;
            records.push(Record::new(record.iter().map(|s| s.to_string()).collect()));
        }

        Ok(Dataset { headers, records })
    }

    pub fn from_path(path: &Path) -> Result<Dataset> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Dataset::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by case-insensitive name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Resolve a selector to a column position and the header's actual
    /// spelling.
    pub fn resolve_column(&self, selector: &ColumnSelector) -> error::Result<(usize, String)> {
        match selector {
            ColumnSelector::Index(idx) => match self.headers.get(*idx) {
                Some(name) => Ok((*idx, name.clone())),
                None => Err(self.unknown_field(&idx.to_string())),
            },
            ColumnSelector::Name(name) => match self.column_index(name) {
                Some(idx) => Ok((idx, self.headers[idx].clone())),
                None => Err(self.unknown_field(name)),
            },
        }
    }

    pub fn require_column(&self, name: &str) -> error::Result<usize> {
        self.column_index(name).ok_or_else(|| self.unknown_field(name))
    }

    fn unknown_field(&self, field: &str) -> GeometryError {
        GeometryError::UnknownField {
            field: field.to_string(),
            available: self.headers.join(", "),
        }
    }
}

/// Coerce one cell to a finite number, reporting the field and 1-based row
/// on failure.
pub fn numeric_value(field: &str, row: usize, raw: &str) -> error::Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeometryError::NonNumericValue {
            field: field.to_string(),
            value: raw.to_string(),
            row,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dataset_from_string(content: &str) -> Result<Dataset> {
        Dataset::from_reader(Cursor::new(content))
    }

    #[test]
    fn test_parse_column_selector_by_index() {
        match parse_column_selector("0") {
            ColumnSelector::Index(i) => assert_eq!(i, 0),
            _ => panic!("Expected Index"),
        }
        match parse_column_selector("42") {
            ColumnSelector::Index(i) => assert_eq!(i, 42),
            _ => panic!("Expected Index"),
        }
    }

    #[test]
    fn test_parse_column_selector_by_name() {
        match parse_column_selector("avg_views") {
            ColumnSelector::Name(s) => assert_eq!(s, "avg_views"),
            _ => panic!("Expected Name"),
        }
    }

    #[test]
    fn test_read_csv_basic() {
        let data = dataset_from_string("a,b,c\n1,2,3\n4,5,6").unwrap();
        assert_eq!(data.headers(), &["a", "b", "c"]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.records()[0].get(1), Some("2"));
        assert_eq!(data.records()[1].get(2), Some("6"));
    }

    #[test]
    fn test_read_csv_empty_data_loads() {
        // Zero data rows is a valid load; the summary pass rejects it.
        let data = dataset_from_string("x,y\n").unwrap();
        assert!(data.is_empty());
        assert_eq!(data.headers(), &["x", "y"]);
    }

    #[test]
    fn test_read_csv_unicode_headers() {
        let data = dataset_from_string("x,température\n1,20.5\n2,22.0").unwrap();
        assert_eq!(data.headers(), &["x", "température"]);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_read_csv_short_row_fails() {
        let result = dataset_from_string("x,y,z\n1,10,100\n2,20");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("record"));
    }

    #[test]
    fn test_resolve_column_by_name_case_insensitive() {
        let data = dataset_from_string("Year,Avg_Views\n2018,1.02").unwrap();
        let (idx, name) = data
            .resolve_column(&ColumnSelector::Name("year".to_string()))
            .unwrap();
        assert_eq!(idx, 0);
        assert_eq!(name, "Year"); // actual header spelling
    }

    #[test]
    fn test_resolve_column_by_index() {
        let data = dataset_from_string("x,y\n1,10").unwrap();
        let (idx, name) = data.resolve_column(&ColumnSelector::Index(1)).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(name, "y");
    }

    #[test]
    fn test_resolve_column_index_out_of_bounds() {
        let data = dataset_from_string("x,y\n1,10").unwrap();
        let err = data.resolve_column(&ColumnSelector::Index(9)).unwrap_err();
        match err {
            GeometryError::UnknownField { field, available } => {
                assert_eq!(field, "9");
                assert_eq!(available, "x, y");
            }
            other => panic!("Expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn test_require_column_missing() {
        let data = dataset_from_string("x,y\n1,10").unwrap();
        let err = data.require_column("nonexistent").unwrap_err();
        assert!(err.to_string().contains("'nonexistent' not found"));
        assert!(err.to_string().contains("x, y"));
    }

    #[test]
    fn test_numeric_value_parses() {
        assert_eq!(numeric_value("v", 1, "1.25").unwrap(), 1.25);
        assert_eq!(numeric_value("v", 1, " -3 ").unwrap(), -3.0);
        assert_eq!(numeric_value("v", 1, "2e10").unwrap(), 2e10);
    }

    #[test]
    fn test_numeric_value_rejects_text_and_empty() {
        for raw in ["abc", "", "1.2.3"] {
            let err = numeric_value("avg_views", 4, raw).unwrap_err();
            match err {
                GeometryError::NonNumericValue { field, value, row } => {
                    assert_eq!(field, "avg_views");
                    assert_eq!(value, raw);
                    assert_eq!(row, 4);
                }
                other => panic!("Expected NonNumericValue, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_numeric_value_rejects_non_finite() {
        assert!(numeric_value("v", 1, "NaN").is_err());
        assert!(numeric_value("v", 1, "inf").is_err());
    }
}
