use thiserror::Error;

/// Failures from the geometry core. All of these are terminal for a render:
/// a scale over an undefined domain is meaningless, so callers surface the
/// error instead of defaulting to partial geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("dataset has no records; the mean is undefined")]
    EmptyDataset,

    #[error("column '{field}' not found (available columns: {available})")]
    UnknownField { field: String, available: String },

    #[error("value '{value}' in column '{field}' at row {row} is not numeric")]
    NonNumericValue {
        field: String,
        value: String,
        row: usize,
    },
}

pub type Result<T> = std::result::Result<T, GeometryError>;
