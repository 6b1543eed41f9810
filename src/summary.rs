use crate::dataset::{numeric_value, Dataset};
use crate::error::{GeometryError, Result};

/// Vertical quantization unit: the value-axis maximum is pushed up to the
/// next multiple of this step (1/20 of a unit) so the top of the chart lands
/// on a clean increment.
pub const GRID_STEP: f64 = 0.05;

/// Read-only summary of the value column, derived once per render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub mean: f64,
    /// True maximum of the value column rounded up to the grid step.
    pub max_gridded: f64,
}

pub fn compute_summary(dataset: &Dataset, value_field: &str) -> Result<SummaryStats> {
    compute_summary_with_step(dataset, value_field, GRID_STEP)
}

/// Scan the value column once, accumulating the sum and the grid-snapped
/// maximum. Each record's value is snapped to a grid index with
/// `ceil(value / step)` and the running maximum index wins; the result is
/// `max_index * step`, a multiple of the step that bounds every value from
/// above by less than one step.
pub fn compute_summary_with_step(
    dataset: &Dataset,
    value_field: &str,
    step: f64,
) -> Result<SummaryStats> {
    if dataset.is_empty() {
        return Err(GeometryError::EmptyDataset);
    }
    let col = dataset.require_column(value_field)?;

    // Snap by multiplying with the inverse step: for the default 1/20 grid
    // the scale factor is exact in binary, so on-grid values stay put.
    let scale = 1.0 / step;
    let mut max_index = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for (row, record) in dataset.records().iter().enumerate() {
        let value = numeric_value(value_field, row + 1, record.get(col).unwrap_or(""))?;
        let index = (value * scale).ceil();
        if index > max_index {
            max_index = index;
        }
        sum += value;
    }

    Ok(SummaryStats {
        mean: sum / dataset.len() as f64,
        max_gridded: max_index / scale,
    })
}
