use crate::dataset::{numeric_value, Dataset, FieldSelectors};
use crate::error::Result;
use crate::scale::{ScaleMapping, Viewport};
use crate::scene::BAR_INSET;
use crate::summary::SummaryStats;

/// Pointer position in canvas pixels, passed explicitly by the embedding
/// surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

/// Half-thickness of the reference line's hover target, in pixels.
const REF_LINE_SLOP: f64 = 3.0;

/// Well-known descriptive columns the tooltip reads when present.
const SEASON_COLUMN: &str = "Season";
const EPISODES_COLUMN: &str = "num_episodes";
const TOP_EPISODE_COLUMN: &str = "most_viewed_title";
const TOP_EPISODE_VIEWS_COLUMN: &str = "max_views";

/// What the pointer is over. The reference line is painted last, so it wins
/// where it overlaps a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverTarget {
    MeanLine,
    /// Record index into the dataset.
    Bar(usize),
}

/// Find the topmost chart element under the pointer, if any.
pub fn hit_test(
    dataset: &Dataset,
    selectors: &FieldSelectors,
    summary: &SummaryStats,
    scales: &ScaleMapping,
    viewport: &Viewport,
    event: PointerEvent,
) -> Result<Option<HoverTarget>> {
    let in_plot_span = event.x >= viewport.margin_left && event.x <= viewport.width;

    let mean_y = scales.value.to_pixel(summary.mean);
    if in_plot_span && (event.y - mean_y).abs() <= REF_LINE_SLOP {
        return Ok(Some(HoverTarget::MeanLine));
    }

    let category_col = dataset.require_column(&selectors.category)?;
    let value_col = dataset.require_column(&selectors.value)?;
    let bar_width = (scales.band.band_width() - 2.0 * BAR_INSET).max(1.0);

    for (row, record) in dataset.records().iter().enumerate() {
        let category = record.get(category_col).unwrap_or("");
        let Some(band_start) = scales.band.position(category) else {
            continue;
        };
        let x0 = band_start + BAR_INSET;
        if event.x < x0 || event.x > x0 + bar_width {
            continue;
        }
        let value = numeric_value(&selectors.value, row + 1, record.get(value_col).unwrap_or(""))?;
        let top = scales.value.to_pixel(value);
        if event.y >= top && event.y <= viewport.height {
            return Ok(Some(HoverTarget::Bar(row)));
        }
    }

    Ok(None)
}

/// Format the overlay text for a hover target. Numbers are rounded to one
/// decimal place for display only.
pub fn tooltip_text(
    dataset: &Dataset,
    selectors: &FieldSelectors,
    summary: &SummaryStats,
    target: HoverTarget,
) -> Result<String> {
    match target {
        HoverTarget::MeanLine => Ok(format!("Overall Average = {}", round1(summary.mean))),
        HoverTarget::Bar(row) => {
            let category_col = dataset.require_column(&selectors.category)?;
            let value_col = dataset.require_column(&selectors.value)?;
            let record = &dataset.records()[row];
            let value =
                numeric_value(&selectors.value, row + 1, record.get(value_col).unwrap_or(""))?;

            let mut lines = Vec::new();
            if let Some(season) = cell(dataset, record, SEASON_COLUMN) {
                lines.push(format!("Season #{season}"));
            }
            lines.push(format!(
                "{}: {}",
                selectors.category,
                record.get(category_col).unwrap_or("")
            ));
            if let Some(episodes) = cell(dataset, record, EPISODES_COLUMN) {
                lines.push(format!("Episodes: {episodes}"));
            }
            lines.push(format!("{}: {}", selectors.value, round1(value)));
            if let Some(title) = cell(dataset, record, TOP_EPISODE_COLUMN) {
                lines.push(format!("Most Watched Episode: {title}"));
            }
            if let Some(views) = cell(dataset, record, TOP_EPISODE_VIEWS_COLUMN) {
                lines.push(format!("Viewers (millions): {views}"));
            }
            Ok(lines.join("\n"))
        }
    }
}

fn cell<'a>(
    dataset: &Dataset,
    record: &'a crate::dataset::Record,
    column: &str,
) -> Option<&'a str> {
    dataset.column_index(column).and_then(|idx| record.get(idx))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
