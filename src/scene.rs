use crate::dataset::{numeric_value, Dataset, FieldSelectors};
use crate::error::Result;
use crate::scale::{ScaleMapping, Viewport};
use crate::summary::SummaryStats;

/// Horizontal inset between a band edge and its bar, in pixels.
pub const BAR_INSET: f64 = 1.0;

/// Length of an axis tick mark, in pixels.
const TICK_SIZE: f64 = 6.0;

/// Gap between a tick mark and its label, in pixels.
const TICK_LABEL_GAP: f64 = 3.0;

/// Static presentation choices for one chart.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Column whose cells mark measured rows; a row not matching
    /// `flag_value` is drawn muted. A missing column leaves every bar
    /// accented.
    pub flag_column: Option<String>,
    pub flag_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// A primitive drawing command. The renderer executes these blindly; all
/// layout decisions happen here.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// One bar, from top-left to bottom-right corner.
    Rect {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        accent: bool,
    },
    /// Solid straight line.
    Line {
        from: (f64, f64),
        to: (f64, f64),
        width: u32,
    },
    /// Dashed straight line (10px on, 3px off).
    DashedLine {
        from: (f64, f64),
        to: (f64, f64),
        width: u32,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
        h: HAlign,
        v: VAlign,
        rotated: bool,
        size: u32,
    },
}

/// A compiled chart: canvas size plus the full command list, in paint
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

/// Compile dataset + geometry into drawing commands: one bar per record,
/// both axes with tick labels, captions and the dashed mean reference line
/// (painted last, so it sits on top).
pub fn compile_scene(
    dataset: &Dataset,
    selectors: &FieldSelectors,
    config: &ChartConfig,
    summary: &SummaryStats,
    scales: &ScaleMapping,
    viewport: &Viewport,
) -> Result<Scene> {
    let category_col = dataset.require_column(&selectors.category)?;
    let value_col = dataset.require_column(&selectors.value)?;
    let flag_col = config
        .flag_column
        .as_deref()
        .and_then(|name| dataset.column_index(name));

    let mut commands = Vec::new();

    // Bars.
    let bar_width = (scales.band.band_width() - 2.0 * BAR_INSET).max(1.0);
    for (row, record) in dataset.records().iter().enumerate() {
        let category = record.get(category_col).unwrap_or("");
        let value = numeric_value(&selectors.value, row + 1, record.get(value_col).unwrap_or(""))?;
        // The band domain was built from this same dataset.
        let band_start = scales.band.position(category).unwrap();

        let accent = match flag_col {
            Some(col) => record.get(col) == Some(config.flag_value.as_str()),
            None => true,
        };

        commands.push(DrawCommand::Rect {
            x0: band_start + BAR_INSET,
            y0: scales.value.to_pixel(value),
            x1: band_start + BAR_INSET + bar_width,
            y1: viewport.height,
            accent,
        });
    }

    // Bottom axis: baseline, one tick per category at the band center.
    commands.push(DrawCommand::Line {
        from: (viewport.margin_left, viewport.height),
        to: (viewport.width, viewport.height),
        width: 1,
    });
    for category in scales.band.categories() {
        let center = scales.band.position(category).unwrap() + scales.band.band_width() / 2.0;
        commands.push(DrawCommand::Line {
            from: (center, viewport.height),
            to: (center, viewport.height + TICK_SIZE),
            width: 1,
        });
        commands.push(DrawCommand::Label {
            x: center,
            y: viewport.height + TICK_SIZE + TICK_LABEL_GAP,
            text: category.clone(),
            h: HAlign::Center,
            v: VAlign::Top,
            rotated: false,
            size: 13,
        });
    }

    // Left axis: line plus the linear scale's nice ticks.
    commands.push(DrawCommand::Line {
        from: (viewport.margin_left, viewport.margin_top),
        to: (viewport.margin_left, viewport.height),
        width: 1,
    });
    for tick in scales.value.ticks() {
        let y = scales.value.to_pixel(tick);
        commands.push(DrawCommand::Line {
            from: (viewport.margin_left - TICK_SIZE, y),
            to: (viewport.margin_left, y),
            width: 1,
        });
        commands.push(DrawCommand::Label {
            x: viewport.margin_left - TICK_SIZE - TICK_LABEL_GAP,
            y,
            text: format_tick(tick),
            h: HAlign::Right,
            v: VAlign::Middle,
            rotated: false,
            size: 13,
        });
    }

    // Captions.
    commands.push(DrawCommand::Label {
        x: (viewport.width + viewport.margin_left) / 2.0,
        y: viewport.height + viewport.margin_top,
        text: config.x_label.clone(),
        h: HAlign::Center,
        v: VAlign::Middle,
        rotated: false,
        size: 16,
    });
    commands.push(DrawCommand::Label {
        x: 20.0,
        y: (viewport.margin_top + viewport.height) / 2.0,
        text: config.y_label.clone(),
        h: HAlign::Center,
        v: VAlign::Middle,
        rotated: true,
        size: 16,
    });
    if let Some(title) = &config.title {
        commands.push(DrawCommand::Label {
            x: (viewport.width + viewport.margin_left) / 2.0,
            y: viewport.margin_top / 2.0,
            text: title.clone(),
            h: HAlign::Center,
            v: VAlign::Middle,
            rotated: false,
            size: 20,
        });
    }

    // Mean reference line, painted last.
    let mean_y = scales.value.to_pixel(summary.mean);
    commands.push(DrawCommand::DashedLine {
        from: (viewport.margin_left, mean_y),
        to: (viewport.width, mean_y),
        width: 3,
    });

    Ok(Scene {
        width: viewport.canvas_width().round() as u32,
        height: viewport.canvas_height().round() as u32,
        commands,
    })
}

/// Tick text: plain decimal with float noise rounded away. Display only;
/// never fed back into the statistics.
fn format_tick(value: f64) -> String {
    format!("{}", (value * 1e6).round() / 1e6)
}
