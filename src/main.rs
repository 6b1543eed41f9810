use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use viewbar::dataset::{parse_column_selector, Dataset, FieldSelectors};
use viewbar::hover::{hit_test, tooltip_text, PointerEvent};
use viewbar::render::render_scene;
use viewbar::scale::{build_scales, Viewport};
use viewbar::scene::{compile_scene, ChartConfig};
use viewbar::summary::compute_summary_with_step;

#[derive(Parser, Debug)]
#[command(name = "viewbar")]
#[command(about = "Generate bar charts with a mean reference line from CSV data", long_about = None)]
struct Args {
    #[arg(help = "Input CSV file (reads stdin when omitted)")]
    input: Option<PathBuf>,

    #[arg(
        short = 'x',
        long = "category-column",
        default_value = "year",
        help = "Category axis column (name or 0-based index)"
    )]
    category_column: String,

    #[arg(
        short = 'y',
        long = "value-column",
        default_value = "avg_views",
        help = "Value axis column (name or 0-based index)"
    )]
    value_column: String,

    #[arg(long = "width", default_value = "960", help = "Canvas width in pixels")]
    width: u32,

    #[arg(long = "height", default_value = "500", help = "Canvas height in pixels")]
    height: u32,

    #[arg(long = "margin-top", default_value = "50")]
    margin_top: f64,

    #[arg(long = "margin-left", default_value = "70")]
    margin_left: f64,

    #[arg(long = "margin-bottom", default_value = "20")]
    margin_bottom: f64,

    #[arg(long = "margin-right", default_value = "10")]
    margin_right: f64,

    #[arg(short = 't', long = "title", help = "Chart title")]
    title: Option<String>,

    #[arg(long = "x-label", help = "X-axis caption (defaults to the category column name)")]
    x_label: Option<String>,

    #[arg(long = "y-label", help = "Y-axis caption (defaults to the value column name)")]
    y_label: Option<String>,

    #[arg(
        long = "flag-column",
        default_value = "Data",
        help = "Column marking measured rows; non-matching rows are drawn muted"
    )]
    flag_column: String,

    #[arg(long = "flag-value", default_value = "Actual")]
    flag_value: String,

    #[arg(
        long = "grid-step",
        default_value = "0.05",
        help = "Quantization step for the value-axis maximum"
    )]
    grid_step: f64,

    #[arg(
        long = "probe",
        value_name = "X,Y",
        help = "Print the tooltip for a pixel position instead of rendering"
    )]
    probe: Option<String>,

    #[arg(short = 'o', long = "output", help = "Output PNG path (stdout when omitted)")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dataset = match &args.input {
        Some(path) => Dataset::from_path(path)
            .with_context(|| format!("Failed to read CSV from {}", path.display()))?,
        None => Dataset::from_reader(io::stdin()).context("Failed to read CSV from stdin")?,
    };

    let (_, category) = dataset
        .resolve_column(&parse_column_selector(&args.category_column))
        .context("Failed to resolve category column")?;
    let (_, value) = dataset
        .resolve_column(&parse_column_selector(&args.value_column))
        .context("Failed to resolve value column")?;
    let selectors = FieldSelectors { category, value };

    let summary = compute_summary_with_step(&dataset, &selectors.value, args.grid_step)
        .context("Failed to summarize value column")?;

    let viewport = Viewport::from_canvas(
        args.width as f64,
        args.height as f64,
        args.margin_top,
        args.margin_left,
        args.margin_bottom,
        args.margin_right,
    );
    let scales = build_scales(&dataset, &selectors.category, &summary, &viewport)
        .context("Failed to build scales")?;

    if let Some(probe) = &args.probe {
        let event = parse_probe(probe)?;
        match hit_test(&dataset, &selectors, &summary, &scales, &viewport, event)? {
            Some(target) => println!("{}", tooltip_text(&dataset, &selectors, &summary, target)?),
            None => println!("no chart element at ({}, {})", event.x, event.y),
        }
        return Ok(());
    }

    let config = ChartConfig {
        title: args.title,
        x_label: args.x_label.unwrap_or_else(|| selectors.category.clone()),
        y_label: args.y_label.unwrap_or_else(|| selectors.value.clone()),
        flag_column: Some(args.flag_column),
        flag_value: args.flag_value,
    };
    let scene = compile_scene(&dataset, &selectors, &config, &summary, &scales, &viewport)
        .context("Failed to compile chart")?;
    let png_bytes = render_scene(&scene).context("Failed to render chart")?;

    match &args.output {
        Some(path) => fs::write(path, &png_bytes)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&png_bytes)
                .context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn parse_probe(input: &str) -> Result<PointerEvent> {
    let (x, y) = input
        .split_once(',')
        .ok_or_else(|| anyhow!("Probe position must be 'X,Y', got '{input}'"))?;
    Ok(PointerEvent {
        x: x.trim().parse().context("Invalid probe X coordinate")?,
        y: y.trim().parse().context("Invalid probe Y coordinate")?,
    })
}
