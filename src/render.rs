use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

use crate::scene::{DrawCommand, HAlign, Scene, VAlign};

/// Fill for measured bars (steel blue).
const ACCENT: RGBColor = RGBColor(70, 130, 180);
/// Fill for projected bars.
const MUTED: RGBColor = RGBColor(128, 128, 128);

/// Dash pattern of the reference line: 10px on, 3px off.
const DASH_SIZE: i32 = 10;
const DASH_SPACING: i32 = 3;

/// Execute the scene's commands into an RGB buffer and encode it as PNG.
pub fn render_scene(scene: &Scene) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (scene.width * scene.height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
            .into_drawing_area();

        root.fill(&WHITE).context("Failed to fill background")?;

        for command in &scene.commands {
            draw_command(&root, command).context("Failed to draw scene command")?;
        }

        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn draw_command(root: &DrawingArea<BitMapBackend, Shift>, command: &DrawCommand) -> Result<()> {
    match command {
        DrawCommand::Rect {
            x0,
            y0,
            x1,
            y1,
            accent,
        } => {
            let fill = if *accent { ACCENT } else { MUTED };
            root.draw(&Rectangle::new(
                [(px(*x0), px(*y0)), (px(*x1), px(*y1))],
                fill.filled(),
            ))
            .context("Failed to draw bar")?;
        }
        DrawCommand::Line { from, to, width } => {
            root.draw(&PathElement::new(
                vec![(px(from.0), px(from.1)), (px(to.0), px(to.1))],
                BLACK.stroke_width(*width),
            ))
            .context("Failed to draw line")?;
        }
        DrawCommand::DashedLine { from, to, width } => {
            root.draw(&DashedPathElement::new(
                vec![(px(from.0), px(from.1)), (px(to.0), px(to.1))],
                DASH_SIZE,
                DASH_SPACING,
                BLACK.stroke_width(*width),
            ))
            .context("Failed to draw dashed line")?;
        }
        DrawCommand::Label {
            x,
            y,
            text,
            h,
            v,
            rotated,
            size,
        } => {
            let mut style = TextStyle::from(("sans-serif", *size).into_font())
                .color(&BLACK)
                .pos(Pos::new(hpos(*h), vpos(*v)));
            if *rotated {
                style = style.transform(FontTransform::Rotate270);
            }
            root.draw(&Text::new(text.clone(), (px(*x), px(*y)), style))
                .context("Failed to draw label")?;
        }
    }
    Ok(())
}

fn px(coord: f64) -> i32 {
    coord.round() as i32
}

fn hpos(align: HAlign) -> HPos {
    match align {
        HAlign::Left => HPos::Left,
        HAlign::Center => HPos::Center,
        HAlign::Right => HPos::Right,
    }
}

fn vpos(align: VAlign) -> VPos {
    match align {
        VAlign::Top => VPos::Top,
        VAlign::Middle => VPos::Center,
        VAlign::Bottom => VPos::Bottom,
    }
}
