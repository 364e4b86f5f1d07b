//! Painting a [`PageLayout`] into PDF bytes with printpdf.
//!
//! Layout coordinates are top-down points; printpdf wants bottom-up
//! millimetres. Every helper here takes layout coordinates and flips them.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::io::{BufWriter, Cursor};

use ::image::imageops::FilterType;
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::font_metrics::{self, Weight};
use crate::layout::{Align, DrawOp, PageLayout, TextRun};
use crate::photo::Photo;
use crate::theme::Color;

// ============================================================================
// CONSTANTS
// ============================================================================

const PT_TO_MM: f32 = 0.352_777_78;

/// Segments used to approximate a full circle.
const CIRCLE_SEGMENTS: usize = 48;
/// Segments per rounded corner.
const CORNER_SEGMENTS: usize = 8;

/// Longest side, in pixels, a photo is embedded at.
const MAX_PHOTO_PX: u32 = 512;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Paints `layout` onto a single page and returns the encoded document.
pub fn paint(layout: &PageLayout, title: &str) -> Result<Vec<u8>> {
    let (doc, page1, layer1) = PdfDocument::new(
        title,
        Mm(layout.width * PT_TO_MM),
        Mm(layout.height * PT_TO_MM),
        "Layer 1",
    );

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Render(format!("font registration failed: {}", e)))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Render(format!("font registration failed: {}", e)))?,
    };

    let page = Page {
        layer: doc.get_page(page1).get_layer(layer1),
        height: layout.height,
    };

    for placed in &layout.ops {
        page.draw(&placed.op, &fonts);
    }
    debug!(ops = layout.ops.len(), "painted page");

    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut writer = BufWriter::new(cursor);
        doc.save(&mut writer)
            .map_err(|e| RenderError::Render(format!("PDF encoding failed: {}", e)))?;
    }

    Ok(buf)
}

// ============================================================================
// FONTS
// ============================================================================

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }
}

// ============================================================================
// DRAWING
// ============================================================================

struct Page {
    layer: PdfLayerReference,
    height: f32,
}

impl Page {
    /// Converts a top-down layout point to a PDF point.
    fn point(&self, x: f32, y: f32) -> (Point, bool) {
        (Point::new(Mm(x * PT_TO_MM), Mm((self.height - y) * PT_TO_MM)), false)
    }

    fn draw(&self, op: &DrawOp, fonts: &Fonts) {
        match op {
            DrawOp::FillRect { x, y, w, h, color } => {
                set_fill_color(&self.layer, color);
                self.rect(*x, *y, *w, *h, PaintMode::Fill);
            }
            DrawOp::StrokeRect { x, y, w, h, color, line_width } => {
                set_stroke_color(&self.layer, color);
                self.layer.set_outline_thickness(*line_width);
                self.rect(*x, *y, *w, *h, PaintMode::Stroke);
            }
            DrawOp::FillRoundedRect { x, y, w, h, radius, color } => {
                set_fill_color(&self.layer, color);
                self.rounded_rect(*x, *y, *w, *h, *radius);
            }
            DrawOp::FillCircle { cx, cy, r, color } => {
                set_fill_color(&self.layer, color);
                self.circle(*cx, *cy, *r, PaintMode::Fill);
            }
            DrawOp::StrokeCircle { cx, cy, r, color, line_width } => {
                set_stroke_color(&self.layer, color);
                self.layer.set_outline_thickness(*line_width);
                self.circle(*cx, *cy, *r, PaintMode::Stroke);
            }
            DrawOp::Line { x1, y1, x2, y2, color, line_width } => {
                set_stroke_color(&self.layer, color);
                self.layer.set_outline_thickness(*line_width);
                self.line(*x1, *y1, *x2, *y2);
            }
            DrawOp::Text(run) => self.text(run, fonts),
            DrawOp::Photo { x, y, size, photo } => self.photo(photo, *x, *y, *size),
        }
    }

    fn line(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let points = vec![self.point(x1, y1), self.point(x2, y2)];
        self.layer.add_line(Line { points, is_closed: false });
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32, mode: PaintMode) {
        let points = vec![
            self.point(x, y + h),
            self.point(x + w, y + h),
            self.point(x + w, y),
            self.point(x, y),
        ];
        self.polygon(points, mode);
    }

    /// Rounded rectangle, each quarter circle approximated with line segments.
    fn rounded_rect(&self, x: f32, y: f32, w: f32, h: f32, radius: f32) {
        // Clamp radius to half the smallest dimension
        let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        let pi = std::f32::consts::PI;

        let mut points = Vec::with_capacity(4 * (CORNER_SEGMENTS + 1));
        // Corner centres with their start angle, walking clockwise on screen
        // from the top-left. Angles are measured in the top-down frame.
        let corners = [
            (x + r, y + r, pi),
            (x + w - r, y + r, 1.5 * pi),
            (x + w - r, y + h - r, 0.0),
            (x + r, y + h - r, 0.5 * pi),
        ];
        for (cx, cy, start) in corners {
            for i in 0..=CORNER_SEGMENTS {
                let angle = start + (i as f32 / CORNER_SEGMENTS as f32) * (pi / 2.0);
                points.push(self.point(cx + r * angle.cos(), cy + r * angle.sin()));
            }
        }

        self.polygon(points, PaintMode::Fill);
    }

    fn circle(&self, cx: f32, cy: f32, r: f32, mode: PaintMode) {
        let points = self.circle_points(cx, cy, r);
        self.polygon(points, mode);
    }

    fn circle_points(&self, cx: f32, cy: f32, r: f32) -> Vec<(Point, bool)> {
        (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let angle = 2.0 * std::f32::consts::PI * i as f32 / CIRCLE_SEGMENTS as f32;
                self.point(cx + r * angle.cos(), cy + r * angle.sin())
            })
            .collect()
    }

    fn polygon(&self, points: Vec<(Point, bool)>, mode: PaintMode) {
        self.layer.add_polygon(Polygon {
            rings: vec![points],
            mode,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn text(&self, run: &TextRun, fonts: &Fonts) {
        let font = fonts.get(run.weight);
        let metrics = font_metrics::get_metrics(run.weight);
        let line_height = metrics.line_height(run.size, font_metrics::LINE_HEIGHT);

        set_fill_color(&self.layer, &run.color);

        // PDF text is drawn from the baseline, not the top.
        let baseline_offset = metrics.ascent(run.size);

        for (i, line) in run.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let top = run.y + baseline_offset + i as f32 * line_height;
            let x = match run.align {
                Align::Left => run.x,
                Align::Center => run.x + (run.width - metrics.string_width(line, run.size)) / 2.0,
                Align::Right => run.x + run.width - metrics.string_width(line, run.size),
            };

            self.layer.use_text(
                line.as_str(),
                run.size,
                Mm(x * PT_TO_MM),
                Mm((self.height - top) * PT_TO_MM),
                font,
            );
        }
    }

    /// Draws the photo cover-cropped to a square and clipped to a circle.
    fn photo(&self, photo: &Photo, x: f32, y: f32, size: f32) {
        let img = cover_square(photo);
        let side = img.width();
        if side == 0 {
            return;
        }

        let rgb_image = img.to_rgb8();
        let image = printpdf::Image::from(printpdf::ImageXObject {
            width: Px(side as usize),
            height: Px(side as usize),
            color_space: printpdf::ColorSpace::Rgb,
            bits_per_component: printpdf::ColorBits::Bit8,
            interpolate: true,
            image_data: rgb_image.into_raw(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        let radius = size / 2.0;
        self.layer.save_graphics_state();
        self.polygon(self.circle_points(x + radius, y + radius, radius), PaintMode::Clip);

        // At 72 DPI one pixel is one point; scale up to the requested size.
        let scale = size / side as f32;
        image.add_to_layer(
            self.layer.clone(),
            printpdf::ImageTransform {
                translate_x: Some(Mm(x * PT_TO_MM)),
                translate_y: Some(Mm((self.height - y - size) * PT_TO_MM)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
        self.layer.restore_graphics_state();
    }
}

/// Centre crop to a square, then shrink to at most [`MAX_PHOTO_PX`].
fn cover_square(photo: &Photo) -> ::image::DynamicImage {
    let (w, h) = (photo.width(), photo.height());
    let side = w.min(h);
    let cropped = photo.image.crop_imm((w - side) / 2, (h - side) / 2, side, side);
    if side > MAX_PHOTO_PX {
        cropped.resize_exact(MAX_PHOTO_PX, MAX_PHOTO_PX, FilterType::Triangle)
    } else {
        cropped
    }
}

fn set_fill_color(layer: &PdfLayerReference, color: &Color) {
    layer.set_fill_color(printpdf::Color::Rgb(Rgb::new(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        None,
    )));
}

fn set_stroke_color(layer: &PdfLayerReference, color: &Color) {
    layer.set_outline_color(printpdf::Color::Rgb(Rgb::new(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        None,
    )));
}
