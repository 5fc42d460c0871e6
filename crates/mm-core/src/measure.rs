//! Text measurement collaborator.
//!
//! Mutation operations call a [`TextMeasure`] whenever a topic's text or a
//! geometry-affecting style field changes. Implementations must be pure: the
//! same text and style always give the same size.

use crate::model::{NodeStyle, Shape};
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Maps text plus effective style to a box size.
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &NodeStyle) -> Size;
}

/// Always returns the same size. Handy for tests and headless hosts.
#[derive(Debug, Clone, Copy)]
pub struct FixedMeasure(pub Size);

impl FixedMeasure {
    pub fn new(width: f32, height: f32) -> Self {
        Self(Size { width, height })
    }
}

impl Default for FixedMeasure {
    fn default() -> Self {
        Self::new(100.0, 40.0)
    }
}

impl TextMeasure for FixedMeasure {
    fn measure(&self, _text: &str, _style: &NodeStyle) -> Size {
        self.0
    }
}

/// Horizontal/vertical padding per side, plus a width multiplier for shapes
/// that narrow toward their ends.
struct ShapeMetrics {
    pad_h: f32,
    pad_v: f32,
    width_ratio: f32,
}

fn shape_metrics(shape: Shape) -> ShapeMetrics {
    let (pad_h, pad_v, width_ratio) = match shape {
        Shape::Rectangle => (15.0, 10.0, 1.0),
        Shape::Rounded => (20.0, 10.0, 1.0),
        Shape::Ellipse => (25.0, 15.0, 1.5),
        Shape::Diamond => (30.0, 20.0, 2.0),
        Shape::Cloud => (25.0, 15.0, 1.3),
        Shape::Hexagon => (25.0, 10.0, 1.3),
        Shape::Capsule => (25.0, 12.0, 1.0),
        Shape::Underline => (5.0, 5.0, 1.0),
    };
    ShapeMetrics {
        pad_h,
        pad_v,
        width_ratio,
    }
}

/// Deterministic estimate of rendered text size without a font rasterizer.
///
/// Each narrow glyph counts as `advance` × font size; wide glyphs (CJK,
/// emoji) count double.
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMeasure {
    pub default_font_size: f32,
    pub advance: f32,
    pub line_height: f32,
}

impl Default for EstimatedMeasure {
    fn default() -> Self {
        Self {
            default_font_size: 14.0,
            advance: 0.55,
            line_height: 1.4,
        }
    }
}

impl EstimatedMeasure {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let columns: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
        columns as f32 * font_size * self.advance
    }
}

impl TextMeasure for EstimatedMeasure {
    fn measure(&self, text: &str, style: &NodeStyle) -> Size {
        let font_size = style.font_size.unwrap_or(self.default_font_size);
        let metrics = shape_metrics(style.shape.unwrap_or(Shape::Rounded));

        let mut width = self.text_width(text, font_size) + metrics.pad_h * 2.0;
        let height = font_size * self.line_height + metrics.pad_v * 2.0;
        width *= metrics.width_ratio;

        let large = style.font_size.is_some_and(|s| s > 20.0);
        let (min_w, min_h) = if large { (120.0, 50.0) } else { (60.0, 30.0) };

        Size {
            width: width.max(min_w),
            height: height.max(min_h),
        }
    }
}
