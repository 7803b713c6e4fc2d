//! Drawing surfaces.
//!
//! The renderer only ever talks to a [`Surface`]. In the browser that is a
//! `CanvasRenderingContext2d`; in the render worker and in tests it is a
//! [`Picture`], which records the calls so they can be shipped to the main
//! side and replayed onto a real canvas.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

mod web;

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

/// The subset of the Canvas2D path API the renderer needs.
///
/// Path construction is infallible. Calls that can fail in the browser
/// return `Self::Error`.
pub trait Surface {
    type Error;

    /// Erase the full `width` x `height` area.
    fn clear(&mut self, width: f64, height: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);

    /// Add a full circle as a new closed subpath.
    ///
    /// # Errors
    ///
    /// Fails when the backend rejects the arc (e.g. a negative radius).
    fn circle(&mut self, x: f64, y: f64, r: f64) -> Result<(), Self::Error>;

    /// Fill the current path.
    fn fill(&mut self, style: &str);

    /// Fill the current path with a blurred shadow around it.
    fn fill_with_shadow(&mut self, style: &str, shadow: &str, blur: f64);

    /// Stroke the current path.
    fn stroke(&mut self, style: &str, width: f64);

    /// Set the dash pattern for later strokes; an empty slice means solid.
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot build the dash list.
    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), Self::Error>;

    /// Draw a text label with its baseline-left corner at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Fails when the backend rejects the text call.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &str, font: &str) -> Result<(), Self::Error>;
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PaintOp {
    Clear { width: f64, height: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    ClosePath,
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Circle { x: f64, y: f64, r: f64 },
    Fill { style: String },
    FillWithShadow { style: String, shadow: String, blur: f64 },
    Stroke { style: String, width: f64 },
    SetLineDash { segments: Vec<f64> },
    FillText { text: String, x: f64, y: f64, style: String, font: String },
}

/// A recording surface.
///
/// `clear` discards everything recorded before it, so a picture always
/// describes a complete layer starting from a blank canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    ops: Vec<PaintOp>,
}

impl Picture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of fill calls, shadowed or not.
    #[must_use]
    pub fn fill_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Fill { .. } | PaintOp::FillWithShadow { .. }))
            .count()
    }

    /// Number of subpath primitives (circles and rects).
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Circle { .. } | PaintOp::Rect { .. }))
            .count()
    }

    /// Play every recorded call onto `target`, in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error reported by `target`.
    pub fn replay<S: Surface>(&self, target: &mut S) -> Result<(), S::Error> {
        for op in &self.ops {
            match op {
                PaintOp::Clear { width, height } => target.clear(*width, *height),
                PaintOp::BeginPath => target.begin_path(),
                PaintOp::MoveTo { x, y } => target.move_to(*x, *y),
                PaintOp::LineTo { x, y } => target.line_to(*x, *y),
                PaintOp::ClosePath => target.close_path(),
                PaintOp::Rect { x, y, w, h } => target.rect(*x, *y, *w, *h),
                PaintOp::Circle { x, y, r } => target.circle(*x, *y, *r)?,
                PaintOp::Fill { style } => target.fill(style),
                PaintOp::FillWithShadow { style, shadow, blur } => target.fill_with_shadow(style, shadow, *blur),
                PaintOp::Stroke { style, width } => target.stroke(style, *width),
                PaintOp::SetLineDash { segments } => target.set_line_dash(segments)?,
                PaintOp::FillText { text, x, y, style, font } => target.fill_text(text, *x, *y, style, font)?,
            }
        }
        Ok(())
    }
}

impl Surface for Picture {
    type Error = Infallible;

    fn clear(&mut self, width: f64, height: f64) {
        self.ops.clear();
        self.ops.push(PaintOp::Clear { width, height });
    }

    fn begin_path(&mut self) {
        self.ops.push(PaintOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(PaintOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(PaintOp::LineTo { x, y });
    }

    fn close_path(&mut self) {
        self.ops.push(PaintOp::ClosePath);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(PaintOp::Rect { x, y, w, h });
    }

    fn circle(&mut self, x: f64, y: f64, r: f64) -> Result<(), Infallible> {
        self.ops.push(PaintOp::Circle { x, y, r });
        Ok(())
    }

    fn fill(&mut self, style: &str) {
        self.ops.push(PaintOp::Fill { style: style.to_owned() });
    }

    fn fill_with_shadow(&mut self, style: &str, shadow: &str, blur: f64) {
        self.ops.push(PaintOp::FillWithShadow { style: style.to_owned(), shadow: shadow.to_owned(), blur });
    }

    fn stroke(&mut self, style: &str, width: f64) {
        self.ops.push(PaintOp::Stroke { style: style.to_owned(), width });
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), Infallible> {
        self.ops.push(PaintOp::SetLineDash { segments: segments.to_vec() });
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &str, font: &str) -> Result<(), Infallible> {
        self.ops.push(PaintOp::FillText {
            text: text.to_owned(),
            x,
            y,
            style: style.to_owned(),
            font: font.to_owned(),
        });
        Ok(())
    }
}
