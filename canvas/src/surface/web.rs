//! [`Surface`] for the browser's 2D context.
//!
//! The context is expected to already carry the device-pixel-ratio
//! transform; coordinates here are CSS pixels.

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::Surface;

impl Surface for CanvasRenderingContext2d {
    type Error = JsValue;

    fn clear(&mut self, width: f64, height: f64) {
        self.clear_rect(0.0, 0.0, width, height);
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        CanvasRenderingContext2d::rect(self, x, y, w, h);
    }

    fn circle(&mut self, x: f64, y: f64, r: f64) -> Result<(), JsValue> {
        // Start each circle on its own subpath so no connecting line is drawn.
        CanvasRenderingContext2d::move_to(self, x + r, y);
        self.arc(x, y, r, 0.0, TAU)
    }

    fn fill(&mut self, style: &str) {
        self.set_fill_style_str(style);
        CanvasRenderingContext2d::fill(self);
    }

    fn fill_with_shadow(&mut self, style: &str, shadow: &str, blur: f64) {
        self.save();
        self.set_shadow_color(shadow);
        self.set_shadow_blur(blur);
        self.set_fill_style_str(style);
        CanvasRenderingContext2d::fill(self);
        self.restore();
    }

    fn stroke(&mut self, style: &str, width: f64) {
        self.set_stroke_style_str(style);
        self.set_line_width(width);
        CanvasRenderingContext2d::stroke(self);
    }

    fn set_line_dash(&mut self, segments: &[f64]) -> Result<(), JsValue> {
        let list = segments.iter().copied().map(JsValue::from_f64).collect::<js_sys::Array>();
        CanvasRenderingContext2d::set_line_dash(self, &list)
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &str, font: &str) -> Result<(), JsValue> {
        self.set_fill_style_str(style);
        self.set_font(font);
        CanvasRenderingContext2d::fill_text(self, text, x, y)
    }
}
