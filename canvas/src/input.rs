//! Input model: modifier keys, mouse buttons, keys, and the gesture state machine.
//!
//! `InputState` is the gesture being tracked between pointer-down and
//! pointer-up (or between two-finger touch start and end). It carries the
//! position of the previous event so each move can be turned into an
//! incremental pan or zoom.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Point, Viewport};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether a selection gesture should add to the selection instead of
    /// replacing it (Shift, Ctrl or Cmd).
    #[must_use]
    pub fn combine(self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"ArrowLeft"`, `"+"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn command(&self) -> Option<KeyCommand> {
        KeyCommand::from_key(&self.0)
    }
}

/// What a keyboard shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Pan by one step; the sign gives the direction per axis.
    Pan { dx: i8, dy: i8 },
    ZoomIn,
    ZoomOut,
    ResetView,
    FinishLasso,
    CancelLasso,
    ToggleLasso,
}

impl KeyCommand {
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let cmd = match key {
            "ArrowLeft" => Self::Pan { dx: -1, dy: 0 },
            "ArrowRight" => Self::Pan { dx: 1, dy: 0 },
            "ArrowUp" => Self::Pan { dx: 0, dy: -1 },
            "ArrowDown" => Self::Pan { dx: 0, dy: 1 },
            "+" | "=" => Self::ZoomIn,
            "-" | "_" => Self::ZoomOut,
            "0" => Self::ResetView,
            "Enter" => Self::FinishLasso,
            "Escape" => Self::CancelLasso,
            "l" | "L" => Self::ToggleLasso,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A pointer button is held; moves beyond the drag threshold pan the view.
    Pressed {
        /// Device position of the previous pointer event.
        last: Point,
    },
    /// Two fingers are down.
    Pinching {
        /// Midpoint between the touches at the previous event.
        mid: Point,
        /// Normalized distance between the touches at the previous event.
        spread: f64,
    },
}

/// Distance between two touches, with each axis normalized by the viewport
/// dimension so the zoom ratio does not depend on the canvas aspect.
#[must_use]
pub fn pinch_spread(a: Point, b: Point, viewport: Viewport) -> f64 {
    let w = if viewport.width > 0.0 { viewport.width } else { 1.0 };
    let h = if viewport.height > 0.0 { viewport.height } else { 1.0 };
    ((b.x - a.x) / w).hypot((b.y - a.y) / h)
}

/// Whether a pointer moved from `from` to `to` far enough to count as a drag.
#[must_use]
pub fn exceeds_threshold(from: Point, to: Point, threshold: f64) -> bool {
    (to.x - from.x).abs() > threshold || (to.y - from.y).abs() > threshold
}
