//! Point-cloud rendering and selection engine for contig scatter plots.
//!
//! This crate is compiled to WebAssembly for the browser and natively for the
//! render worker and the headless driver. It owns the interactive core of the
//! plot: translating raw DOM input events into view and selection changes,
//! maintaining the pan/zoom transform, hit-testing markers, lasso selection,
//! and the batched renderer. The host JavaScript layer only wires DOM events
//! to the engine and reacts to the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`series`] | Point columns and the masked / picked / highlight masks |
//! | [`camera`] | Viewport transform, axis normalization, pan and zoom |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Picking the marker under a click |
//! | [`polygon`] | Point-in-polygon ray casting |
//! | [`lasso`] | Polygon lasso state machine |
//! | [`render`] | Style-batched marker, halo and shadow painting |
//! | [`grid`] | Nice-number axis ticks and the grid overlay |
//! | [`surface`] | The `Surface` drawing trait, the browser backend and the recording `Picture` |
//! | [`config`] | Runtime-tunable thresholds, chunk sizes and theme colors |
//! | [`consts`] | Default values for [`config::RenderConfig`] |

pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod grid;
pub mod hit;
pub mod input;
pub mod lasso;
pub mod polygon;
pub mod render;
pub mod series;
pub mod surface;
