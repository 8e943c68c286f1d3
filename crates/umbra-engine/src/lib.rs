//! Umbra engine crate.
//!
//! Real-time 2D lighting over a static top-down map. Walls cast per-light
//! shadows through a stencil pass; lights accumulate additively into an
//! offscreen target that is composited over the background image.

pub mod core;
pub mod device;
pub mod engine;
pub mod error;
pub mod time;
pub mod window;

pub mod coords;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;

pub use engine::{AmbientMode, BackgroundSource, Engine, EngineConfig, EngineState, FrameStatus};
pub use error::{CompileError, EngineError, MapError, SetupError};
