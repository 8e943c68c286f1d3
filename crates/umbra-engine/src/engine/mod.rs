//! Frame orchestration.
//!
//! Per tick: rebuild casters, clear the accumulation target to the ambient
//! color, draw stencil + light for every enabled light, then composite onto
//! the host's output.

mod background;
mod composite;
mod config;
mod orchestrator;
mod packages;

pub use background::BackgroundSource;
pub use config::{AmbientMode, EngineConfig};
pub use orchestrator::{Engine, EngineState, FrameStatus};
