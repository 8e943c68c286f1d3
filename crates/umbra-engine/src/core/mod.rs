//! Host-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the application driving the engine, and the per-frame context it receives.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
