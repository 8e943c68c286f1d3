//! Time subsystem.
//!
//! Frame timing and frame-rate estimation without coupling to the runtime:
//! - one `FrameClock` per render loop, `tick()` once per presented frame
//! - one `FpsCounter` per engine, reported through a `StatsSink`

mod fps;
mod frame_clock;

pub use fps::{FpsCounter, NoStats, StatsSink};
pub use frame_clock::{FrameClock, FrameTime};
