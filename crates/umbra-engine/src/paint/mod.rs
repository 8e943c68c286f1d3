//! Color model for lights, ambient levels and debug overlays.

pub mod color;

pub use color::{Color, ParseColorError};
