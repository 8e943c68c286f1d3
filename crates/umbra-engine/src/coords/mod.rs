//! Coordinate types shared by the scene, geometry and render layers.
//!
//! Map space:
//! - map units, origin top-left
//! - +X right, +Y down
//!
//! Shaders convert map units to NDC using the map extent uniform.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
