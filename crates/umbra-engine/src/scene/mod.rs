//! Scene data: the map asset and the session's light list.

mod lights;
mod map;

pub use lights::{ConeInput, ControlledLightConfig, Light, LightRig, OMNI_CONE, TOGGLE_THRESHOLD};
pub use map::{LightDescriptor, MapAsset};
