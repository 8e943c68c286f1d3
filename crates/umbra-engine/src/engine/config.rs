use std::time::Duration;

use crate::paint::Color;
use crate::scene::ControlledLightConfig;

/// Global lighting baseline the accumulation target is cleared to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AmbientMode {
    /// "Lights off": the dim ambient color.
    #[default]
    Dark,
    /// Everything fully lit.
    Lit,
}

/// Engine tuning. Every field has a working default.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Caster thickness in map units.
    pub wall_thickness: f32,

    pub ambient_dark: Color,
    pub ambient_lit: Color,
    pub ambient_mode: AmbientMode,

    pub controlled_light: ControlledLightConfig,

    /// Minimum window over which FPS is averaged.
    pub fps_window: Duration,

    /// Shadow extrusion length as a multiple of `extent.x + extent.y`.
    /// Anything above 1 pushes silhouettes past the map edge.
    pub extrude_factor: f32,

    /// Color of the wall outline debug pass.
    pub outline_color: Color,
    /// Whether the wall outline pass starts active.
    pub show_outline: bool,

    /// Skip caster rebuilds while the wall set is unchanged. Output is identical.
    pub cache_static_casters: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wall_thickness: 2.0,
            ambient_dark: Color::rgb(0.1, 0.1, 0.1),
            ambient_lit: Color::white(),
            ambient_mode: AmbientMode::Dark,
            controlled_light: ControlledLightConfig::default(),
            fps_window: Duration::from_secs(1),
            extrude_factor: 4.0,
            outline_color: Color::new(1.0, 0.2, 0.2, 0.8),
            show_outline: false,
            cache_static_casters: false,
        }
    }
}

impl EngineConfig {
    pub fn ambient(&self, mode: AmbientMode) -> Color {
        match mode {
            AmbientMode::Dark => self.ambient_dark,
            AmbientMode::Lit => self.ambient_lit,
        }
    }
}
