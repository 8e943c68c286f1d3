use std::f32::consts::TAU;

use crate::coords::Vec2;
use crate::error::MapError;
use crate::paint::Color;

use super::map::{LightDescriptor, MapAsset};

/// Cone angle (radians) treated as omnidirectional.
pub const OMNI_CONE: f32 = TAU;

/// The controllable light is enabled while the toggle axis is at or above this.
pub const TOGGLE_THRESHOLD: f32 = 0.5;

/// Render-ready light. Angles are radians, color is decoded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub position: Vec2,
    pub range: f32,
    pub intensity: f32,
    pub color: Color,
    pub cone_angle: f32,
    pub cone_rotation: f32,
    pub casts_shadow: bool,
    pub flicker: f32,
    pub enabled: bool,
}

impl Light {
    fn from_descriptor(index: usize, desc: &LightDescriptor) -> Result<Self, MapError> {
        Ok(Self {
            position: desc.position,
            range: desc.range,
            intensity: desc.intensity,
            color: desc.parse_color(index)?,
            cone_angle: desc.cone_angle.map_or(OMNI_CONE, cone_radians),
            cone_rotation: desc.cone_rotation.unwrap_or(0.0).to_radians(),
            casts_shadow: desc.casts_shadow,
            flicker: desc.flicker,
            enabled: true,
        })
    }

    pub fn is_omni(&self) -> bool {
        self.cone_angle >= OMNI_CONE
    }
}

/// Starting state of the light the host steers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlledLightConfig {
    pub range: f32,
    pub intensity: f32,
    pub color: Color,
    pub casts_shadow: bool,
    pub cone_angle_deg: f32,
    pub cone_rotation_deg: f32,
    pub enabled: bool,
}

impl Default for ControlledLightConfig {
    fn default() -> Self {
        Self {
            range: 250.0,
            intensity: 0.9,
            color: Color::rgb(1.0, 0.93, 0.8),
            casts_shadow: true,
            cone_angle_deg: 360.0,
            cone_rotation_deg: 0.0,
            enabled: true,
        }
    }
}

/// Cone update forwarded from the input collaborator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConeInput {
    pub angle_deg: f32,
    pub rotation_deg: f32,
    /// Enables the light at or above [`TOGGLE_THRESHOLD`].
    pub toggle_axis: f32,
}

/// The session's light list: map lights in asset order, then the controllable
/// light. The list never grows or shrinks after construction.
#[derive(Debug, Clone)]
pub struct LightRig {
    lights: Vec<Light>,
    extent: Vec2,
}

impl LightRig {
    /// Decodes every map light and appends the controllable light at map center.
    pub fn from_map(map: &MapAsset, controlled: &ControlledLightConfig) -> Result<Self, MapError> {
        let mut lights = map
            .lights
            .iter()
            .enumerate()
            .map(|(i, desc)| Light::from_descriptor(i, desc))
            .collect::<Result<Vec<_>, _>>()?;

        let extent = map.map_extent;
        lights.push(Light {
            position: extent * 0.5,
            range: controlled.range,
            intensity: controlled.intensity,
            color: controlled.color,
            cone_angle: cone_radians(controlled.cone_angle_deg),
            cone_rotation: controlled.cone_rotation_deg.to_radians(),
            casts_shadow: controlled.casts_shadow,
            flicker: 0.0,
            enabled: controlled.enabled,
        });

        Ok(Self { lights, extent })
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn controlled(&self) -> Option<&Light> {
        self.lights.last()
    }

    /// Moves the controllable light to `(horizontal + extent.x/2, vertical + extent.y/2)`
    /// and applies the cone and toggle.
    ///
    /// Only plain fields change; the next frame picks them up. Non-finite inputs
    /// leave the corresponding field untouched.
    pub fn update_controlled(&mut self, vertical: f32, horizontal: f32, cone: ConeInput) {
        let extent = self.extent;
        let Some(light) = self.lights.last_mut() else { return };

        if vertical.is_finite() && horizontal.is_finite() {
            light.position = Vec2::new(horizontal + extent.x * 0.5, vertical + extent.y * 0.5);
        } else {
            log::warn!("ignoring non-finite controlled light offset ({horizontal}, {vertical})");
        }
        if cone.angle_deg.is_finite() {
            light.cone_angle = cone_radians(cone.angle_deg);
        }
        if cone.rotation_deg.is_finite() {
            light.cone_rotation = cone.rotation_deg.to_radians();
        }
        light.enabled = cone.toggle_axis >= TOGGLE_THRESHOLD;
    }
}

/// Degrees to radians, with anything at or past a full turn mapped to omni.
fn cone_radians(deg: f32) -> f32 {
    if deg >= 360.0 {
        OMNI_CONE
    } else {
        deg.max(0.0).to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(extent: Vec2) -> MapAsset {
        MapAsset {
            map_extent: extent,
            wall_polylines: Vec::new(),
            lights: vec![LightDescriptor {
                position: Vec2::new(1.0, 2.0),
                range: 5.0,
                intensity: 0.5,
                color: "ff0000".to_string(),
                casts_shadow: false,
                cone_angle: Some(90.0),
                cone_rotation: None,
                flicker: 0.0,
            }],
        }
    }

    fn cone(toggle_axis: f32) -> ConeInput {
        ConeInput { angle_deg: 360.0, rotation_deg: 0.0, toggle_axis }
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn map_lights_then_controlled() {
        let rig = LightRig::from_map(&map(Vec2::new(10.0, 20.0)), &ControlledLightConfig::default()).unwrap();
        assert_eq!(rig.len(), 2);

        let first = rig.lights()[0];
        assert_eq!(first.color, Color::rgb(1.0, 0.0, 0.0));
        assert!((first.cone_angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(!first.casts_shadow);

        let controlled = rig.controlled().unwrap();
        assert_eq!(controlled.position, Vec2::new(5.0, 10.0));
        assert!(controlled.is_omni());
    }

    #[test]
    fn bad_color_fails_construction() {
        let mut asset = map(Vec2::new(10.0, 10.0));
        asset.lights[0].color = "12345".to_string();
        let err = LightRig::from_map(&asset, &ControlledLightConfig::default()).unwrap_err();
        assert!(matches!(err, MapError::LightColor { index: 0, .. }));
    }

    // ── controllable light ────────────────────────────────────────────────

    #[test]
    fn placement_is_offset_from_map_center() {
        let mut rig = LightRig::from_map(&map(Vec2::new(10.0, 10.0)), &ControlledLightConfig::default()).unwrap();
        rig.update_controlled(2.0, -3.0, cone(1.0));
        assert_eq!(rig.controlled().unwrap().position, Vec2::new(2.0, 7.0));
    }

    #[test]
    fn only_the_last_light_moves() {
        let mut rig = LightRig::from_map(&map(Vec2::new(10.0, 10.0)), &ControlledLightConfig::default()).unwrap();
        let before = rig.lights()[0];
        rig.update_controlled(4.0, 4.0, cone(1.0));
        assert_eq!(rig.lights()[0], before);
    }

    #[test]
    fn toggle_axis_threshold() {
        let mut rig = LightRig::from_map(&map(Vec2::new(10.0, 10.0)), &ControlledLightConfig::default()).unwrap();
        rig.update_controlled(0.0, 0.0, cone(0.49));
        assert!(!rig.controlled().unwrap().enabled);
        rig.update_controlled(0.0, 0.0, cone(0.5));
        assert!(rig.controlled().unwrap().enabled);
    }

    #[test]
    fn cone_degrees_convert_to_radians() {
        let mut rig = LightRig::from_map(&map(Vec2::new(10.0, 10.0)), &ControlledLightConfig::default()).unwrap();
        rig.update_controlled(0.0, 0.0, ConeInput { angle_deg: 60.0, rotation_deg: 180.0, toggle_axis: 1.0 });
        let light = rig.controlled().unwrap();
        assert!((light.cone_angle - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert!((light.cone_rotation - std::f32::consts::PI).abs() < 1e-6);
        assert!(!light.is_omni());
    }

    #[test]
    fn non_finite_offset_keeps_position() {
        let mut rig = LightRig::from_map(&map(Vec2::new(10.0, 10.0)), &ControlledLightConfig::default()).unwrap();
        rig.update_controlled(1.0, 1.0, cone(1.0));
        rig.update_controlled(f32::NAN, 1.0, cone(1.0));
        assert_eq!(rig.controlled().unwrap().position, Vec2::new(6.0, 6.0));
    }
}
