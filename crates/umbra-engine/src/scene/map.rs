use serde::Deserialize;

use crate::coords::Vec2;
use crate::error::MapError;
use crate::geometry::WallPolyline;
use crate::paint::Color;

/// Pre-parsed map: extent, caster polylines and light descriptors.
///
/// JSON keys are camelCase:
///
/// ```json
/// {
///   "mapExtent": { "x": 100, "y": 100 },
///   "wallPolylines": [[{ "x": 50, "y": 20 }, { "x": 50, "y": 80 }]],
///   "lights": [{ "position": { "x": 20, "y": 50 }, "range": 100,
///                "intensity": 1, "color": "ffffff", "castsShadow": true }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAsset {
    pub map_extent: Vec2,
    #[serde(default)]
    pub wall_polylines: Vec<WallPolyline>,
    #[serde(default)]
    pub lights: Vec<LightDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightDescriptor {
    pub position: Vec2,
    pub range: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Six hex digits, optional leading `#`.
    pub color: String,
    #[serde(default = "default_casts_shadow", alias = "shadows")]
    pub casts_shadow: bool,
    /// Degrees; absent means omnidirectional.
    #[serde(default, alias = "angle")]
    pub cone_angle: Option<f32>,
    /// Degrees, clockwise from +x.
    #[serde(default, alias = "rotation")]
    pub cone_rotation: Option<f32>,
    /// 0 is steady, 1 dips to black at the bottom of each flicker.
    #[serde(default)]
    pub flicker: f32,
}

fn default_intensity() -> f32 {
    1.0
}

fn default_casts_shadow() -> bool {
    true
}

impl MapAsset {
    /// Parses and validates a JSON map.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let asset: MapAsset = serde_json::from_str(json)?;
        asset.validate()?;
        log::debug!(
            "map parsed: {} x {}, {} polyline(s), {} light(s)",
            asset.map_extent.x,
            asset.map_extent.y,
            asset.wall_polylines.len(),
            asset.lights.len()
        );
        Ok(asset)
    }

    /// Checks every invariant the engine relies on.
    ///
    /// Polylines shorter than two points are allowed; they produce no geometry.
    pub fn validate(&self) -> Result<(), MapError> {
        let extent = self.map_extent;
        if !extent.is_finite() || extent.x <= 0.0 || extent.y <= 0.0 {
            return Err(MapError::InvalidExtent {
                width: extent.x,
                height: extent.y,
            });
        }

        for (polyline, points) in self.wall_polylines.iter().enumerate() {
            if let Some(index) = points.iter().position(|p| !p.is_finite()) {
                return Err(MapError::NonFinitePoint { polyline, index });
            }
        }

        for (index, light) in self.lights.iter().enumerate() {
            light.validate(index)?;
        }
        Ok(())
    }
}

impl LightDescriptor {
    fn validate(&self, index: usize) -> Result<(), MapError> {
        let invalid = |reason: &str| MapError::InvalidLight {
            index,
            reason: reason.to_string(),
        };

        if !self.position.is_finite() {
            return Err(invalid("position is not finite"));
        }
        if !self.range.is_finite() || self.range <= 0.0 {
            return Err(invalid("range must be finite and positive"));
        }
        if !self.intensity.is_finite() || self.intensity < 0.0 {
            return Err(invalid("intensity must be finite and non-negative"));
        }
        if !(0.0..=1.0).contains(&self.flicker) {
            return Err(invalid("flicker must be within 0..=1"));
        }
        if self.cone_angle.is_some_and(|a| !a.is_finite())
            || self.cone_rotation.is_some_and(|r| !r.is_finite())
        {
            return Err(invalid("cone angles must be finite"));
        }

        self.parse_color(index)?;
        Ok(())
    }

    pub(crate) fn parse_color(&self, index: usize) -> Result<Color, MapError> {
        Color::from_hex(&self.color).map_err(|source| MapError::LightColor { index, source })
    }
}
