use super::state::{BlendMode, StencilRole};
use super::uniform::UniformType;

/// Closed set of draw passes the engine knows how to drive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Composites the accumulation target over the background image.
    Background,
    /// Debug outline of the wall bodies.
    WallBody,
    /// Caster silhouettes into the stencil buffer, once per light.
    WallStencil,
    /// One light's falloff, once per light.
    Light,
}

/// Where a pass draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassTarget {
    /// The host's output view; no stencil attachment.
    Output,
    /// The offscreen accumulation target with its stencil attachment.
    Accumulation,
}

impl PassKind {
    pub const ALL: [PassKind; 4] = [
        PassKind::Background,
        PassKind::WallBody,
        PassKind::WallStencil,
        PassKind::Light,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PassKind::Background => "background",
            PassKind::WallBody => "wall outline",
            PassKind::WallStencil => "wall stencil",
            PassKind::Light => "light",
        }
    }

    pub const fn stencil_role(self) -> StencilRole {
        match self {
            PassKind::Background | PassKind::WallBody => StencilRole::None,
            PassKind::WallStencil => StencilRole::Write,
            PassKind::Light => StencilRole::Read,
        }
    }

    pub const fn blend(self) -> BlendMode {
        match self {
            PassKind::Background | PassKind::WallStencil => BlendMode::Replace,
            PassKind::WallBody => BlendMode::Alpha,
            PassKind::Light => BlendMode::Additive,
        }
    }

    pub const fn target(self) -> PassTarget {
        match self {
            PassKind::Background | PassKind::WallBody => PassTarget::Output,
            PassKind::WallStencil | PassKind::Light => PassTarget::Accumulation,
        }
    }

    /// Uniforms the engine writes for this pass.
    pub const fn uniforms(self) -> &'static [UniformId] {
        use UniformId::*;
        match self {
            PassKind::Background => &[Extent],
            PassKind::WallBody => &[Extent, OutlineColor],
            PassKind::WallStencil => &[Extent, LightPosition, Extrude],
            PassKind::Light => &[
                Extent,
                LightPosition,
                LightColor,
                Intensity,
                Range,
                ConeAngle,
                ConeRotation,
                Time,
                Flicker,
            ],
        }
    }
}

/// Engine-written uniform, addressed by index instead of by name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UniformId {
    Extent,
    LightPosition,
    LightColor,
    Intensity,
    Range,
    ConeAngle,
    ConeRotation,
    Time,
    Flicker,
    Extrude,
    OutlineColor,
}

impl UniformId {
    pub const COUNT: usize = 11;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Member name in the shader's uniform struct.
    pub const fn name(self) -> &'static str {
        match self {
            UniformId::Extent => "extent",
            UniformId::LightPosition => "light_position",
            UniformId::LightColor => "light_color",
            UniformId::Intensity => "intensity",
            UniformId::Range => "range",
            UniformId::ConeAngle => "cone_angle",
            UniformId::ConeRotation => "cone_rotation",
            UniformId::Time => "time",
            UniformId::Flicker => "flicker",
            UniformId::Extrude => "extrude",
            UniformId::OutlineColor => "outline_color",
        }
    }

    pub const fn ty(self) -> UniformType {
        match self {
            UniformId::Extent | UniformId::LightPosition => UniformType::Vec2,
            UniformId::LightColor => UniformType::Vec3,
            UniformId::OutlineColor => UniformType::Vec4,
            UniformId::Intensity
            | UniformId::Range
            | UniformId::ConeAngle
            | UniformId::ConeRotation
            | UniformId::Time
            | UniformId::Flicker
            | UniformId::Extrude => UniformType::Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_pass() {
        assert_eq!(PassKind::Background.stencil_role(), StencilRole::None);
        assert_eq!(PassKind::WallBody.stencil_role(), StencilRole::None);
        assert_eq!(PassKind::WallStencil.stencil_role(), StencilRole::Write);
        assert_eq!(PassKind::Light.stencil_role(), StencilRole::Read);
    }

    #[test]
    fn stencil_passes_draw_into_accumulation() {
        for kind in PassKind::ALL {
            let expects_stencil = kind.target() == PassTarget::Accumulation;
            assert_eq!(kind.stencil_role() != StencilRole::None, expects_stencil, "{kind:?}");
        }
    }

    #[test]
    fn uniform_indices_are_dense() {
        let all = [
            UniformId::Extent,
            UniformId::LightPosition,
            UniformId::LightColor,
            UniformId::Intensity,
            UniformId::Range,
            UniformId::ConeAngle,
            UniformId::ConeRotation,
            UniformId::Time,
            UniformId::Flicker,
            UniformId::Extrude,
            UniformId::OutlineColor,
        ];
        assert_eq!(all.len(), UniformId::COUNT);
        for (i, id) in all.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn every_pass_receives_extent() {
        for kind in PassKind::ALL {
            assert!(kind.uniforms().contains(&UniformId::Extent));
        }
    }
}
