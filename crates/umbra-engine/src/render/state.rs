//! Explicit per-pass GPU state.
//!
//! Every pipeline bakes its stencil and blend state from these descriptors, so
//! the state in effect for a draw is a function of the pass role alone.

/// Stencil value written where casters rasterize.
pub const CASTER_MARKER: u32 = 1;

/// Format of the stencil attachment paired with the accumulation target.
pub const STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Stencil8;

/// How a pass uses the stencil buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StencilRole {
    /// Stencil ignored.
    None,
    /// Rasterizes caster silhouettes into a freshly cleared stencil.
    Write,
    /// Draws only where the caster marker is absent.
    Read,
}

/// Stencil function, ops and color mask applied before a draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawState {
    pub compare: wgpu::CompareFunction,
    pub fail_op: wgpu::StencilOperation,
    pub depth_fail_op: wgpu::StencilOperation,
    pub pass_op: wgpu::StencilOperation,
    pub color_writes: wgpu::ColorWrites,
    /// Stencil is cleared to zero when the pass begins.
    pub clears_stencil: bool,
}

impl StencilRole {
    pub const fn draw_state(self) -> DrawState {
        use wgpu::{ColorWrites, CompareFunction, StencilOperation as Op};

        match self {
            StencilRole::None => DrawState {
                compare: CompareFunction::Always,
                fail_op: Op::Keep,
                depth_fail_op: Op::Keep,
                pass_op: Op::Keep,
                color_writes: ColorWrites::ALL,
                clears_stencil: false,
            },
            StencilRole::Write => DrawState {
                compare: CompareFunction::Always,
                fail_op: Op::Keep,
                depth_fail_op: Op::Keep,
                pass_op: Op::Replace,
                color_writes: ColorWrites::empty(),
                clears_stencil: true,
            },
            StencilRole::Read => DrawState {
                compare: CompareFunction::NotEqual,
                fail_op: Op::Keep,
                depth_fail_op: Op::Keep,
                pass_op: Op::Keep,
                color_writes: ColorWrites::ALL,
                clears_stencil: false,
            },
        }
    }

    /// Whether draws in this role need `set_stencil_reference(CASTER_MARKER)`.
    #[inline]
    pub const fn uses_reference(self) -> bool {
        !matches!(self, StencilRole::None)
    }
}

impl DrawState {
    pub fn stencil_face(&self) -> wgpu::StencilFaceState {
        wgpu::StencilFaceState {
            compare: self.compare,
            fail_op: self.fail_op,
            depth_fail_op: self.depth_fail_op,
            pass_op: self.pass_op,
        }
    }

    /// Depth-stencil state for a pass with the given attachment format.
    ///
    /// Passes without a stencil attachment get `None`, which behaves like
    /// always-pass/keep.
    pub fn depth_stencil(
        &self,
        attachment: Option<wgpu::TextureFormat>,
    ) -> Option<wgpu::DepthStencilState> {
        let format = attachment?;
        let face = self.stencil_face();
        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0xff,
            },
            bias: wgpu::DepthBiasState::default(),
        })
    }

    /// Stencil load op for a pass whose first draw uses this state.
    pub fn stencil_load(&self) -> wgpu::LoadOp<u32> {
        if self.clears_stencil {
            wgpu::LoadOp::Clear(0)
        } else {
            wgpu::LoadOp::Load
        }
    }
}

/// Color blending for a pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src=ONE, dst=ZERO`.
    Replace,
    /// `src=SRC_ALPHA, dst=ONE`.
    Additive,
    /// Straight alpha over.
    Alpha,
}

impl BlendMode {
    pub fn to_wgpu(self) -> wgpu::BlendState {
        let component = |src_factor, dst_factor| wgpu::BlendComponent {
            src_factor,
            dst_factor,
            operation: wgpu::BlendOperation::Add,
        };

        match self {
            BlendMode::Replace => {
                let c = component(wgpu::BlendFactor::One, wgpu::BlendFactor::Zero);
                wgpu::BlendState { color: c, alpha: c }
            }
            BlendMode::Additive => {
                let c = component(wgpu::BlendFactor::SrcAlpha, wgpu::BlendFactor::One);
                wgpu::BlendState { color: c, alpha: c }
            }
            BlendMode::Alpha => wgpu::BlendState {
                color: component(wgpu::BlendFactor::SrcAlpha, wgpu::BlendFactor::OneMinusSrcAlpha),
                alpha: component(wgpu::BlendFactor::One, wgpu::BlendFactor::OneMinusSrcAlpha),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{ColorWrites, CompareFunction, StencilOperation as Op};

    // ── role table ────────────────────────────────────────────────────────

    #[test]
    fn none_role_always_keeps() {
        let s = StencilRole::None.draw_state();
        assert_eq!(s.compare, CompareFunction::Always);
        assert_eq!((s.fail_op, s.depth_fail_op, s.pass_op), (Op::Keep, Op::Keep, Op::Keep));
        assert_eq!(s.color_writes, ColorWrites::ALL);
        assert!(!s.clears_stencil);
    }

    #[test]
    fn write_role_replaces_without_color() {
        let s = StencilRole::Write.draw_state();
        assert_eq!(s.compare, CompareFunction::Always);
        assert_eq!((s.fail_op, s.depth_fail_op, s.pass_op), (Op::Keep, Op::Keep, Op::Replace));
        assert_eq!(s.color_writes, ColorWrites::empty());
        assert!(s.clears_stencil);
        assert_eq!(s.stencil_load(), wgpu::LoadOp::Clear(0));
    }

    #[test]
    fn read_role_passes_where_marker_absent() {
        let s = StencilRole::Read.draw_state();
        assert_eq!(s.compare, CompareFunction::NotEqual);
        assert_eq!((s.fail_op, s.depth_fail_op, s.pass_op), (Op::Keep, Op::Keep, Op::Keep));
        assert_eq!(s.color_writes, ColorWrites::ALL);
        assert!(!s.clears_stencil);
        assert_eq!(s.stencil_load(), wgpu::LoadOp::Load);
    }

    #[test]
    fn only_stencil_roles_use_reference() {
        assert!(!StencilRole::None.uses_reference());
        assert!(StencilRole::Write.uses_reference());
        assert!(StencilRole::Read.uses_reference());
    }

    // ── wgpu conversion ───────────────────────────────────────────────────

    #[test]
    fn depth_stencil_mirrors_face_on_both_sides() {
        let ds = StencilRole::Read
            .draw_state()
            .depth_stencil(Some(STENCIL_FORMAT))
            .unwrap();
        assert_eq!(ds.format, STENCIL_FORMAT);
        assert_eq!(ds.stencil.front, ds.stencil.back);
        assert_eq!(ds.stencil.front.compare, CompareFunction::NotEqual);
        assert!(!ds.depth_write_enabled);
    }

    #[test]
    fn no_attachment_means_no_depth_stencil() {
        assert!(StencilRole::None.draw_state().depth_stencil(None).is_none());
    }

    // ── blend ─────────────────────────────────────────────────────────────

    #[test]
    fn additive_blend_factors() {
        let b = BlendMode::Additive.to_wgpu();
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(b.color.operation, wgpu::BlendOperation::Add);
    }

    #[test]
    fn replace_blend_is_one_zero() {
        let b = BlendMode::Replace.to_wgpu();
        assert_eq!(b, wgpu::BlendState::REPLACE);
    }
}
