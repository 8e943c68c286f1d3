//! Built-in WGSL programs, one per pass role.

use super::pass::PassKind;
use super::program::ShaderSource;

/// Program drawn by `kind`'s default package.
pub fn source(kind: PassKind) -> ShaderSource<'static> {
    match kind {
        PassKind::Background => ShaderSource {
            label: "background",
            vertex: include_str!("background.vert.wgsl"),
            fragment: include_str!("background.frag.wgsl"),
        },
        PassKind::WallBody => ShaderSource {
            label: "wall outline",
            vertex: include_str!("wall_body.vert.wgsl"),
            fragment: include_str!("wall_body.frag.wgsl"),
        },
        PassKind::WallStencil => ShaderSource {
            label: "wall stencil",
            vertex: include_str!("wall_stencil.vert.wgsl"),
            fragment: include_str!("wall_stencil.frag.wgsl"),
        },
        PassKind::Light => ShaderSource {
            label: "light",
            vertex: include_str!("light.vert.wgsl"),
            fragment: include_str!("light.frag.wgsl"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::program::reflect_program;

    #[test]
    fn every_builtin_program_links() {
        for kind in PassKind::ALL {
            if let Err(e) = reflect_program(&source(kind)) {
                panic!("{kind:?} program failed: {e}");
            }
        }
    }

    #[test]
    fn builtin_programs_declare_their_pass_uniforms() {
        for kind in PassKind::ALL {
            let layout = reflect_program(&source(kind)).unwrap();
            for id in kind.uniforms() {
                let decl = layout
                    .uniforms
                    .iter()
                    .find(|d| d.name == id.name())
                    .unwrap_or_else(|| panic!("{kind:?} lacks `{}`", id.name()));
                assert_eq!(decl.ty, id.ty(), "{kind:?} `{}`", id.name());
            }
        }
    }

    #[test]
    fn only_the_stencil_program_reads_normals() {
        for kind in PassKind::ALL {
            let attrs = reflect_program(&source(kind)).unwrap().bind_attributes();
            assert_eq!(attrs.position, Some(0), "{kind:?}");
            assert_eq!(attrs.normal.is_some(), kind == PassKind::WallStencil, "{kind:?}");
        }
    }

    #[test]
    fn light_block_matches_host_layout() {
        let layout = reflect_program(&source(PassKind::Light)).unwrap();
        let offset = |name: &str| layout.uniforms.iter().find(|d| d.name == name).map(|d| d.offset);
        assert_eq!(offset("extent"), Some(0));
        assert_eq!(offset("light_position"), Some(8));
        assert_eq!(offset("light_color"), Some(16));
        assert_eq!(offset("intensity"), Some(28));
        assert_eq!(offset("flicker"), Some(48));
        assert_eq!(layout.uniform_block_size, 64);
    }
}
