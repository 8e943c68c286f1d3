//! GPU rendering subsystem.
//!
//! Passes are described by [`PassKind`]; each drawable is a [`Package`] whose
//! program is validated with naga before wgpu sees it.
//!
//! Convention:
//! - CPU geometry is in map units (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using the `extent` uniform.

mod buffers;
mod package;
mod pass;
mod program;
pub mod readback;
pub mod shaders;
mod state;
mod target;
mod uniform;

pub use buffers::VertexBuffers;
pub use package::{Package, PackageDesc};
pub use pass::{PassKind, PassTarget, UniformId};
pub use program::{
    compile_program, reflect_program, AttributeBinding, AttributeDecl, Program, ProgramLayout,
    ShaderSource, FRAGMENT_ENTRY, VERTEX_ENTRY,
};
pub use state::{BlendMode, DrawState, StencilRole, CASTER_MARKER, STENCIL_FORMAT};
pub use target::{RenderTarget, ACCUMULATION_FORMAT};
pub use uniform::{
    TypeMismatchError, Uniform, UniformBlock, UniformDecl, UniformSlot, UniformType, UniformValue,
};
