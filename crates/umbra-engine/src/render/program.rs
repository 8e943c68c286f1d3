use naga::{AddressSpace, Binding, Handle, Module, ResourceBinding, Scalar, ShaderStage, TypeInner, VectorSize};

use crate::error::{CompileError, ProgramStage};

use super::uniform::{UniformDecl, UniformType};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Bind group/binding of the per-pass uniform block.
const UNIFORM_BINDING: ResourceBinding = ResourceBinding { group: 0, binding: 0 };

/// WGSL sources of one program.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Vertex input or inter-stage varying found by reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

/// Resolved vertex attribute locations. `None` means the program does not read it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub position: Option<u32>,
    pub normal: Option<u32>,
}

/// Interface of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLayout {
    pub attributes: Vec<AttributeDecl>,
    pub uniforms: Vec<UniformDecl>,
    /// Size in bytes of the group 0 / binding 0 uniform block, 0 if absent.
    pub uniform_block_size: u32,
}

impl ProgramLayout {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    pub fn bind_attributes(&self) -> AttributeBinding {
        AttributeBinding {
            position: self.attribute_location("position"),
            normal: self.attribute_location("normal"),
        }
    }
}

/// Compiled shader modules plus their reflected interface.
pub struct Program {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    layout: ProgramLayout,
}

impl Program {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_module(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    pub fn fragment_module(&self) -> &wgpu::ShaderModule {
        &self.fragment
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }
}

/// Validates both stages with naga, links them, then creates the wgpu modules.
///
/// Nothing is handed to wgpu unless naga accepted the program, so failures carry
/// naga's diagnostic instead of surfacing later as a device error.
pub fn compile_program(
    device: &wgpu::Device,
    source: &ShaderSource<'_>,
) -> Result<Program, CompileError> {
    let layout = reflect_program(source)?;

    let module = |stage: ProgramStage, wgsl: &str| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("umbra {} {stage} shader", source.label)),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        })
    };

    let vertex = module(ProgramStage::Vertex, source.vertex);
    let fragment = module(ProgramStage::Fragment, source.fragment);

    log::debug!(
        "program `{}` compiled: {} attribute(s), {} uniform(s), {} byte block",
        source.label,
        layout.attributes.len(),
        layout.uniforms.len(),
        layout.uniform_block_size
    );

    Ok(Program {
        label: source.label.to_string(),
        vertex,
        fragment,
        layout,
    })
}

/// Parses, validates and links a program without touching the GPU.
pub fn reflect_program(source: &ShaderSource<'_>) -> Result<ProgramLayout, CompileError> {
    let vertex = parse_and_validate(source.label, ProgramStage::Vertex, source.vertex)?;
    let fragment = parse_and_validate(source.label, ProgramStage::Fragment, source.fragment)?;
    link(source.label, &vertex, &fragment)
}

fn parse_and_validate(label: &str, stage: ProgramStage, wgsl: &str) -> Result<Module, CompileError> {
    let module = naga::front::wgsl::parse_str(wgsl).map_err(|e| CompileError::Parse {
        label: label.to_string(),
        stage,
        log: e.emit_to_string(wgsl),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| CompileError::Validate {
            label: label.to_string(),
            stage,
            log: error_chain(&e),
        })?;

    Ok(module)
}

fn link(label: &str, vertex: &Module, fragment: &Module) -> Result<ProgramLayout, CompileError> {
    let link_err = |log: String| CompileError::Link {
        label: label.to_string(),
        log,
    };

    let vs = entry_point(vertex, ShaderStage::Vertex, VERTEX_ENTRY)
        .ok_or_else(|| link_err(format!("vertex entry point `{VERTEX_ENTRY}` not found")))?;
    let fs = entry_point(fragment, ShaderStage::Fragment, FRAGMENT_ENTRY)
        .ok_or_else(|| link_err(format!("fragment entry point `{FRAGMENT_ENTRY}` not found")))?;

    let mut attributes = Vec::new();
    for arg in &vs.function.arguments {
        collect_locations(vertex, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut attributes);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(vertex, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(fragment, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    for input in &inputs {
        let Some(output) = outputs.iter().find(|o| o.location == input.location) else {
            return Err(link_err(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name, input.location
            )));
        };
        if output.components != input.components {
            return Err(link_err(format!(
                "varying at location {} has {} component(s) in the vertex stage but {} in the fragment stage",
                input.location, output.components, input.components
            )));
        }
    }

    let (uniforms, uniform_block_size) =
        match (uniform_block(vertex).map_err(link_err)?, uniform_block(fragment).map_err(link_err)?) {
            (Some(v), Some(f)) if v != f => {
                return Err(link_err(
                    "uniform block at group 0, binding 0 differs between stages".to_string(),
                ));
            }
            (Some(block), _) | (None, Some(block)) => block,
            (None, None) => (Vec::new(), 0),
        };

    Ok(ProgramLayout {
        attributes,
        uniforms,
        uniform_block_size,
    })
}

fn entry_point<'m>(module: &'m Module, stage: ShaderStage, name: &str) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
}

/// Gathers `@location` bindings from an argument or result, descending into structs.
fn collect_locations(
    module: &Module,
    name: Option<&str>,
    ty: Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<AttributeDecl>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(AttributeDecl {
            name: name.unwrap_or_default().to_string(),
            location: *location,
            components: components(&module.types[ty].inner),
        }),
        Some(_) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn components(inner: &TypeInner) -> u32 {
    match inner {
        TypeInner::Vector { size, .. } => vector_len(*size),
        _ => 1,
    }
}

fn vector_len(size: VectorSize) -> u32 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

fn uniform_type(inner: &TypeInner) -> Option<UniformType> {
    match *inner {
        TypeInner::Scalar(s) if s == Scalar::F32 => Some(UniformType::Float),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
            VectorSize::Bi => UniformType::Vec2,
            VectorSize::Tri => UniformType::Vec3,
            VectorSize::Quad => UniformType::Vec4,
        }),
        _ => None,
    }
}

/// Reflects the group 0 / binding 0 uniform block.
///
/// Struct members whose names start with `_` are padding and are not exposed.
fn uniform_block(module: &Module) -> Result<Option<(Vec<UniformDecl>, u32)>, String> {
    let Some(var) = module
        .global_variables
        .iter()
        .map(|(_, var)| var)
        .find(|var| var.space == AddressSpace::Uniform && var.binding == Some(UNIFORM_BINDING))
    else {
        return Ok(None);
    };

    match &module.types[var.ty].inner {
        TypeInner::Struct { members, span } => {
            let mut decls = Vec::with_capacity(members.len());
            for m in members {
                let name = m.name.clone().unwrap_or_default();
                if name.starts_with('_') {
                    continue;
                }
                let ty = uniform_type(&module.types[m.ty].inner)
                    .ok_or_else(|| format!("uniform member `{name}` is not f32 or vecN<f32>"))?;
                decls.push(UniformDecl {
                    name,
                    ty,
                    offset: m.offset,
                });
            }
            Ok(Some((decls, *span)))
        }
        other => {
            let name = var.name.clone().unwrap_or_default();
            let ty = uniform_type(other)
                .ok_or_else(|| format!("uniform `{name}` is not f32, vecN<f32> or a struct of them"))?;
            Ok(Some((
                vec![UniformDecl { name, ty, offset: 0 }],
                ty.byte_size() as u32,
            )))
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut log = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        log.push_str("\n  caused by: ");
        log.push_str(&cause.to_string());
        source = cause.source();
    }
    log
}
