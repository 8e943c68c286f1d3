use crate::error::{CompileError, EngineError};
use crate::geometry::Mesh;

use super::buffers::{stream_layout, vec2_attribute, VertexBuffers};
use super::pass::{PassKind, PassTarget, UniformId};
use super::program::{compile_program, AttributeBinding, Program, ShaderSource, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::state::{CASTER_MARKER, STENCIL_FORMAT};
use super::target::ACCUMULATION_FORMAT;
use super::uniform::{TypeMismatchError, UniformBlock, UniformSlot, UniformValue};

/// Everything needed to build a [`Package`].
pub struct PackageDesc<'a> {
    pub name: &'a str,
    pub kind: PassKind,
    pub source: ShaderSource<'a>,
    /// Format of the host's output view, used by passes targeting it.
    pub output_format: wgpu::TextureFormat,
    /// Layout bound at group 1, for passes sampling textures.
    pub extra_layout: Option<&'a wgpu::BindGroupLayout>,
}

/// One drawable unit: a linked program, its vertex streams, its uniform block
/// and the pipeline baked from its pass role.
///
/// Uniform slots for the pass's [`UniformId`]s are resolved once at creation,
/// so per-frame writes never look names up.
pub struct Package {
    name: String,
    kind: PassKind,
    active: bool,
    program: Program,
    attributes: AttributeBinding,
    buffers: VertexBuffers,
    uniforms: UniformBlock,
    slots: [Option<UniformSlot>; UniformId::COUNT],
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl Package {
    pub fn new(device: &wgpu::Device, desc: PackageDesc<'_>) -> Result<Self, EngineError> {
        let program = compile_program(device, &desc.source)?;
        let layout = program.layout();

        let attributes = layout.bind_attributes();
        let Some(position_location) = attributes.position else {
            return Err(CompileError::Link {
                label: desc.source.label.to_string(),
                log: "vertex stage does not read a `position` attribute".to_string(),
            }
            .into());
        };

        let uniforms = UniformBlock::new(layout.uniforms.clone(), layout.uniform_block_size);
        let slots = resolve_slots(desc.kind, &uniforms)?;

        let uniform_size = uniforms.bytes().len() as u64;
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("umbra {} ubo", desc.name)),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("umbra {} bgl", desc.name)),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("umbra {} bind group", desc.name)),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut group_layouts = vec![&bind_group_layout];
        group_layouts.extend(desc.extra_layout);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("umbra {} pipeline layout", desc.name)),
            bind_group_layouts: &group_layouts,
            immediate_size: 0,
        });

        let position_attr = [vec2_attribute(position_location)];
        let normal_attr = attributes.normal.map(|location| [vec2_attribute(location)]);
        let mut vertex_layouts = vec![stream_layout(&position_attr)];
        if let Some(attr) = normal_attr.as_ref() {
            vertex_layouts.push(stream_layout(attr));
        }

        let (color_format, stencil_format) = match desc.kind.target() {
            PassTarget::Output => (desc.output_format, None),
            PassTarget::Accumulation => (ACCUMULATION_FORMAT, Some(STENCIL_FORMAT)),
        };
        let draw_state = desc.kind.stencil_role().draw_state();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("umbra {} pipeline", desc.name)),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: program.vertex_module(),
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &vertex_layouts,
            },

            fragment: Some(wgpu::FragmentState {
                module: program.fragment_module(),
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(desc.kind.blend().to_wgpu()),
                    write_mask: draw_state.color_writes,
                })],
            }),

            // Shadow edge elements are emitted with either winding.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: draw_state.depth_stencil(stencil_format),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "package `{}` ready ({:?} pass, normal {})",
            desc.name,
            desc.kind,
            if attributes.normal.is_some() { "bound" } else { "unused" }
        );

        Ok(Self {
            name: desc.name.to_string(),
            kind: desc.kind,
            active: true,
            program,
            attributes,
            buffers: VertexBuffers::new(desc.kind.label()),
            uniforms,
            slots,
            uniform_buffer,
            bind_group,
            pipeline,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn attributes(&self) -> AttributeBinding {
        self.attributes
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Inactive packages are skipped by [`Package::draw`].
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn vertex_count(&self) -> u32 {
        self.buffers.vertex_count()
    }

    /// Stages a uniform value; it reaches the GPU on the next [`Package::flush`].
    pub fn set(&mut self, id: UniformId, value: impl Into<UniformValue>) -> Result<(), EngineError> {
        let Some(slot) = self.slots[id.index()] else {
            return Err(EngineError::UnknownUniform {
                pass: self.kind,
                uniform: id,
            });
        };
        self.uniforms.write(slot, value.into())?;
        Ok(())
    }

    /// Copies the uniform block to its buffer if it changed.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if self.uniforms.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, self.uniforms.bytes());
        }
    }

    pub fn upload_mesh(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &Mesh) {
        self.buffers
            .upload(device, queue, mesh, self.attributes.normal.is_some());
    }

    /// Records the draw into `pass`. `extra` is bound at group 1.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, extra: Option<&wgpu::BindGroup>) {
        let count = self.buffers.vertex_count();
        if !self.active || count == 0 {
            return;
        }
        let Some(positions) = self.buffers.positions() else { return };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        if let Some(group) = extra {
            pass.set_bind_group(1, group, &[]);
        }
        if self.kind.stencil_role().uses_reference() {
            pass.set_stencil_reference(CASTER_MARKER);
        }

        pass.set_vertex_buffer(0, positions.slice(..));
        if self.attributes.normal.is_some() {
            let Some(normals) = self.buffers.normals() else { return };
            pass.set_vertex_buffer(1, normals.slice(..));
        }
        pass.draw(0..count, 0..1);
    }
}

/// Maps every uniform the pass writes to its slot in the program's block.
fn resolve_slots(
    kind: PassKind,
    uniforms: &UniformBlock,
) -> Result<[Option<UniformSlot>; UniformId::COUNT], EngineError> {
    let mut slots = [None; UniformId::COUNT];
    for &id in kind.uniforms() {
        let slot = uniforms
            .slot(id.name())
            .ok_or(EngineError::UnknownUniform { pass: kind, uniform: id })?;

        if let Some(uniform) = uniforms.get(slot) {
            if uniform.ty() != id.ty() {
                return Err(TypeMismatchError {
                    name: id.name().to_string(),
                    declared: uniform.ty(),
                    got: id.ty(),
                }
                .into());
            }
        }
        slots[id.index()] = Some(slot);
    }
    Ok(slots)
}
