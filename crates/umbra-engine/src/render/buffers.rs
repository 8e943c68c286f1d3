use crate::geometry::Mesh;

/// Per-package vertex storage: one `vec2<f32>` stream for positions and one
/// for normals.
///
/// Buffers are grown (never shrunk) to the next power of two and refilled with
/// `write_buffer`, so re-uploading geometry every frame does not reallocate.
pub struct VertexBuffers {
    label: &'static str,
    positions: Option<wgpu::Buffer>,
    normals: Option<wgpu::Buffer>,
    capacity: usize,
    vertex_count: u32,
}

/// Stride of both vertex streams.
pub const VERTEX_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;

const MIN_CAPACITY: usize = 64;

impl VertexBuffers {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            positions: None,
            normals: None,
            capacity: 0,
            vertex_count: 0,
        }
    }

    /// Replaces the buffer contents with `mesh`.
    ///
    /// Normals are uploaded only when `with_normals` is set; otherwise the
    /// normal stream is left untouched and never bound.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &Mesh, with_normals: bool) {
        let count = mesh.vertex_count();
        self.vertex_count = count as u32;
        if count == 0 {
            return;
        }

        self.ensure_capacity(device, count);

        if let Some(buf) = self.positions.as_ref() {
            queue.write_buffer(buf, 0, bytemuck::cast_slice(&mesh.positions));
        }
        if with_normals {
            if let Some(buf) = self.normals.as_ref() {
                queue.write_buffer(buf, 0, bytemuck::cast_slice(&mesh.normals));
            }
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn positions(&self) -> Option<&wgpu::Buffer> {
        self.positions.as_ref()
    }

    pub fn normals(&self) -> Option<&wgpu::Buffer> {
        self.normals.as_ref()
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.capacity && self.positions.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(MIN_CAPACITY);
        let size = new_cap as u64 * VERTEX_STRIDE;
        let buffer = |suffix: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("umbra {} {suffix} vbo", self.label)),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        self.positions = Some(buffer("position"));
        self.normals = Some(buffer("normal"));
        self.capacity = new_cap;
        log::trace!("{} vertex buffers grown to {new_cap} vertices", self.label);
    }
}

/// Layout of a single `vec2<f32>` stream at `location`.
pub fn stream_layout(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: VERTEX_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

pub fn vec2_attribute(location: u32) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: location,
    }
}
