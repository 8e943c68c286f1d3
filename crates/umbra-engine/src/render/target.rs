use crate::coords::Viewport;

use super::state::STENCIL_FORMAT;

/// Format of the light accumulation target. Float so overlapping lights can
/// exceed 1.0 before the composite multiplies them into the background.
pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Offscreen light accumulation color target plus its stencil attachment.
///
/// Both textures always share the same size. `generation` is bumped on every
/// reallocation so bind groups sampling the color texture know to rebuild.
pub struct RenderTarget {
    size: Viewport,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    stencil: wgpu::Texture,
    stencil_view: wgpu::TextureView,
    generation: u64,
}

impl RenderTarget {
    /// Allocates a target of `size`. Each side is clamped into
    /// `1..=max_texture_dimension_2d`.
    pub fn new(device: &wgpu::Device, size: Viewport) -> Self {
        let size = fit(device, size);
        let (color, color_view) = create_color(device, size);
        let (stencil, stencil_view) = create_stencil(device, size);

        log::debug!("accumulation target allocated at {}x{}", size.width, size.height);

        Self {
            size,
            color,
            color_view,
            stencil,
            stencil_view,
            generation: 0,
        }
    }

    /// Reallocates both attachments if `size` differs from the current one.
    ///
    /// Returns whether anything was reallocated.
    pub fn resize(&mut self, device: &wgpu::Device, size: Viewport) -> bool {
        let size = fit(device, size);
        if size == self.size {
            return false;
        }

        let (color, color_view) = create_color(device, size);
        let (stencil, stencil_view) = create_stencil(device, size);
        self.color = color;
        self.color_view = color_view;
        self.stencil = stencil;
        self.stencil_view = stencil_view;
        self.size = size;
        self.generation += 1;

        log::debug!(
            "accumulation target resized to {}x{} (generation {})",
            size.width,
            size.height,
            self.generation
        );
        true
    }

    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn stencil_texture(&self) -> &wgpu::Texture {
        &self.stencil
    }

    pub fn stencil_view(&self) -> &wgpu::TextureView {
        &self.stencil_view
    }
}

fn fit(device: &wgpu::Device, size: Viewport) -> Viewport {
    let max = device.limits().max_texture_dimension_2d;
    let fitted = size.clamped_to(max);
    if fitted.width < size.width || fitted.height < size.height {
        log::warn!(
            "requested target {}x{} exceeds the device limit {max}; using {}x{}",
            size.width,
            size.height,
            fitted.width,
            fitted.height
        );
    }
    fitted
}

fn extent(size: Viewport) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

fn create_color(device: &wgpu::Device, size: Viewport) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("umbra accumulation color"),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: ACCUMULATION_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_stencil(device: &wgpu::Device, size: Viewport) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("umbra accumulation stencil"),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: STENCIL_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
