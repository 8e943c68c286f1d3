/// A single acquired surface texture and its view.
///
/// Short-lived: holding it blocks acquisition of the next frame. The engine
/// records and submits its own command buffers against `view`.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.surface_texture.texture
    }

    /// Queues the texture for presentation.
    pub fn present(self) {
        drop(self.view);
        self.surface_texture.present();
    }
}
