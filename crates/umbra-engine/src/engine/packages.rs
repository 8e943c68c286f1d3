use crate::error::EngineError;
use crate::render::{shaders, Package, PackageDesc, PassKind};

/// The four packages of a frame, one per pass role.
pub(crate) struct Packages {
    background: Package,
    wall_body: Package,
    wall_stencil: Package,
    light: Package,
}

impl Packages {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        composite_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, EngineError> {
        let build = |kind: PassKind| {
            Package::new(
                device,
                PackageDesc {
                    name: kind.label(),
                    kind,
                    source: shaders::source(kind),
                    output_format,
                    extra_layout: (kind == PassKind::Background).then_some(composite_layout),
                },
            )
        };

        Ok(Self {
            background: build(PassKind::Background)?,
            wall_body: build(PassKind::WallBody)?,
            wall_stencil: build(PassKind::WallStencil)?,
            light: build(PassKind::Light)?,
        })
    }

    pub fn get(&self, kind: PassKind) -> &Package {
        match kind {
            PassKind::Background => &self.background,
            PassKind::WallBody => &self.wall_body,
            PassKind::WallStencil => &self.wall_stencil,
            PassKind::Light => &self.light,
        }
    }

    pub fn get_mut(&mut self, kind: PassKind) -> &mut Package {
        match kind {
            PassKind::Background => &mut self.background,
            PassKind::WallBody => &mut self.wall_body,
            PassKind::WallStencil => &mut self.wall_stencil,
            PassKind::Light => &mut self.light,
        }
    }
}
