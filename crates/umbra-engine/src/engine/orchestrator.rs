use std::time::Instant;

use image::RgbaImage;

use crate::coords::{Vec2, Viewport};
use crate::device::GpuContext;
use crate::error::{EngineError, MapError, SetupError};
use crate::geometry::{build_walls, map_quad, WallPolyline};
use crate::render::{PassKind, RenderTarget, UniformId};
use crate::scene::{ConeInput, Light, LightRig, MapAsset};
use crate::time::{FpsCounter, FrameClock, StatsSink};

use super::background::{BackgroundDecode, BackgroundSource};
use super::composite::Composite;
use super::config::{AmbientMode, EngineConfig};
use super::packages::Packages;

/// Lifecycle of an [`Engine`].
///
/// `Lost` is terminal: every later call fails with [`EngineError::ContextLost`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// Waiting for the background decode.
    Loading,
    /// GPU resources built; the next frame starts rendering.
    Ready,
    Rendering,
    Lost,
}

/// Outcome of one [`Engine::advance_frame`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// Still loading; nothing was drawn.
    Loading,
    Rendered,
}

/// GPU resources that exist from `Ready` on.
struct Resources {
    target: RenderTarget,
    packages: Packages,
    composite: Composite,
    /// Wall revision the caster buffers were built from.
    caster_revision: Option<u64>,
}

/// Frame orchestrator: owns the map, the lights, the packages and the
/// accumulation target, and draws one frame per host tick.
pub struct Engine {
    gpu: GpuContext,
    output_format: wgpu::TextureFormat,
    config: EngineConfig,
    map: MapAsset,
    rig: LightRig,
    viewport: Viewport,
    state: EngineState,

    decode: Option<BackgroundDecode>,
    resources: Option<Resources>,

    /// Per-pass active flags, indexed by `PassKind as usize`.
    active: [bool; PassKind::ALL.len()],
    ambient: AmbientMode,
    wall_revision: u64,

    clock: FrameClock,
    fps: FpsCounter,
    warned_skipped: bool,
}

impl Engine {
    /// Validates the map, builds the light list and starts decoding the background.
    ///
    /// GPU resources are created once the decode completes, on the first
    /// [`Engine::advance_frame`] that observes it (or in [`Engine::finish_loading`]).
    pub fn new(
        gpu: GpuContext,
        output_format: wgpu::TextureFormat,
        viewport: Viewport,
        config: EngineConfig,
        map: MapAsset,
        background: BackgroundSource,
    ) -> Result<Self, EngineError> {
        if gpu.is_lost() {
            return Err(EngineError::ContextLost);
        }
        if !viewport.is_valid() {
            return Err(SetupError::ZeroSizedSurface.into());
        }
        map.validate()?;
        let rig = LightRig::from_map(&map, &config.controlled_light)?;

        let mut active = [true; PassKind::ALL.len()];
        active[PassKind::WallBody as usize] = config.show_outline;

        let mut engine = Self {
            gpu,
            output_format,
            ambient: config.ambient_mode,
            fps: FpsCounter::new(config.fps_window),
            config,
            map,
            rig,
            viewport,
            state: EngineState::Uninitialized,
            decode: None,
            resources: None,
            active,
            wall_revision: 0,
            clock: FrameClock::new(),
            warned_skipped: false,
        };

        engine.decode = Some(BackgroundDecode::start(background));
        engine.transition(EngineState::Loading);
        Ok(engine)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn map(&self) -> &MapAsset {
        &self.map
    }

    /// Lights in draw order; the last one is the controllable light.
    pub fn lights(&self) -> &[Light] {
        self.rig.lights()
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// The accumulation target, once loading has finished.
    pub fn target(&self) -> Option<&RenderTarget> {
        self.resources.as_ref().map(|r| &r.target)
    }

    /// Blocks until the background is decoded and GPU resources are built.
    pub fn finish_loading(&mut self) -> Result<(), EngineError> {
        self.ensure_alive()?;
        self.poll_loading(true).map(|_| ())
    }

    /// Draws one frame into `output`, which must use the format the engine
    /// was created with.
    pub fn advance_frame(
        &mut self,
        output: &wgpu::TextureView,
        now: Instant,
        stats: &mut dyn StatsSink,
    ) -> Result<FrameStatus, EngineError> {
        self.ensure_alive()?;
        if !self.poll_loading(false)? {
            return Ok(FrameStatus::Loading);
        }
        if self.state == EngineState::Ready {
            self.transition(EngineState::Rendering);
        }

        let time = self.clock.tick_at(now);
        if let Some(fps) = self.fps.tick(now) {
            stats.report_fps(fps);
        }

        self.render(output, time.elapsed)?;
        Ok(FrameStatus::Rendered)
    }

    /// Adopts new drawable dimensions. Zero sizes (minimized) are ignored.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        self.ensure_alive()?;

        let size = Viewport::new(width, height);
        if !size.is_valid() {
            log::debug!("ignoring zero-sized resize {width}x{height}");
            return Ok(());
        }

        self.viewport = size;
        if let Some(res) = self.resources.as_mut() {
            res.target.resize(self.gpu.device(), size);
        }
        Ok(())
    }

    /// Moves the controllable light and applies its cone and toggle.
    /// Takes effect on the next frame.
    pub fn update_controlled_light(
        &mut self,
        vertical: f32,
        horizontal: f32,
        cone: ConeInput,
    ) -> Result<(), EngineError> {
        self.ensure_alive()?;
        self.rig.update_controlled(vertical, horizontal, cone);
        Ok(())
    }

    pub fn ambient_mode(&self) -> AmbientMode {
        self.ambient
    }

    pub fn set_ambient_mode(&mut self, mode: AmbientMode) {
        if self.ambient != mode {
            log::debug!("ambient mode {:?} -> {mode:?}", self.ambient);
        }
        self.ambient = mode;
    }

    pub fn pass_active(&self, kind: PassKind) -> bool {
        self.active[kind as usize]
    }

    /// Enables or disables the package drawn by `kind`. Inactive packages
    /// record no state and no draw.
    pub fn set_pass_active(&mut self, kind: PassKind, active: bool) {
        self.active[kind as usize] = active;
        if let Some(res) = self.resources.as_mut() {
            res.packages.get_mut(kind).set_active(active);
        }
    }

    /// Replaces the caster polylines. Geometry is rebuilt on the next frame.
    pub fn set_wall_polylines(&mut self, walls: Vec<WallPolyline>) -> Result<(), EngineError> {
        self.ensure_alive()?;
        for (polyline, points) in walls.iter().enumerate() {
            if let Some(index) = points.iter().position(|p| !p.is_finite()) {
                return Err(MapError::NonFinitePoint { polyline, index }.into());
            }
        }

        self.map.wall_polylines = walls;
        self.wall_revision += 1;
        self.warned_skipped = false;
        Ok(())
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    fn transition(&mut self, next: EngineState) {
        log::info!("engine {:?} -> {next:?}", self.state);
        self.state = next;
    }

    fn ensure_alive(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Lost && self.gpu.is_lost() {
            self.transition(EngineState::Lost);
            self.resources = None;
            self.decode = None;
        }
        if self.state == EngineState::Lost {
            return Err(EngineError::ContextLost);
        }
        Ok(())
    }

    /// Returns whether resources are ready. A failed decode or build is fatal.
    fn poll_loading(&mut self, block: bool) -> Result<bool, EngineError> {
        if self.state != EngineState::Loading {
            return Ok(true);
        }

        let result = match self.decode.as_mut() {
            Some(decode) if block => Some(decode.wait()),
            Some(decode) => decode.poll(),
            None => Some(Err(SetupError::DecoderGone)),
        };
        let Some(result) = result else {
            return Ok(false);
        };
        self.decode = None;

        match result
            .map_err(EngineError::from)
            .and_then(|image| self.build_resources(&image))
        {
            Ok(()) => {
                self.transition(EngineState::Ready);
                Ok(true)
            }
            Err(e) => {
                self.transition(EngineState::Lost);
                Err(e)
            }
        }
    }

    fn build_resources(&mut self, image: &RgbaImage) -> Result<(), EngineError> {
        let device = self.gpu.device();
        let queue = self.gpu.queue();
        let extent = self.map.map_extent;

        let layout = Composite::layout(device);
        let mut packages = Packages::new(device, self.output_format, &layout)?;
        for kind in PassKind::ALL {
            packages.get_mut(kind).set_active(self.active[kind as usize]);
        }

        let quad = map_quad(extent);
        for kind in [PassKind::Background, PassKind::Light] {
            packages.get_mut(kind).upload_mesh(device, queue, &quad);
        }

        let background = packages.get_mut(PassKind::Background);
        background.set(UniformId::Extent, extent)?;
        background.flush(queue);

        let outline = packages.get_mut(PassKind::WallBody);
        outline.set(UniformId::Extent, extent)?;
        outline.set(UniformId::OutlineColor, self.config.outline_color)?;
        outline.flush(queue);

        let target = RenderTarget::new(device, self.viewport);
        let composite = Composite::new(device, queue, layout, image, &target);

        self.resources = Some(Resources {
            target,
            packages,
            composite,
            caster_revision: None,
        });
        self.clock.reset();
        Ok(())
    }

    // ── frame body ────────────────────────────────────────────────────────

    fn render(&mut self, output: &wgpu::TextureView, elapsed: f32) -> Result<(), EngineError> {
        let Self {
            gpu,
            config,
            map,
            rig,
            resources,
            ambient,
            wall_revision,
            warned_skipped,
            ..
        } = self;
        let Some(res) = resources.as_mut() else {
            return Ok(());
        };
        let device = gpu.device();
        let queue = gpu.queue();
        let extent = map.map_extent;

        if !config.cache_static_casters || res.caster_revision != Some(*wall_revision) {
            let casters = build_walls(&map.wall_polylines, config.wall_thickness, true);
            if casters.skipped_segments > 0 && !*warned_skipped {
                log::warn!("skipped {} degenerate wall segment(s)", casters.skipped_segments);
                *warned_skipped = true;
            }
            res.packages
                .get_mut(PassKind::WallStencil)
                .upload_mesh(device, queue, &casters);

            let bodies = build_walls(&map.wall_polylines, config.wall_thickness, false);
            res.packages
                .get_mut(PassKind::WallBody)
                .upload_mesh(device, queue, &bodies);

            res.caster_revision = Some(*wall_revision);
        }

        // Ambient base.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("umbra clear encoder"),
        });
        {
            let _pass = begin_accumulation_pass(
                &mut encoder,
                &res.target,
                "umbra clear pass",
                wgpu::LoadOp::Clear(config.ambient(*ambient).to_wgpu()),
                wgpu::LoadOp::Clear(0),
            );
        }
        queue.submit(std::iter::once(encoder.finish()));

        // One submission per light: its uniform uploads land before its draws.
        let extrude = config.extrude_factor * (extent.x + extent.y);
        let stencil_load = PassKind::WallStencil.stencil_role().draw_state().stencil_load();

        for light in rig.lights().iter().filter(|l| l.enabled) {
            write_light_uniforms(&mut res.packages, light, extent, extrude, elapsed)?;
            res.packages.get_mut(PassKind::WallStencil).flush(queue);
            res.packages.get_mut(PassKind::Light).flush(queue);

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("umbra light encoder"),
            });
            {
                let mut pass = begin_accumulation_pass(
                    &mut encoder,
                    &res.target,
                    "umbra light pass",
                    wgpu::LoadOp::Load,
                    stencil_load,
                );
                if light.casts_shadow {
                    res.packages.get(PassKind::WallStencil).draw(&mut pass, None);
                }
                res.packages.get(PassKind::Light).draw(&mut pass, None);
            }
            queue.submit(std::iter::once(encoder.finish()));
        }

        // Composite onto the output, then the optional outline.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("umbra composite encoder"),
        });
        {
            let lightmap = res.composite.bind_group(device, &res.target);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("umbra composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            res.packages
                .get(PassKind::Background)
                .draw(&mut pass, Some(lightmap));
            res.packages.get(PassKind::WallBody).draw(&mut pass, None);
        }
        queue.submit(std::iter::once(encoder.finish()));

        Ok(())
    }
}

fn write_light_uniforms(
    packages: &mut Packages,
    light: &Light,
    extent: Vec2,
    extrude: f32,
    time: f32,
) -> Result<(), EngineError> {
    let stencil = packages.get_mut(PassKind::WallStencil);
    stencil.set(UniformId::Extent, extent)?;
    stencil.set(UniformId::LightPosition, light.position)?;
    stencil.set(UniformId::Extrude, extrude)?;

    let pkg = packages.get_mut(PassKind::Light);
    pkg.set(UniformId::Extent, extent)?;
    pkg.set(UniformId::LightPosition, light.position)?;
    pkg.set(UniformId::LightColor, light.color.to_rgb_array())?;
    pkg.set(UniformId::Intensity, light.intensity)?;
    pkg.set(UniformId::Range, light.range)?;
    pkg.set(UniformId::ConeAngle, light.cone_angle)?;
    pkg.set(UniformId::ConeRotation, light.cone_rotation)?;
    pkg.set(UniformId::Time, time)?;
    pkg.set(UniformId::Flicker, light.flicker)?;
    Ok(())
}

/// Opens a pass on the accumulation color and stencil attachments.
fn begin_accumulation_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &RenderTarget,
    label: &str,
    color: wgpu::LoadOp<wgpu::Color>,
    stencil: wgpu::LoadOp<u32>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.color_view(),
            resolve_target: None,
            ops: wgpu::Operations {
                load: color,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: target.stencil_view(),
            depth_ops: None,
            stencil_ops: Some(wgpu::Operations {
                load: stencil,
                store: wgpu::StoreOp::Store,
            }),
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
