mod controls;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::PhysicalKey;

use umbra_engine::coords::Viewport;
use umbra_engine::core::{App, AppControl, FrameCtx};
use umbra_engine::device::{Gpu, GpuInit};
use umbra_engine::logging::{init_logging, LoggingConfig};
use umbra_engine::render::PassKind;
use umbra_engine::scene::MapAsset;
use umbra_engine::window::{Runtime, RuntimeConfig};
use umbra_engine::{AmbientMode, BackgroundSource, Engine, EngineConfig, EngineError, FrameStatus};

use controls::{Command, Controls};

const DEFAULT_MAP: &str = include_str!("../assets/default_map.json");

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let map_path = args.next();
    let background_path = args.next();

    let map = match &map_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read map {}", path.display()))?;
            MapAsset::from_json(&json).with_context(|| format!("invalid map {}", path.display()))?
        }
        None => MapAsset::from_json(DEFAULT_MAP).context("invalid built-in map")?,
    };

    let background = match &background_path {
        Some(path) => BackgroundSource::Encoded(
            std::fs::read(path)
                .with_context(|| format!("failed to read background {}", path.display()))?,
        ),
        None => BackgroundSource::Decoded(floor_tiles(
            map.map_extent.x as u32,
            map.map_extent.y as u32,
        )),
    };

    log::info!(
        "map: {} wall polyline(s), {} light(s)",
        map.wall_polylines.len(),
        map.lights.len()
    );

    Runtime::run(
        RuntimeConfig::default(),
        GpuInit::default(),
        DemoApp::new(map, background),
    )
}

struct DemoApp {
    pending: Option<(MapAsset, BackgroundSource)>,
    engine: Option<Engine>,
    controls: Controls,
}

impl DemoApp {
    fn new(map: MapAsset, background: BackgroundSource) -> Self {
        Self {
            controls: Controls::new(map.map_extent),
            pending: Some((map, background)),
            engine: None,
        }
    }

    fn apply(&mut self, command: Command) -> AppControl {
        let Some(engine) = self.engine.as_mut() else {
            return AppControl::Continue;
        };

        match command {
            Command::ToggleAmbient => {
                let next = match engine.ambient_mode() {
                    AmbientMode::Dark => AmbientMode::Lit,
                    AmbientMode::Lit => AmbientMode::Dark,
                };
                engine.set_ambient_mode(next);
            }
            Command::ToggleOutline => {
                let active = engine.pass_active(PassKind::WallBody);
                engine.set_pass_active(PassKind::WallBody, !active);
            }
            Command::Quit => return AppControl::Exit,
        }
        AppControl::Continue
    }
}

impl App for DemoApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let (map, background) = self
            .pending
            .take()
            .context("engine already created")?;

        let size = gpu.size();
        let engine = Engine::new(
            gpu.context().clone(),
            gpu.surface_format(),
            Viewport::new(size.width, size.height),
            EngineConfig::default(),
            map,
            background,
        )?;

        self.engine = Some(engine);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat: false,
                    ..
                },
            ..
        } = event
        else {
            return AppControl::Continue;
        };

        match self.controls.on_key(*code, *state == ElementState::Pressed) {
            Some(command) => self.apply(command),
            None => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) -> AppControl {
        let Some(engine) = self.engine.as_mut() else {
            return AppControl::Continue;
        };
        match engine.on_resize(size.width, size.height) {
            Ok(()) => AppControl::Continue,
            Err(e) => {
                log::error!("resize failed: {e}");
                AppControl::Exit
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(engine) = self.engine.as_mut() else {
            return AppControl::Continue;
        };

        self.controls.step(ctx.time.dt);
        if let Err(e) = engine.update_controlled_light(
            self.controls.vertical,
            self.controls.horizontal,
            self.controls.cone(),
        ) {
            log::error!("{e}");
            return AppControl::Exit;
        }

        let mut fps = None;
        let control = ctx.render(|view| {
            let mut sink = |value: f32| fps = Some(value);
            match engine.advance_frame(view, Instant::now(), &mut sink) {
                Ok(FrameStatus::Loading | FrameStatus::Rendered) => AppControl::Continue,
                Err(EngineError::ContextLost) => {
                    log::error!("GPU context lost, exiting");
                    AppControl::Exit
                }
                Err(e) => {
                    log::error!("frame failed: {e}");
                    AppControl::Exit
                }
            }
        });

        if let Some(fps) = fps {
            log::info!("{fps:.1} fps");
            ctx.set_title(&format!("umbra - {fps:.0} fps"));
        }
        control
    }
}

/// Stone floor used when no background file is given.
fn floor_tiles(width: u32, height: u32) -> RgbaImage {
    const TILE: u32 = 64;

    RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
        let grout = x % TILE < 2 || y % TILE < 2;
        if grout {
            return Rgba([70, 66, 60, 255]);
        }
        let shade = if (x / TILE + y / TILE) % 2 == 0 { 200 } else { 176 };
        // Cheap per-pixel grain.
        let grain = ((x.wrapping_mul(73) ^ y.wrapping_mul(151)) % 13) as u8;
        Rgba([shade - grain, shade - 4 - grain, shade - 12 - grain, 255])
    })
}
