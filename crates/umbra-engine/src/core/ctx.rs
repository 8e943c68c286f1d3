use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::time::FrameTime;

use super::app::AppControl;

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the surface texture, hands its view to `draw`, then presents.
    ///
    /// Recoverable surface errors skip the frame. A fatal one marks the GPU
    /// context lost, which the app observes on its next engine call.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&wgpu::TextureView) -> AppControl,
    {
        let frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let reason = err.to_string();
                if self.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                    log::error!("fatal surface error: {reason}");
                    self.gpu.context().mark_lost();
                }
                return AppControl::Continue;
            }
        };

        let control = draw(&frame.view);

        self.window.pre_present_notify();
        frame.present();
        control
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}
