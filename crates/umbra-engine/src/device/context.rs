use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::SetupError;

use super::GpuInit;

/// Cloneable handle to the logical device, its queue and a shared lost flag.
///
/// The flag is raised by wgpu's device-lost callback or by the host through
/// [`GpuContext::mark_lost`]; the engine polls it at the start of every call.
#[derive(Clone)]
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Wraps an existing device and installs the device-lost callback.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let lost = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            if !matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                log::error!("GPU device lost ({reason:?}): {message}");
            }
            flag.store(true, Ordering::Release);
        });

        Self { device, queue, lost }
    }

    /// Creates a device with no surface, for offscreen rendering and tests.
    pub async fn headless(init: &GpuInit) -> Result<Self, SetupError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SetupError::NoAdapter(e.to_string()))?;

        let (device, queue) = request_device(&adapter, init, "umbra headless device").await?;
        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Reports an unrecoverable failure observed outside wgpu's callback,
    /// e.g. a fatal surface error.
    pub fn mark_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }
}

pub(crate) async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    label: &str,
) -> Result<(wgpu::Device, wgpu::Queue), SetupError> {
    let info = adapter.get_info();
    log::info!("using adapter `{}` ({:?})", info.name, info.backend);

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| SetupError::Device(e.to_string()))
}
