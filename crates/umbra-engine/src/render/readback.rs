//! Synchronous texture readback, used by headless rendering and tests.

use thiserror::Error;

use crate::coords::Viewport;

#[derive(Debug, Error)]
pub enum ReadbackError {
    #[error("readback supports 8-bit RGBA textures only, got {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("device poll failed: {0}")]
    Poll(String),

    #[error("map callback dropped before completing")]
    CallbackDropped,
}

/// Copies `texture` into tightly packed RGBA8 rows, top row first.
///
/// Blocks until the GPU finished every submission made before the call.
pub fn read_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>, ReadbackError> {
    let format = texture.format();
    if !matches!(
        format,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb
    ) {
        return Err(ReadbackError::UnsupportedFormat(format));
    }

    let size = Viewport::new(texture.width(), texture.height());
    let unpadded_row = size.width * 4;
    let padded_row = unpadded_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("umbra readback staging"),
        size: padded_row as u64 * size.height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("umbra readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(size.height),
            },
        },
        wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| ReadbackError::Poll(e.to_string()))?;
    rx.recv().map_err(|_| ReadbackError::CallbackDropped)??;

    let mut pixels = Vec::with_capacity((unpadded_row * size.height) as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks_exact(padded_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_row as usize]);
        }
    }
    staging.unmap();

    Ok(pixels)
}

/// RGBA of the pixel at `(x, y)` in a buffer returned by [`read_rgba8`].
pub fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= width {
        return None;
    }
    let i = ((y as usize * width as usize) + x as usize) * 4;
    let px = pixels.get(i..i + 4)?;
    Some([px[0], px[1], px[2], px[3]])
}
