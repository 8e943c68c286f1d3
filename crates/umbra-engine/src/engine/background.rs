use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use image::RgbaImage;

use crate::error::SetupError;

/// Background bitmap as handed to the engine.
pub enum BackgroundSource {
    /// Encoded file contents (PNG, JPEG or BMP); decoded on a worker thread.
    Encoded(Vec<u8>),
    /// Already decoded pixels.
    Decoded(RgbaImage),
}

type DecodeResult = Result<RgbaImage, SetupError>;

/// Single-shot background decode. Polled once per tick while loading.
pub(crate) struct BackgroundDecode {
    rx: Receiver<DecodeResult>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundDecode {
    pub fn start(source: BackgroundSource) -> Self {
        let (tx, rx) = mpsc::channel();

        let worker = match source {
            BackgroundSource::Decoded(image) => {
                let _ = tx.send(check_size(image));
                None
            }
            BackgroundSource::Encoded(bytes) => Some(thread::spawn(move || {
                let result = image::load_from_memory(&bytes)
                    .map_err(SetupError::from)
                    .and_then(|img| check_size(img.to_rgba8()));
                let _ = tx.send(result);
            })),
        };

        Self { rx, worker }
    }

    /// Returns the result once the decode has finished.
    pub fn poll(&mut self) -> Option<DecodeResult> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(SetupError::DecoderGone))
            }
        }
    }

    /// Blocks until the decode has finished.
    pub fn wait(&mut self) -> DecodeResult {
        let result = self.rx.recv().unwrap_or(Err(SetupError::DecoderGone));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("background decode thread panicked");
            }
        }
    }
}

fn check_size(image: RgbaImage) -> DecodeResult {
    if image.width() == 0 || image.height() == 0 {
        return Err(SetupError::EmptyBackground);
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decoded_source_is_ready_immediately() {
        let mut decode = BackgroundDecode::start(BackgroundSource::Decoded(RgbaImage::new(2, 3)));
        let image = decode.poll().unwrap().unwrap();
        assert_eq!(image.dimensions(), (2, 3));
    }

    #[test]
    fn encoded_source_decodes_on_worker() {
        let mut decode = BackgroundDecode::start(BackgroundSource::Encoded(png(4, 5)));
        let image = decode.wait().unwrap();
        assert_eq!(image.dimensions(), (4, 5));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let mut decode = BackgroundDecode::start(BackgroundSource::Encoded(vec![1, 2, 3]));
        assert!(matches!(decode.wait(), Err(SetupError::BackgroundDecode(_))));
    }

    #[test]
    fn empty_image_is_rejected() {
        let mut decode = BackgroundDecode::start(BackgroundSource::Decoded(RgbaImage::new(0, 4)));
        assert!(matches!(decode.poll(), Some(Err(SetupError::EmptyBackground))));
    }
}
