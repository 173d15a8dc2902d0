// ============================================================================
// IMAGE I/O - decode into a PixelBuffer, encode a PixelBuffer for export
// ============================================================================
//
// Decoding can run synchronously (`decode_image`, `decode_file`) or on the
// rayon pool (`spawn_decode*`). The background variants hand the result back
// over an mpsc channel; the caller polls it and passes it to
// `Editor::finish_load`, so the editor is only ever touched from one thread.
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use image::{DynamicImage, ImageOutputFormat};

use crate::canvas::{MAX_PIXELS, PixelBuffer};
use crate::error::{self, DecodeError, EncodeError};

/// Export formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn all() -> &'static [SaveFormat] {
        &[
            SaveFormat::Png,
            SaveFormat::Jpeg,
            SaveFormat::Bmp,
            SaveFormat::Tga,
            SaveFormat::Tiff,
        ]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    /// Parse a format name or file extension (`"jpeg"`, `"JPG"`, `"tif"`, ...).
    pub fn from_name(name: &str) -> Option<SaveFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "tif" | "tiff" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<SaveFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_name)
    }

    pub fn is_lossless(&self) -> bool {
        !matches!(self, SaveFormat::Jpeg)
    }

    pub fn supports_quality(&self) -> bool {
        matches!(self, SaveFormat::Jpeg)
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode any format the `image` crate recognises into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> error::Result<PixelBuffer> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(DecodeError::TooLarge { width, height });
    }
    Ok(PixelBuffer::from_rgba_image(&img.to_rgba8()))
}

pub fn decode_file(path: &Path) -> error::Result<PixelBuffer> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}

/// A decode running on the rayon pool.
pub struct PendingLoad {
    receiver: mpsc::Receiver<Result<PixelBuffer, DecodeError>>,
    finished: bool,
}

impl PendingLoad {
    /// Non-blocking poll. Yields the result exactly once.
    pub fn try_recv(&mut self) -> Option<Result<PixelBuffer, DecodeError>> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(DecodeError::WorkerDisconnected))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Block until the decode finishes.
    pub fn wait(self) -> Result<PixelBuffer, DecodeError> {
        if self.finished {
            return Err(DecodeError::WorkerDisconnected);
        }
        self.receiver
            .recv()
            .unwrap_or(Err(DecodeError::WorkerDisconnected))
    }
}

fn spawn_with<F>(job: F) -> PendingLoad
where
    F: FnOnce() -> Result<PixelBuffer, DecodeError> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    rayon::spawn(move || {
        let _ = sender.send(job());
    });
    PendingLoad {
        receiver,
        finished: false,
    }
}

/// Decode `bytes` in the background.
pub fn spawn_decode(bytes: Vec<u8>) -> PendingLoad {
    spawn_with(move || decode_image(&bytes))
}

/// Read and decode `path` in the background.
pub fn spawn_decode_file(path: PathBuf) -> PendingLoad {
    spawn_with(move || {
        let result = decode_file(&path);
        if let Err(e) = &result {
            crate::log_warn!("Background decode of {} failed: {}", path.display(), e);
        }
        result
    })
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode `buffer` in `format`. `quality` (1..=100) only affects JPEG, which
/// also drops the alpha channel.
pub fn encode_image(buffer: &PixelBuffer, format: SaveFormat, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut out = Cursor::new(Vec::new());
    let rgba = DynamicImage::ImageRgba8(buffer.to_rgba_image());
    match format {
        SaveFormat::Png => rgba.write_to(&mut out, ImageOutputFormat::Png)?,
        SaveFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(rgba.to_rgb8());
            rgb.write_to(&mut out, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))?;
        }
        SaveFormat::Bmp => rgba.write_to(&mut out, ImageOutputFormat::Bmp)?,
        SaveFormat::Tga => rgba.write_to(&mut out, ImageOutputFormat::Tga)?,
        SaveFormat::Tiff => rgba.write_to(&mut out, ImageOutputFormat::Tiff)?,
    }
    Ok(out.into_inner())
}

/// Encode and write to `path`. Standalone so it can run on a worker thread.
pub fn write_image(buffer: &PixelBuffer, path: &Path, format: SaveFormat, quality: u8) -> Result<(), EncodeError> {
    let bytes = encode_image(buffer, format, quality)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(5, 3);
        for y in 0..3 {
            for x in 0..5 {
                buf.put_pixel(x, y, [x as u8 * 40, y as u8 * 80, 200, 255 - x as u8]);
            }
        }
        buf
    }

    #[test]
    fn test_format_names() {
        assert_eq!(SaveFormat::from_name("JPEG"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_name("tif"), Some(SaveFormat::Tiff));
        assert_eq!(SaveFormat::from_name("webp"), None);
        assert_eq!(SaveFormat::from_path(Path::new("a/b.Png")), Some(SaveFormat::Png));
        assert_eq!(SaveFormat::from_path(Path::new("noext")), None);
        for f in SaveFormat::all() {
            assert_eq!(SaveFormat::from_name(f.extension()), Some(*f));
        }
        assert!(!SaveFormat::Jpeg.is_lossless());
        assert!(SaveFormat::Jpeg.supports_quality());
        assert!(!SaveFormat::Png.supports_quality());
    }

    #[test]
    fn test_lossless_formats_preserve_pixels() {
        let src = sample();
        for format in [SaveFormat::Png, SaveFormat::Tiff] {
            let bytes = encode_image(&src, format, 90).unwrap();
            let back = decode_image(&bytes).unwrap();
            assert_eq!(back, src, "{format:?}");
        }
    }

    #[test]
    fn test_jpeg_keeps_dimensions_and_is_opaque() {
        let bytes = encode_image(&sample(), SaveFormat::Jpeg, 80).unwrap();
        let back = decode_image(&bytes).unwrap();
        assert_eq!(back.dimensions(), (5, 3));
        assert!(back.as_raw().chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        assert!(matches!(decode_image(b"nope"), Err(DecodeError::Image(_))));
        assert!(matches!(decode_image(&[]), Err(DecodeError::Image(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_file(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn test_write_then_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_image(&sample(), &path, SaveFormat::Png, 90).unwrap();
        assert_eq!(decode_file(&path).unwrap(), sample());
    }

    #[test]
    fn test_background_decode_delivers_once() {
        let bytes = encode_image(&sample(), SaveFormat::Png, 90).unwrap();
        let mut pending = spawn_decode(bytes);
        let result = loop {
            if let Some(r) = pending.try_recv() {
                break r;
            }
            std::thread::yield_now();
        };
        assert_eq!(result.unwrap(), sample());
        assert!(pending.is_finished());
        assert!(pending.try_recv().is_none());
    }

    #[test]
    fn test_background_file_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.png");
        write_image(&sample(), &path, SaveFormat::Png, 90).unwrap();
        assert_eq!(spawn_decode_file(path).wait().unwrap(), sample());

        let missing = spawn_decode_file(dir.path().join("missing.png"));
        assert!(matches!(missing.wait(), Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_background_decode_reports_failure() {
        let pending = spawn_decode(b"not an image".to_vec());
        assert!(matches!(pending.wait(), Err(DecodeError::Image(_))));
    }
}
