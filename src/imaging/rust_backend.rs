//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image::ImageReader` with content sniffing |
//! | Normalize | `DynamicImage::into_rgb8` (drops alpha, expands grey/palette) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Atomic write | `tempfile::NamedTempFile` in the destination dir, then persist |

use super::backend::{BackendError, ImageBackend};
use super::params::{OutputFormat, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;
use tempfile::NamedTempFile;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// Refuses to replace existing destinations unless built with
/// [`overwrite(true)`](Self::overwrite).
#[derive(Debug, Clone, Default)]
pub struct RustBackend {
    overwrite: bool,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { overwrite: false }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    fn ensure_free(&self, dest: &Path) -> Result<(), BackendError> {
        if !self.overwrite && dest.exists() {
            return Err(BackendError::DestinationExists(dest.to_path_buf()));
        }
        Ok(())
    }

    /// Stage a new file next to `dest`, fill it with `write`, then move it into place.
    ///
    /// On any error the temp file is dropped and removed, so `dest` is never
    /// left half-written.
    fn write_atomically<F>(&self, dest: &Path, write: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut File) -> Result<(), BackendError>,
    {
        self.ensure_free(dest)?;
        let dir = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)?;
        write(staged.as_file_mut())?;
        staged.as_file().sync_all()?;

        let persisted = if self.overwrite {
            staged.persist(dest)
        } else {
            staged.persist_noclobber(dest)
        };
        persisted.map(|_| ()).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                BackendError::DestinationExists(dest.to_path_buf())
            } else {
                BackendError::Io(e.error)
            }
        })
    }
}

/// Encode `image` into `file` in the requested format.
fn encode(
    image: &RgbImage,
    file: &mut File,
    format: OutputFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let mut writer = BufWriter::new(file);
    let result = match format {
        OutputFormat::Jpeg => image.write_with_encoder(JpegEncoder::new_with_quality(
            &mut writer,
            quality.value() as u8,
        )),
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut writer)),
        OutputFormat::WebP => image.write_with_encoder(WebPEncoder::new_lossless(&mut writer)),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "{} encode failed: {e}",
            format.extension().to_uppercase()
        ))
    })?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn open_normalized(&self, path: &Path) -> Result<RgbImage, BackendError> {
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(image.into_rgb8())
    }

    fn save(
        &self,
        image: &RgbImage,
        dest: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), BackendError> {
        self.write_atomically(dest, |file| encode(image, file, format, quality))
    }

    fn copy(&self, source: &Path, dest: &Path) -> Result<(), BackendError> {
        let mut input = File::open(source)?;
        self.write_atomically(dest, |file| {
            std::io::copy(&mut input, file)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_test_png;
    use tempfile::TempDir;

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn open_normalized_drops_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rgba.png");
        image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 0]))
            .save(&path)
            .unwrap();

        let img = RustBackend::new().open_normalized(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn open_normalized_sniffs_content_over_extension() {
        let tmp = TempDir::new().unwrap();
        let png = tmp.path().join("real.png");
        write_test_png(&png, 8, 8);
        let mislabeled = tmp.path().join("actually-png.jpg");
        std::fs::copy(&png, &mislabeled).unwrap();

        let img = RustBackend::new().open_normalized(&mislabeled).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
    }

    #[test]
    fn open_normalized_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = RustBackend::new().open_normalized(&path);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn open_nonexistent_file_errors() {
        let result = RustBackend::new().open_normalized(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn save_each_format_is_decodable() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let image = RgbImage::from_fn(16, 12, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 128]));

        for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP] {
            let dest = tmp.path().join(format!("out.{}", format.extension()));
            backend
                .save(&image, &dest, format, Quality::new(90))
                .unwrap();
            let read_back = image::open(&dest).unwrap();
            assert_eq!((read_back.width(), read_back.height()), (16, 12));
            assert_eq!(
                ImageFormat::from_path(&dest).unwrap(),
                format.image_format()
            );
        }
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("only.png");
        RustBackend::new()
            .save(&RgbImage::new(2, 2), &dest, OutputFormat::Png, Quality::default())
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_refuses_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("taken.jpg");
        std::fs::write(&dest, b"earlier run").unwrap();

        let result = RustBackend::new().save(
            &RgbImage::new(2, 2),
            &dest,
            OutputFormat::Jpeg,
            Quality::default(),
        );
        assert!(matches!(result, Err(BackendError::DestinationExists(_))));
        assert_eq!(std::fs::read(&dest).unwrap(), b"earlier run");
    }

    #[test]
    fn save_with_overwrite_replaces_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("taken.png");
        std::fs::write(&dest, b"earlier run").unwrap();

        RustBackend::new()
            .overwrite(true)
            .save(&RgbImage::new(3, 3), &dest, OutputFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(image::open(&dest).unwrap().width(), 3);
    }

    #[test]
    fn copy_preserves_bytes() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        write_test_png(&source, 5, 5);
        let dest = tmp.path().join("copied.png");

        RustBackend::new().copy(&source, &dest).unwrap();
        assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&dest).unwrap());
    }

    #[test]
    fn copy_missing_source_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("never.png");
        let result = RustBackend::new().copy(&tmp.path().join("missing.png"), &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
