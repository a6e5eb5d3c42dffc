//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the three things the renamer does with
//! image bytes: open an image as normalized RGB, save it in an output format,
//! and copy a file unchanged.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{OutputFormat, Quality};
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),
}

/// Trait for image I/O backends.
///
/// Every write must be all-or-nothing: when a call returns `Err`, no file
/// exists at `dest` that was not there before.
pub trait ImageBackend {
    /// Decode an image and convert it to 8-bit RGB.
    fn open_normalized(&self, path: &Path) -> Result<RgbImage, BackendError>;

    /// Encode `image` as `format` and write it to `dest`.
    fn save(
        &self,
        image: &RgbImage,
        dest: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), BackendError>;

    /// Copy `source` to `dest` byte for byte.
    fn copy(&self, source: &Path, dest: &Path) -> Result<(), BackendError>;
}
