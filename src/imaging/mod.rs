//! Image I/O on the pure-Rust `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Open** | `image::ImageReader` → `into_rgb8` |
//! | **Save** | JPEG / PNG / WebP encoders, staged through a temp file |
//! | **Copy** | `std::io::copy`, staged through a temp file |
//!
//! The module is split into:
//! - **Parameters**: [`Quality`] and [`OutputFormat`]
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use params::{OutputFormat, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};
