//! Output filename composition: `{fragment}-{suffix}.{extension}`.

use crate::config::{OutputConfig, OutputMode};
use std::path::Path;

/// Join the parts of an output filename. An empty extension yields no trailing dot.
pub fn compose(fragment: &str, suffix: &str, extension: &str) -> String {
    if extension.is_empty() {
        format!("{fragment}-{suffix}")
    } else {
        format!("{fragment}-{suffix}.{extension}")
    }
}

/// Extension of the file written for `source`.
///
/// - [`OutputMode::Convert`]: fixed by the target format (`jpeg` → `jpg`).
/// - [`OutputMode::Copy`]: the source extension, lower-cased.
pub fn output_extension(output: &OutputConfig, source: &Path) -> String {
    match output.mode {
        OutputMode::Convert => output.format.extension().to_string(),
        OutputMode::Copy => source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
    }
}
