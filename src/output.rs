//! CLI output formatting.
//!
//! One line per processed item, then a summary:
//!
//! ```text
//! IMG_0042.png → cat-sitting-mat-wallpaper-290524_001.jpg
//! broken.jpg: Processing failed: Failed to decode wallpapers/broken.jpg: ...
//! DSC_1182.webp → sunset-sea-wallpaper------290524_002.jpg
//!
//! Renamed 2 of 3 images (1 failed)
//! ```
//!
//! Dry-run lines read `would rename →` so a preview is never mistaken for
//! real output.
//!
//! Each `format_*` function is pure (returns `String`/`Vec<String>`) and has a
//! `print_*` wrapper that writes to stdout.

use crate::batch::{BatchReport, RenameEvent};
use std::path::Path;

/// File name for display, falling back to the full path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format the line for one item as it completes.
pub fn format_rename_event(event: &RenameEvent) -> String {
    match event {
        RenameEvent::Renamed {
            source,
            destination,
        } => format!("{} → {}", display_name(source), display_name(destination)),
        RenameEvent::Planned {
            source,
            destination,
        } => format!(
            "{} would rename → {}",
            display_name(source),
            display_name(destination)
        ),
        RenameEvent::Failed { source, error } => format!("{}: {}", display_name(source), error),
    }
}

/// Format the end-of-run summary.
pub fn format_summary(report: &BatchReport, dry_run: bool) -> Vec<String> {
    let total = report.records.len();
    let succeeded = report.succeeded();
    let failed = report.failed();
    let verb = if dry_run { "Would rename" } else { "Renamed" };

    let mut lines = vec![String::new()];
    if total == 0 {
        lines.push("No images found".to_string());
    } else if failed == 0 {
        lines.push(format!("{verb} {succeeded} of {total} images"));
    } else {
        lines.push(format!("{verb} {succeeded} of {total} images ({failed} failed)"));
    }
    lines
}

pub fn print_summary(report: &BatchReport, dry_run: bool) {
    for line in format_summary(report, dry_run) {
        println!("{}", line);
    }
}
