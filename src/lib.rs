//! # wallname
//!
//! Renames a directory of images into descriptive, collision-resistant
//! filenames. A captioner describes each image; the caption is normalized into
//! a fixed-length fragment and combined with a date + counter suffix:
//!
//! ```text
//! wallpapers/IMG_0042.png   caption: "a cat sitting on the mat"
//!   → renamed/cat-sitting-mat-wallpaper-290524_001.jpg
//! ```
//!
//! # Pipeline
//!
//! ```text
//! caption(image) → normalize → suffix(date, n) → compose → write
//! ```
//!
//! Each item runs the whole pipeline before the next one starts. A failure
//! anywhere in an item is recorded and the run continues; only setup problems
//! (missing input directory, unavailable captioner, invalid config) stop it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Caption → bounded, hyphen-joined name fragment (pure) |
//! | [`suffix`] | `DDMMYY_NNN` suffix and the per-run [`BatchCounter`](suffix::BatchCounter) |
//! | [`filename`] | `{fragment}-{suffix}.{ext}` composition and extension policy |
//! | [`batch`] | The orchestrator: walk, filter, process, report |
//! | [`caption`] | [`Captioner`](caption::Captioner) trait: external command, sidecar, filename |
//! | [`imaging`] | [`ImageBackend`](imaging::ImageBackend) trait + pure-Rust backend |
//! | [`config`] | `wallname.toml` loading, merging, validation |
//! | [`output`] | Console formatting of per-item lines and the summary |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Explicit Variants
//!
//! Padded vs. loose names, zero-padded vs. bare counters, and convert vs.
//! copy output are all config options ([`config::FitMode`],
//! `suffix.counter_width`, [`config::OutputMode`]). Nothing is chosen silently.
//!
//! ## Injected Collaborators
//!
//! The captioner and image backend are built once in `main` and borrowed by
//! [`batch::Renamer`]. Tests swap in mocks; nothing is global.
//!
//! ## No Partial Files
//!
//! Outputs are staged in a temp file inside the destination directory and
//! persisted in one step. An existing destination is never replaced unless
//! `output.overwrite = true`, so a second run on the same day (which restarts
//! the counter at 1) reports a collision instead of destroying earlier output.

pub mod batch;
pub mod caption;
pub mod config;
pub mod filename;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod suffix;

#[cfg(test)]
pub(crate) mod test_helpers;
