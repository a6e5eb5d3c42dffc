//! Batch orchestration: one sequential pass over a directory of images.
//!
//! ```text
//! Init      create output dir, counter = 1, capture today's date
//! Iterate   walk the source dir once, sorted by file name
//! Filter    regular files with an accepted extension (others skipped silently)
//! Process   caption → normalize → suffix → compose → write
//! Finalize  report; earlier successes are never rolled back
//! ```
//!
//! ## Failure isolation
//!
//! Every step of an item returns `Result<_, ItemError>`. An `Err` ends that
//! item only: it is recorded in the [`BatchReport`] and the walk moves on.
//! Only [`SetupError`]s (missing input, unusable output dir, bad config)
//! abort a run, and they happen before the first item is processed.
//!
//! ## Counter policy
//!
//! The [`BatchCounter`] is advanced after an item is written, never before.
//! A failed item leaves no file and consumes no number, so the next item
//! gets the value the failed one would have had.

use crate::caption::{CaptionError, Captioner};
use crate::config::{ConfigError, InputConfig, OutputMode, RenameConfig};
use crate::filename;
use crate::imaging::{BackendError, ImageBackend, Quality, supported_input_extensions};
use crate::naming::Normalizer;
use crate::suffix::{self, BatchCounter};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

/// Fatal errors: the run does not start.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Captioner unavailable: {0}")]
    CaptionerUnavailable(String),
    #[error("Input directory not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("Input directory {} is unreadable: {source}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot create output directory {}: {source}", .path.display())]
    OutputUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why a single item failed. Never escapes the item boundary.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("caption failed: {0}")]
    Caption(#[from] CaptionError),
    #[error("{0}")]
    Io(#[from] BackendError),
    #[error("cannot read directory entry: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What happened to one accepted input file.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Written to the destination.
    Renamed,
    /// Dry run: would have been written to the destination.
    Planned,
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: ItemError,
    },
}

fn serialize_display<S: Serializer>(error: &ItemError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// One line of the run log.
#[derive(Debug, Serialize)]
pub struct OutputRecord {
    pub source: PathBuf,
    /// Computed destination; `None` if the item failed before a name existed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl OutputRecord {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed { .. })
    }
}

/// Progress event sent while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum RenameEvent {
    Renamed {
        source: PathBuf,
        destination: PathBuf,
    },
    Planned {
        source: PathBuf,
        destination: PathBuf,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

impl From<&OutputRecord> for RenameEvent {
    fn from(record: &OutputRecord) -> Self {
        let source = record.source.clone();
        let destination = record.destination.clone().unwrap_or_default();
        match &record.outcome {
            Outcome::Renamed => RenameEvent::Renamed {
                source,
                destination,
            },
            Outcome::Planned => RenameEvent::Planned {
                source,
                destination,
            },
            Outcome::Failed { error } => RenameEvent::Failed {
                source,
                error: error.to_string(),
            },
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub date: NaiveDate,
    pub records: Vec<OutputRecord>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// Renames one directory of images.
///
/// The captioner and backend are constructed by the caller and borrowed for
/// the whole run.
pub struct Renamer<'a> {
    config: &'a RenameConfig,
    normalizer: Normalizer,
    captioner: &'a dyn Captioner,
    backend: &'a dyn ImageBackend,
    date: NaiveDate,
}

impl<'a> Renamer<'a> {
    pub fn new(
        config: &'a RenameConfig,
        captioner: &'a dyn Captioner,
        backend: &'a dyn ImageBackend,
    ) -> Self {
        Self {
            config,
            normalizer: Normalizer::new(&config.naming),
            captioner,
            backend,
            date: chrono::Local::now().date_naive(),
        }
    }

    /// Use a fixed date for the suffix instead of today.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Process every accepted file in `source`, writing into `output`.
    ///
    /// Item failures are part of the returned report; `Err` means the run
    /// never started.
    pub fn run(
        &self,
        source: &Path,
        output: &Path,
        events: Option<Sender<RenameEvent>>,
    ) -> Result<BatchReport, SetupError> {
        self.setup(source, output)?;

        let output_dir = std::fs::canonicalize(output).ok();
        let mut counter = BatchCounter::new();
        let mut records = Vec::new();

        for entry in self.candidates(source, output_dir) {
            let record = match entry {
                Ok(path) => self.process(path, output, &mut counter),
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    OutputRecord {
                        source: path,
                        destination: None,
                        outcome: Outcome::Failed { error: e.into() },
                    }
                }
            };
            if let Some(tx) = &events {
                tx.send(RenameEvent::from(&record)).ok();
            }
            records.push(record);
        }

        let report = BatchReport {
            date: self.date,
            records,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "run complete"
        );
        Ok(report)
    }

    fn setup(&self, source: &Path, output: &Path) -> Result<(), SetupError> {
        self.config.validate()?;

        if !source.is_dir() {
            return Err(SetupError::InputMissing(source.to_path_buf()));
        }
        std::fs::read_dir(source).map_err(|e| SetupError::InputUnreadable {
            path: source.to_path_buf(),
            source: e,
        })?;

        if self.config.output.mode == OutputMode::Convert {
            let decodable = supported_input_extensions();
            for ext in &self.config.input.extensions {
                let ext = ext.trim_start_matches('.').to_lowercase();
                if !decodable.contains(&ext.as_str()) {
                    warn!(extension = %ext, "accepted extension has no decoder; those files will fail");
                }
            }
        }

        if !self.config.dry_run {
            std::fs::create_dir_all(output).map_err(|e| SetupError::OutputUnavailable {
                path: output.to_path_buf(),
                source: e,
            })?;
        }
        info!(source = %source.display(), output = %output.display(), date = %self.date, "starting run");
        Ok(())
    }

    /// Accepted files under `source`, in file-name order.
    ///
    /// The output directory is never descended into, so a recursive run over
    /// its own parent does not pick up files it just wrote.
    fn candidates(
        &self,
        source: &Path,
        output_dir: Option<PathBuf>,
    ) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + '_ {
        let max_depth = if self.config.input.recursive {
            usize::MAX
        } else {
            1
        };
        WalkDir::new(source)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                !(e.file_type().is_dir()
                    && output_dir.is_some()
                    && std::fs::canonicalize(e.path()).ok() == output_dir)
            })
            .filter_map(move |entry| match entry {
                Ok(e) if e.file_type().is_file() && self.config.input.accepts(e.path()) => {
                    Some(Ok(e.into_path()))
                }
                Ok(e) => {
                    debug!(path = %e.path().display(), "skipped");
                    None
                }
                Err(e) if not_a_candidate(&e, &self.config.input) => {
                    debug!(path = ?e.path(), error = %e, "skipped");
                    None
                }
                Err(e) => Some(Err(e)),
            })
    }

    fn process(&self, path: PathBuf, output: &Path, counter: &mut BatchCounter) -> OutputRecord {
        let span = info_span!("item", n = counter.current(), source = %path.display());
        let _enter = span.enter();

        let destination = match self.plan(&path, output, counter.current()) {
            Ok(destination) => destination,
            Err(error) => {
                warn!(%error, "item failed");
                return OutputRecord {
                    source: path,
                    destination: None,
                    outcome: Outcome::Failed { error },
                };
            }
        };

        if self.config.dry_run {
            counter.advance();
            info!(destination = %destination.display(), "planned");
            return OutputRecord {
                source: path,
                destination: Some(destination),
                outcome: Outcome::Planned,
            };
        }

        match self.write(&path, &destination) {
            Ok(()) => {
                counter.advance();
                info!(destination = %destination.display(), "renamed");
                OutputRecord {
                    source: path,
                    destination: Some(destination),
                    outcome: Outcome::Renamed,
                }
            }
            Err(error) => {
                warn!(%error, "item failed");
                OutputRecord {
                    source: path,
                    destination: Some(destination),
                    outcome: Outcome::Failed { error },
                }
            }
        }
    }

    /// Caption the image and compute its destination path.
    fn plan(&self, path: &Path, output: &Path, n: u32) -> Result<PathBuf, ItemError> {
        let caption = self.captioner.caption(path)?;
        debug!(%caption, "captioned");

        let fragment = self.normalizer.normalize(&caption);
        let suffix = suffix::suffix(self.date, n, self.config.suffix.counter_width);
        let extension = filename::output_extension(&self.config.output, path);
        let name = filename::compose(&fragment, &suffix, &extension);
        debug!(%fragment, %name, "named");

        Ok(output.join(name))
    }

    fn write(&self, path: &Path, destination: &Path) -> Result<(), ItemError> {
        let output = &self.config.output;
        match output.mode {
            OutputMode::Convert => {
                let image = self.backend.open_normalized(path)?;
                self.backend
                    .save(&image, destination, output.format, Quality::new(output.quality))?;
            }
            OutputMode::Copy => self.backend.copy(path, destination)?,
        }
        Ok(())
    }
}

/// Walk errors on entries that would have been filtered out anyway.
///
/// A broken symlink is not a regular file, and an unreadable entry with an
/// unaccepted extension would never have been processed. Failures to list a
/// directory are still reported.
fn not_a_candidate(error: &walkdir::Error, input: &InputConfig) -> bool {
    let Some(path) = error.path() else {
        return false;
    };
    if error.depth() == 0 {
        return false;
    }
    let vanished = error
        .io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
    vanished || (!input.accepts(path) && !path.is_dir())
}
