//! Captioning collaborators.
//!
//! A [`Captioner`] turns an image into free text describing it. The renamer
//! treats the text as untrusted input; [`naming`](crate::naming) does the rest.
//!
//! | Source | Caption |
//! |---|---|
//! | [`CommandCaptioner`] | stdout of an external program run with the image path |
//! | [`SidecarCaptioner`] | contents of `<stem>.txt` next to the image |
//! | [`FilenameCaptioner`] | the file stem itself |
//!
//! Captioners are built once per run by [`from_config`] and borrowed by the
//! batch orchestrator; availability problems surface here as a
//! [`SetupError`] before any file is touched.

use crate::batch::SetupError;
use crate::config::{CaptionConfig, CaptionSource};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("captioner exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("captioner output is not UTF-8")]
    InvalidOutput,
    #[error("no caption available for {}", .0.display())]
    Missing(PathBuf),
}

/// Produces a caption for one image.
pub trait Captioner {
    fn caption(&self, image: &Path) -> Result<String, CaptionError>;
}

/// Build the captioner selected by `config.source`.
pub fn from_config(config: &CaptionConfig) -> Result<Box<dyn Captioner>, SetupError> {
    Ok(match config.source {
        CaptionSource::Command => Box::new(CommandCaptioner::new(&config.command)?),
        CaptionSource::Sidecar => Box::new(SidecarCaptioner),
        CaptionSource::Filename => Box::new(FilenameCaptioner),
    })
}

/// Runs an external captioning program once per image.
///
/// The program receives the configured arguments followed by the image
/// path, and prints the caption on stdout.
#[derive(Debug, Clone)]
pub struct CommandCaptioner {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCaptioner {
    /// Resolve the program on `PATH` up front so a missing captioner fails the
    /// run instead of every item.
    pub fn new(command: &[String]) -> Result<Self, SetupError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SetupError::CaptionerUnavailable("empty caption command".into()))?;
        let resolved = which::which(program)
            .map_err(|e| SetupError::CaptionerUnavailable(format!("{program}: {e}")))?;
        Ok(Self {
            program: resolved,
            args: args.to_vec(),
        })
    }
}

impl Captioner for CommandCaptioner {
    fn caption(&self, image: &Path) -> Result<String, CaptionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(CaptionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8(output.stdout).map_err(|_| CaptionError::InvalidOutput)?;
        Ok(text.trim().to_string())
    }
}

/// Reads the caption from a sidecar `.txt` file.
///
/// Given `wallpapers/dsc0042.jpg`, reads `wallpapers/dsc0042.txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarCaptioner;

impl Captioner for SidecarCaptioner {
    fn caption(&self, image: &Path) -> Result<String, CaptionError> {
        let sidecar = image.with_extension("txt");
        if !sidecar.exists() {
            return Err(CaptionError::Missing(sidecar));
        }
        let text = std::fs::read_to_string(&sidecar)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CaptionError::Missing(sidecar));
        }
        Ok(text.to_string())
    }
}

/// Uses the file stem as the caption, with `_` treated as a separator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameCaptioner;

impl Captioner for FilenameCaptioner {
    fn caption(&self, image: &Path) -> Result<String, CaptionError> {
        image
            .file_stem()
            .map(|stem| stem.to_string_lossy().replace('_', " "))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| CaptionError::Missing(image.to_path_buf()))
    }
}
