//! Rename configuration.
//!
//! Handles loading, validating, and merging `wallname.toml`. A config file is
//! sparse: it is merged key-by-key over the stock defaults, so a file only
//! needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! dry_run = false           # Caption and name files without writing anything
//!
//! [input]
//! extensions = ["jpg", "jpeg", "png", "webp", "bmp", "tiff"]
//! recursive = false         # Descend into subdirectories of the source
//!
//! [naming]
//! min_words = 4             # Word floor, reached with filler words
//! target_length = 25        # Character bound of the name fragment
//! pad_char = "-"            # Right-padding character in "padded" mode
//! fit = "padded"            # "padded" (exactly target_length) or "loose" (<= target_length)
//! stopwords = ["a", "the", "of", ...]
//! filler_words = ["wallpaper", "background", "scene", "image", "landscape", "view"]
//!
//! [suffix]
//! counter_width = 3         # Zero-pad the counter to this width (0 = no padding)
//!
//! [output]
//! mode = "convert"          # "convert" (re-encode) or "copy" (keep bytes and extension)
//! format = "jpeg"           # jpeg | png | webp, used by "convert"
//! quality = 90              # Lossy encoding quality (1-100)
//! overwrite = false         # Replace existing files in the output directory
//!
//! [caption]
//! source = "command"        # command | sidecar | filename
//! command = ["blip-caption"] # Program + args; the image path is appended
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "wallname.toml";

/// Upper bound of `naming.target_length`. Filename components top out near 255 bytes.
pub const MAX_TARGET_LENGTH: usize = 200;

/// Upper bound of `suffix.counter_width`. `u32::MAX` has 10 digits.
pub const MAX_COUNTER_WIDTH: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Rename configuration loaded from `wallname.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameConfig {
    /// Caption and compute names, but write nothing.
    pub dry_run: bool,
    pub input: InputConfig,
    pub naming: NamingConfig,
    pub suffix: SuffixConfig,
    pub output: OutputConfig,
    pub caption: CaptionConfig,
}

impl RenameConfig {
    /// Validate config values are consistent and within acceptable ranges.
    ///
    /// These are design-time errors: a run never starts with an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "input.extensions must not be empty".into(),
            ));
        }
        if self
            .input
            .extensions
            .iter()
            .any(|e| e.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::Validation(
                "input.extensions must not contain empty entries".into(),
            ));
        }
        self.naming.validate()?;
        if self.suffix.counter_width > MAX_COUNTER_WIDTH {
            return Err(ConfigError::Validation(format!(
                "suffix.counter_width must be at most {MAX_COUNTER_WIDTH}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.caption.source == CaptionSource::Command && self.caption.command.is_empty() {
            return Err(ConfigError::Validation(
                "caption.command must name a program when caption.source = \"command\"".into(),
            ));
        }
        Ok(())
    }
}

/// Which files in the source directory are candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Accepted extensions, compared case-insensitively. A leading dot is allowed.
    pub extensions: Vec<String>,
    /// Descend into subdirectories instead of listing only the top level.
    pub recursive: bool,
}

impl InputConfig {
    /// Whether `path` has one of the accepted extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|accepted| accepted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp", "bmp", "tiff"]
                .map(String::from)
                .to_vec(),
            recursive: false,
        }
    }
}

/// How a name fragment is fitted to `target_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Right-pad with `pad_char`; every fragment is exactly `target_length`.
    Padded,
    /// No padding; fragments are at most `target_length`.
    Loose,
}

/// Name normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub min_words: usize,
    pub target_length: usize,
    pub pad_char: char,
    pub fit: FitMode,
    pub stopwords: Vec<String>,
    /// Generic words appended, in order, until `min_words` is reached.
    pub filler_words: Vec<String>,
}

impl NamingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_words == 0 {
            return Err(ConfigError::Validation(
                "naming.min_words must be at least 1".into(),
            ));
        }
        if !(1..=MAX_TARGET_LENGTH).contains(&self.target_length) {
            return Err(ConfigError::Validation(format!(
                "naming.target_length must be 1-{MAX_TARGET_LENGTH}"
            )));
        }
        if !(self.pad_char.is_alphanumeric() || self.pad_char == '-' || self.pad_char == '_') {
            return Err(ConfigError::Validation(format!(
                "naming.pad_char {:?} is not safe in a filename",
                self.pad_char
            )));
        }
        if let Some(bad) = self.filler_words.iter().find(|w| !is_plain_word(w)) {
            return Err(ConfigError::Validation(format!(
                "naming.filler_words entry {bad:?} must be a single lowercase word"
            )));
        }
        let stopwords: HashSet<String> = self.stopwords.iter().map(|s| s.to_lowercase()).collect();
        if let Some(bad) = self.filler_words.iter().find(|w| stopwords.contains(*w)) {
            return Err(ConfigError::Validation(format!(
                "naming.filler_words entry {bad:?} is also a stopword"
            )));
        }
        // An empty caption is filled from fillers alone, so they must cover the floor.
        let distinct: HashSet<&str> = self.filler_words.iter().map(String::as_str).collect();
        if distinct.len() < self.min_words {
            return Err(ConfigError::Validation(format!(
                "naming.filler_words has {} distinct words, need at least min_words = {}",
                distinct.len(),
                self.min_words
            )));
        }
        Ok(())
    }
}

fn is_plain_word(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| (c.is_alphanumeric() || c == '_') && !c.is_uppercase())
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            min_words: 4,
            target_length: 25,
            pad_char: '-',
            fit: FitMode::Padded,
            stopwords: [
                "a", "the", "of", "in", "on", "with", "and", "to", "at", "by", "for", "an",
                "into", "over", "under", "from",
            ]
            .map(String::from)
            .to_vec(),
            filler_words: [
                "wallpaper",
                "background",
                "scene",
                "image",
                "landscape",
                "view",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Uniqueness suffix settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuffixConfig {
    /// Minimum digit count of the counter, zero-padded. `0` leaves it unpadded.
    pub counter_width: usize,
}

impl Default for SuffixConfig {
    fn default() -> Self {
        Self { counter_width: 3 }
    }
}

/// What happens to the bytes of each accepted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Decode, normalize to RGB, and re-encode to `output.format`. The
    /// extension is fixed by the format.
    Convert,
    /// Copy bytes unchanged. The source extension is preserved.
    Copy,
}

/// Output writing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub format: OutputFormat,
    pub quality: u32,
    /// Replace a destination file that already exists (e.g. from an earlier run).
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Convert,
            format: OutputFormat::Jpeg,
            quality: 90,
            overwrite: false,
        }
    }
}

/// Where captions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionSource {
    /// Run an external captioning program per image.
    Command,
    /// Read `<stem>.txt` next to the image.
    Sidecar,
    /// Use the file stem itself.
    Filename,
}

/// Captioner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    pub source: CaptionSource,
    /// Program and leading arguments. The image path is passed as the last argument.
    pub command: Vec<String>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            source: CaptionSource::Command,
            command: vec!["blip-caption".to_string()],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(RenameConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   overlay `stopwords` list replaces the stock list rather than extending it.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<RenameConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: RenameConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config for a run.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present, stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<RenameConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `wallname.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# wallname configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Caption and compute names for every image, but write nothing.
dry_run = false

# ---------------------------------------------------------------------------
# Input selection
# ---------------------------------------------------------------------------
[input]
# Accepted file extensions (case-insensitive). Everything else is skipped silently.
extensions = ["jpg", "jpeg", "png", "webp", "bmp", "tiff"]

# Descend into subdirectories of the source directory.
recursive = false

# ---------------------------------------------------------------------------
# Name normalization
# ---------------------------------------------------------------------------
[naming]
# Every name carries at least this many words; filler words make up the rest.
min_words = 4

# Character bound of the descriptive part of the name (1-200).
target_length = 25

# Padding character used by fit = "padded".
pad_char = "-"

# "padded": names are right-padded to exactly target_length.
# "loose":  names are at most target_length, never padded.
fit = "padded"

# Words never used in a name.
stopwords = ["a", "the", "of", "in", "on", "with", "and", "to", "at", "by", "for", "an", "into", "over", "under", "from"]

# Generic words appended in order until min_words is reached.
# Must hold at least min_words distinct entries, none of them a stopword.
filler_words = ["wallpaper", "background", "scene", "image", "landscape", "view"]

# ---------------------------------------------------------------------------
# Uniqueness suffix (DDMMYY_NNN)
# ---------------------------------------------------------------------------
[suffix]
# Zero-pad the per-run counter to this many digits (at most 10). 0 disables padding.
counter_width = 3

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# "convert": decode and re-encode to `format`; the extension follows the format.
# "copy":    copy bytes unchanged; the source extension is kept.
mode = "convert"

# jpeg | png | webp
format = "jpeg"

# Lossy encoding quality (1 = worst, 100 = best). Only JPEG is lossy.
quality = 90

# Replace files that already exist in the output directory.
overwrite = false

# ---------------------------------------------------------------------------
# Captioning
# ---------------------------------------------------------------------------
[caption]
# "command":  run an external captioning program for each image.
# "sidecar":  read <stem>.txt next to each image.
# "filename": use the file name itself.
source = "command"

# Program and leading arguments. The image path is appended as the last argument;
# the caption is read from standard output.
command = ["blip-caption"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_passes_validation() {
        assert!(RenameConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_naming_config() {
        let toml = r#"
[naming]
target_length = 30
fit = "loose"
"#;
        let overlay: toml::Value = toml::from_str(toml).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.naming.target_length, 30);
        assert_eq!(config.naming.fit, FitMode::Loose);
        assert_eq!(config.naming.min_words, 4);
        assert_eq!(config.output.format, OutputFormat::Jpeg);
    }

    #[test]
    fn parse_output_copy_mode() {
        let toml = r#"
[output]
mode = "copy"
"#;
        let overlay: toml::Value = toml::from_str(toml).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.output.mode, OutputMode::Copy);
        assert_eq!(config.output.quality, 90);
    }

    #[test]
    fn overlay_list_replaces_stock_list() {
        let toml = r#"
[naming]
stopwords = ["very"]
"#;
        let overlay: toml::Value = toml::from_str(toml).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.naming.stopwords, vec!["very".to_string()]);
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[output]\nmode = \"convert\"\nquality = 90").unwrap();
        let overlay: toml::Value = toml::from_str("[output]\nquality = 70").unwrap();
        let merged = merge_toml(base, overlay);
        let output = merged.get("output").unwrap();
        assert_eq!(output.get("mode").unwrap().as_str(), Some("convert"));
        assert_eq!(output.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[naming]\nmax_words = 9").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let overlay: toml::Value = toml::from_str("[model]\nname = \"blip\"").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    #[test]
    fn unknown_variant_rejected() {
        let overlay: toml::Value = toml::from_str("[output]\nformat = \"gif\"").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    #[test]
    fn validate_insufficient_filler_words() {
        let mut config = RenameConfig::default();
        config.naming.filler_words = vec!["wallpaper".into(), "scene".into(), "scene".into()];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("filler_words")));
    }

    #[test]
    fn validate_filler_words_must_be_single_words() {
        let mut config = RenameConfig::default();
        config.naming.filler_words[0] = "wall paper".into();
        assert!(config.validate().is_err());

        config.naming.filler_words[0] = "Wallpaper".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_filler_words_must_not_be_stopwords() {
        let mut config = RenameConfig::default();
        config.naming.stopwords.push("Wallpaper".into());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("stopword")));
    }

    #[test]
    fn validate_length_and_width_upper_bounds() {
        let mut config = RenameConfig::default();
        config.naming.target_length = MAX_TARGET_LENGTH;
        config.suffix.counter_width = MAX_COUNTER_WIDTH;
        assert!(config.validate().is_ok());

        config.naming.target_length = MAX_TARGET_LENGTH + 1;
        assert!(config.validate().is_err());

        let mut config = RenameConfig::default();
        config.suffix.counter_width = 1_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("counter_width")));
    }

    #[test]
    fn validate_empty_extensions() {
        let mut config = RenameConfig::default();
        config.input.extensions.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("extensions")));
    }

    #[test]
    fn validate_zero_lengths() {
        let mut config = RenameConfig::default();
        config.naming.target_length = 0;
        assert!(config.validate().is_err());

        let mut config = RenameConfig::default();
        config.naming.min_words = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_quality_boundaries() {
        let mut config = RenameConfig::default();
        config.output.quality = 100;
        assert!(config.validate().is_ok());
        config.output.quality = 101;
        assert!(config.validate().is_err());
        config.output.quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_pad_char_must_be_filename_safe() {
        let mut config = RenameConfig::default();
        config.naming.pad_char = '/';
        assert!(config.validate().is_err());
        config.naming.pad_char = '_';
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_empty_command_only_for_command_source() {
        let mut config = RenameConfig::default();
        config.caption.command.clear();
        assert!(config.validate().is_err());

        config.caption.source = CaptionSource::Sidecar;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn accepts_extensions_case_insensitively() {
        let input = InputConfig {
            extensions: vec![".JPG".into(), "png".into()],
            recursive: false,
        };
        assert!(input.accepts(Path::new("a/photo.jpg")));
        assert!(input.accepts(Path::new("a/photo.PNG")));
        assert!(!input.accepts(Path::new("a/photo.gif")));
        assert!(!input.accepts(Path::new("a/README")));
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("wallname.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_config_explicit_path_must_exist() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_explicit_path_is_validated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wallname.toml");
        fs::write(&path, "[naming]\nmin_words = 9\n").unwrap();
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let parsed: RenameConfig = value.try_into().unwrap();
        let defaults = RenameConfig::default();
        assert_eq!(parsed.dry_run, defaults.dry_run);
        assert_eq!(parsed.input.extensions, defaults.input.extensions);
        assert_eq!(parsed.naming.min_words, defaults.naming.min_words);
        assert_eq!(parsed.naming.target_length, defaults.naming.target_length);
        assert_eq!(parsed.naming.pad_char, defaults.naming.pad_char);
        assert_eq!(parsed.naming.fit, defaults.naming.fit);
        assert_eq!(parsed.naming.stopwords, defaults.naming.stopwords);
        assert_eq!(parsed.naming.filler_words, defaults.naming.filler_words);
        assert_eq!(parsed.suffix.counter_width, defaults.suffix.counter_width);
        assert_eq!(parsed.output.mode, defaults.output.mode);
        assert_eq!(parsed.output.format, defaults.output.format);
        assert_eq!(parsed.output.quality, defaults.output.quality);
        assert_eq!(parsed.caption.source, defaults.caption.source);
        assert_eq!(parsed.caption.command, defaults.caption.command);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for section in ["input", "naming", "suffix", "output", "caption"] {
            assert!(value.get(section).is_some(), "missing section {section}");
        }
    }
}
