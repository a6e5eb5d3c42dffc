//! Caption → filename fragment normalization.
//!
//! A caption is free text from a captioning model: any length, any case,
//! punctuation, Unicode, sometimes empty. This module turns it into a short,
//! readable, hyphen-joined fragment with a fixed length contract:
//!
//! ```text
//! "A cat sitting on the mat."  →  tokens   [cat, sitting, mat]
//!                              →  filled   [cat, sitting, mat, wallpaper]
//!                              →  fragment "cat-sitting-mat-wallpaper"
//! ```
//!
//! ## Steps
//!
//! 1. Lower-case and split into runs of word characters (letters, digits, `_`).
//! 2. Drop stopwords.
//! 3. Drop repeats, keeping the first occurrence.
//! 4. Append filler words until `min_words` is reached.
//! 5. Join the leading `min_words` tokens; while the result is longer than
//!    `target_length`, drop the last token and retry. The first fit wins and
//!    is padded with `pad_char` ([`FitMode::Padded`]).
//! 6. If not even one token fits, join everything and cut at `target_length`.
//!
//! Lengths are counted in `char`s, so a cut never lands inside a UTF-8 sequence.

use crate::config::{FitMode, NamingConfig};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

const JOINER: char = '-';

/// Split text into lowercase word tokens, in order, repeats included.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Normalize a caption with a one-off [`Normalizer`].
pub fn normalize(caption: &str, config: &NamingConfig) -> String {
    Normalizer::new(config).normalize(caption)
}

/// Caption normalizer built once per run from [`NamingConfig`].
///
/// Holds no state between calls: the same caption always yields the same fragment.
#[derive(Debug, Clone)]
pub struct Normalizer {
    min_words: usize,
    target_length: usize,
    pad_char: char,
    fit: FitMode,
    filler_words: Vec<String>,
    stopwords: HashSet<String>,
}

impl Normalizer {
    pub fn new(config: &NamingConfig) -> Self {
        Self {
            min_words: config.min_words,
            target_length: config.target_length,
            pad_char: config.pad_char,
            fit: config.fit,
            filler_words: config.filler_words.clone(),
            stopwords: config.stopwords.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Tokens worth naming a file after: lowercase, no stopwords, no repeats.
    pub fn content_tokens(&self, caption: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        tokenize(caption)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Append filler words not already present (and not stopwords) until
    /// `min_words` is reached.
    ///
    /// Stops early if the filler list runs out; config validation guarantees
    /// it holds enough distinct words.
    fn fill(&self, tokens: &mut Vec<String>) {
        for filler in &self.filler_words {
            if tokens.len() >= self.min_words {
                break;
            }
            if !tokens.contains(filler) && !self.stopwords.contains(filler) {
                tokens.push(filler.clone());
            }
        }
    }

    /// Turn a caption into a name fragment of at most `target_length` chars
    /// (exactly `target_length` in padded mode).
    pub fn normalize(&self, caption: &str) -> String {
        let mut tokens = self.content_tokens(caption);
        self.fill(&mut tokens);

        let longest = self.min_words.min(tokens.len());
        for count in (1..=longest).rev() {
            let candidate = join(&tokens[..count]);
            if char_len(&candidate) <= self.target_length {
                return self.finish(candidate);
            }
        }

        // Even the first token is too long, so the cut lands inside it.
        let cut: String = join(&tokens).chars().take(self.target_length).collect();
        self.finish(cut)
    }

    fn finish(&self, mut fragment: String) -> String {
        if self.fit == FitMode::Padded {
            let missing = self.target_length.saturating_sub(char_len(&fragment));
            fragment.extend(std::iter::repeat_n(self.pad_char, missing));
        }
        fragment
    }
}

fn join(tokens: &[String]) -> String {
    tokens.join(&JOINER.to_string())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
