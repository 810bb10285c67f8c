//! Line loading and word splitting.
//!
//! Loads a whole file into trimmed lines, keeping the physical line number of
//! each so later phases can report where a problem was found. Blank lines are
//! dropped. Line count and line length are checked against [`ReaderConfig`].

use crate::config::ReaderConfig;
use crate::error::{Result, XdiError};
use std::path::Path;
use tracing::debug;

/// A trimmed, non-empty line with its 1-based physical line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Read a file into trimmed lines
pub fn load_lines(path: &Path, config: &ReaderConfig) -> Result<Vec<SourceLine>> {
    let bytes = std::fs::read(path).map_err(|source| XdiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // XDI files in the wild carry Latin-1 degree signs and the like
    let text = String::from_utf8_lossy(&bytes);
    let lines = split_lines(&text, config)?;

    debug!(
        "Loaded {} non-blank lines from {}",
        lines.len(),
        path.display()
    );
    Ok(lines)
}

/// Split in-memory text into trimmed lines, enforcing the same limits as [`load_lines`]
pub fn split_lines(text: &str, config: &ReaderConfig) -> Result<Vec<SourceLine>> {
    let mut lines = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        if number > config.max_lines {
            return Err(XdiError::ResourceLimit {
                what: "line count",
                limit: config.max_lines,
                found: text.lines().count(),
                line_number: Some(number),
            });
        }
        if raw.len() > config.max_line_length {
            return Err(XdiError::ResourceLimit {
                what: "line length",
                limit: config.max_line_length,
                found: raw.len(),
                line_number: Some(number),
            });
        }

        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            lines.push(SourceLine::new(number, trimmed));
        }
    }

    Ok(lines)
}

/// Split on whitespace
pub fn split_words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Split once on `delim` into two trimmed parts
///
/// Returns `None` when the delimiter is absent.
pub fn split_on(line: &str, delim: char) -> Option<(&str, &str)> {
    line.split_once(delim)
        .map(|(left, right)| (left.trim(), right.trim()))
}
