//! Configuration management.
//!
//! Provides the resource ceilings enforced while reading and the
//! formatting options used when writing XDI files.

use crate::constants::{
    DEFAULT_FIELD_WIDTH, DEFAULT_MAX_COLUMNS, DEFAULT_MAX_LINE_LENGTH, DEFAULT_MAX_LINES,
    DEFAULT_SIGNIFICANT_DIGITS,
};
use serde::{Deserialize, Serialize};

/// Limits applied while reading a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Maximum number of physical lines in a file
    pub max_lines: usize,

    /// Maximum length of a single line in bytes, before trimming
    pub max_line_length: usize,

    /// Maximum number of columns in the data table
    pub max_columns: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }
}

impl ReaderConfig {
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }
}

/// Formatting options for serialising a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Significant digits for each data value (`%g` style)
    pub significant_digits: usize,

    /// Minimum width of each data field, right aligned
    pub field_width: usize,

    /// Re-emit `outer.value` markers for 2D scans
    pub emit_outer_breakpoints: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
            field_width: DEFAULT_FIELD_WIDTH,
            emit_outer_breakpoints: true,
        }
    }
}

impl WriterConfig {
    pub fn with_significant_digits(mut self, digits: usize) -> Self {
        self.significant_digits = digits.max(1);
        self
    }

    pub fn with_field_width(mut self, width: usize) -> Self {
        self.field_width = width;
        self
    }

    /// Drop `outer.value` markers from the data table when writing
    pub fn without_outer_breakpoints(mut self) -> Self {
        self.emit_outer_breakpoints = false;
        self
    }
}

/// Global configuration for XDI processing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XdiConfig {
    pub reader: ReaderConfig,
    pub writer: WriterConfig,
}

impl XdiConfig {
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }
}
