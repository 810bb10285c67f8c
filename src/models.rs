//! Core data structures for XDI documents.
//!
//! A [`Document`] is built once by the parser and is read-only afterwards.
//! Metadata keeps every entry in file order; columns keep file order and all
//! share the same length.

use crate::constants::{TIMESTAMP_FORMATS, XDI_LIBRARY_VERSION, fields};
use crate::error::{Advisory, Result, XdiError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// One `Family.Key: Value` line from the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub family: String,
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(family: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive match on family and key
    pub fn is(&self, family: &str, key: &str) -> bool {
        self.family.eq_ignore_ascii_case(family) && self.key.eq_ignore_ascii_case(key)
    }
}

/// A labelled data column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub unit: Option<String>,
    /// Hardware address given after `||` in the `column.N` value
    pub address: Option<String>,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            unit: None,
            address: None,
            values: Vec::new(),
        }
    }
}

/// Start of one segment of a 2D scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Value of the outer scan variable for this segment
    pub value: f64,
    /// Index of the first data row of this segment
    pub row: usize,
}

/// Secondary scan dimension; always holds a breakpoint at row 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OuterScan {
    pub label: Option<String>,
    pub breakpoints: Vec<Breakpoint>,
}

impl OuterScan {
    /// Outer scan with only the initial breakpoint
    pub fn new(label: Option<String>, seed: f64) -> Self {
        Self {
            label,
            breakpoints: vec![Breakpoint { value: seed, row: 0 }],
        }
    }

    pub fn push(&mut self, value: f64, row: usize) {
        self.breakpoints.push(Breakpoint { value, row });
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Whether the data holds more than one segment
    pub fn is_2d(&self) -> bool {
        self.breakpoints.len() > 1
    }
}

impl Default for OuterScan {
    fn default() -> Self {
        Self::new(None, 0.0)
    }
}

/// Selects a column by 0-based index or by case-insensitive label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSelector<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ColumnSelector<'_> {
    fn from(index: usize) -> Self {
        ColumnSelector::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnSelector<'a> {
    fn from(name: &'a str) -> Self {
        ColumnSelector::Name(name)
    }
}

/// A fully parsed XDI file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Version string from the `XDI/<version>` token
    pub xdi_version: String,
    /// Extension tags following the version token, verbatim
    pub extra_version: Option<String>,
    /// Version of this library
    pub library_version: String,
    /// Source file name, or the name given for in-memory input
    pub filename: String,
    /// `element.symbol`, unvalidated
    pub element: Option<String>,
    /// `element.edge`, unvalidated
    pub edge: Option<String>,
    /// `mono.d_spacing`, when numeric
    pub dspacing: Option<f64>,
    /// User comment block, one line per comment line
    pub comments: String,
    pub metadata: Vec<MetadataEntry>,
    pub columns: Vec<Column>,
    pub npts: usize,
    pub outer: OuterScan,
    /// Advisories raised while reading, oldest first
    pub advisories: Vec<Advisory>,
}

impl Document {
    /// Empty document with the given version, ready to be filled in
    pub fn new(xdi_version: impl Into<String>) -> Self {
        Self {
            xdi_version: xdi_version.into(),
            extra_version: None,
            library_version: XDI_LIBRARY_VERSION.to_string(),
            filename: String::new(),
            element: None,
            edge: None,
            dspacing: None,
            comments: String::new(),
            metadata: Vec::new(),
            columns: Vec::new(),
            npts: 0,
            outer: OuterScan::default(),
            advisories: Vec::new(),
        }
    }

    pub fn narrays(&self) -> usize {
        self.columns.len()
    }

    /// Number of outer-scan segments, at least 1
    pub fn nouter(&self) -> usize {
        self.outer.len().max(1)
    }

    /// Number of columns labelled by a `column.N` entry
    pub fn narray_labels(&self) -> usize {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let key = (i + 1).to_string();
                self.metadata_value(fields::COLUMN_FAMILY, &key).is_some()
            })
            .count()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// Values of one column, by index or label
    pub fn get_column<'a>(&self, selector: impl Into<ColumnSelector<'a>>) -> Result<&[f64]> {
        match selector.into() {
            ColumnSelector::Index(index) => self
                .columns
                .get(index)
                .map(|c| c.values.as_slice())
                .ok_or(XdiError::ColumnIndexOutOfRange {
                    index,
                    narrays: self.columns.len(),
                }),
            ColumnSelector::Name(name) => self
                .columns
                .iter()
                .find(|c| c.label.eq_ignore_ascii_case(name))
                .map(|c| c.values.as_slice())
                .ok_or_else(|| XdiError::ColumnNameNotFound {
                    name: name.to_string(),
                }),
        }
    }

    /// One data row across all columns, `None` past the end of any column
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.npts {
            return None;
        }
        self.columns.iter().map(|c| c.values.get(index).copied()).collect()
    }

    /// First value recorded for `family.key`, ignoring case
    pub fn metadata_value(&self, family: &str, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.is(family, key))
            .map(|m| m.value.as_str())
    }

    /// Every value recorded for `family.key`, in file order
    pub fn metadata_values<'a>(
        &'a self,
        family: &'a str,
        key: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.metadata
            .iter()
            .filter(move |m| m.is(family, key))
            .map(|m| m.value.as_str())
    }

    pub fn has_metadata(&self, family: &str, key: &str) -> bool {
        self.metadata.iter().any(|m| m.is(family, key))
    }

    /// Nested `family -> key -> value` view, lower-cased; later entries win
    pub fn metadata_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut map: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for entry in &self.metadata {
            map.entry(entry.family.to_lowercase())
                .or_default()
                .insert(entry.key.to_lowercase(), entry.value.clone());
        }
        map
    }

    /// Lower-cased names of the extension families declared on line 1
    pub fn extension_families(&self) -> Vec<String> {
        self.extra_version
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter_map(|tag| {
                let name = tag.split('/').next().unwrap_or_default();
                (!name.is_empty()).then(|| name.to_lowercase())
            })
            .collect()
    }

    /// Row ranges of each outer-scan segment
    pub fn outer_segments(&self) -> Vec<Range<usize>> {
        let starts: Vec<usize> = self.outer.breakpoints.iter().map(|b| b.row).collect();
        if starts.is_empty() {
            return vec![0..self.npts];
        }
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(self.npts);
                start.min(self.npts)..end.min(self.npts)
            })
            .collect()
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        let (family, key) = fields::SCAN_START_TIME;
        self.metadata_value(family, key).and_then(parse_timestamp)
    }

    pub fn end_time(&self) -> Option<NaiveDateTime> {
        let (family, key) = fields::SCAN_END_TIME;
        self.metadata_value(family, key).and_then(parse_timestamp)
    }

    pub fn last_advisory(&self) -> Option<&Advisory> {
        self.advisories.last()
    }

    /// All advisory codes OR-ed together
    pub fn advisory_code(&self) -> u32 {
        self.advisories.iter().fold(0, |acc, a| acc | a.code())
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
