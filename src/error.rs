//! Error handling for XDI reading, validation and writing.
//!
//! Two severities are modelled. [`XdiError`] is fatal: parsing stops at the
//! first one. [`Advisory`] is non-blocking: the document is still produced
//! and the advisories are collected on it in the order they were raised.

use crate::constants::{advisory_codes, error_codes};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XdiError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not an XDI file: {reason}")]
    NotXdiFormat { reason: String, line: String },

    #[error("invalid family name '{family}' in metadata at line {line_number}")]
    FamilyNameInvalid {
        family: String,
        line_number: usize,
        line: String,
    },

    #[error("invalid keyword name '{key}' in metadata at line {line_number}")]
    KeyNameInvalid {
        key: String,
        line_number: usize,
        line: String,
    },

    #[error("metadata not formatted as Family.Key: Value at line {line_number}: '{line}'")]
    MetadataFormatInvalid { line_number: usize, line: String },

    #[error(
        "number of columns changes at line {line_number}: expected {expected}, found {found}"
    )]
    ColumnCountChanged {
        expected: usize,
        found: usize,
        line_number: usize,
        line: String,
    },

    #[error("non-numeric value '{token}' at line {line_number}")]
    NonNumericValue {
        token: String,
        line_number: usize,
        line: String,
    },

    #[error("data table needs at least two rows, found {rows}")]
    OnlyOneDataRow { rows: usize },

    #[error("resource limit exceeded: {what} is {found}, limit is {limit}")]
    ResourceLimit {
        what: &'static str,
        limit: usize,
        found: usize,
        line_number: Option<usize>,
    },

    #[error("no array with name '{name}'")]
    ColumnNameNotFound { name: String },

    #[error("no array at index {index} ({narrays} arrays)")]
    ColumnIndexOutOfRange { index: usize, narrays: usize },
}

impl XdiError {
    /// Classic numeric code for this error (always negative)
    pub fn code(&self) -> i32 {
        match self {
            Self::Io { .. } => error_codes::IO,
            Self::NotXdiFormat { .. } => error_codes::NOT_XDI,
            Self::FamilyNameInvalid { .. } => error_codes::META_FAMILY_NAME,
            Self::KeyNameInvalid { .. } => error_codes::META_KEY_NAME,
            Self::MetadataFormatInvalid { .. } => error_codes::META_FORMAT,
            Self::ColumnCountChanged { .. } => error_codes::NCOLS_CHANGE,
            Self::NonNumericValue { .. } => error_codes::NON_NUMERIC,
            Self::OnlyOneDataRow { .. } => error_codes::ONE_DATA_ROW,
            Self::ResourceLimit { .. } => error_codes::RESOURCE_LIMIT,
            Self::ColumnNameNotFound { .. } => error_codes::NO_ARRAY_NAME,
            Self::ColumnIndexOutOfRange { .. } => error_codes::NO_ARRAY_INDEX,
        }
    }

    /// 1-based line number of the offending line, if the error concerns one
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::NotXdiFormat { .. } => Some(1),
            Self::FamilyNameInvalid { line_number, .. }
            | Self::KeyNameInvalid { line_number, .. }
            | Self::MetadataFormatInvalid { line_number, .. }
            | Self::ColumnCountChanged { line_number, .. }
            | Self::NonNumericValue { line_number, .. } => Some(*line_number),
            Self::ResourceLimit { line_number, .. } => *line_number,
            _ => None,
        }
    }

    /// Text of the offending line, if the error concerns one
    pub fn line_text(&self) -> Option<&str> {
        match self {
            Self::NotXdiFormat { line, .. }
            | Self::FamilyNameInvalid { line, .. }
            | Self::KeyNameInvalid { line, .. }
            | Self::MetadataFormatInvalid { line, .. }
            | Self::ColumnCountChanged { line, .. }
            | Self::NonNumericValue { line, .. } => Some(line.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, XdiError>;

/// Kinds of non-blocking problems found while reading or validating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdvisoryKind {
    MissingSeparator,
    IgnoredHeaderLine,
    NoDspacingForAngle,
    UnversionedExtensionField,
    BadColumn1Label,
    NoElement,
    NoEdge,
    BadReferenceElement,
    BadReferenceEdge,
    BadTimestampFormat,
    BadTimestampRange,
    BadDspacing,
    BadSampleField,
    BadFacilityField,
}

impl AdvisoryKind {
    /// Numeric code for this advisory (a single bit)
    pub fn code(&self) -> u32 {
        match self {
            Self::NoElement => advisory_codes::NO_ELEMENT,
            Self::NoEdge => advisory_codes::NO_EDGE,
            Self::BadReferenceElement => advisory_codes::BAD_REFERENCE_ELEMENT,
            Self::BadReferenceEdge => advisory_codes::BAD_REFERENCE_EDGE,
            Self::UnversionedExtensionField => advisory_codes::UNVERSIONED_EXTENSION,
            Self::BadColumn1Label => advisory_codes::BAD_COLUMN1_LABEL,
            Self::BadDspacing => advisory_codes::BAD_DSPACING,
            Self::BadSampleField => advisory_codes::BAD_SAMPLE_FIELD,
            Self::BadFacilityField => advisory_codes::BAD_FACILITY_FIELD,
            Self::BadTimestampFormat => advisory_codes::BAD_TIMESTAMP_FORMAT,
            Self::BadTimestampRange => advisory_codes::BAD_TIMESTAMP_RANGE,
            Self::NoDspacingForAngle => advisory_codes::NO_DSPACING_FOR_ANGLE,
            Self::MissingSeparator => advisory_codes::MISSING_SEPARATOR,
            Self::IgnoredHeaderLine => advisory_codes::IGNORED_HEADER_LINE,
        }
    }

    /// Standard description of this advisory
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingSeparator => "no line of minus signs '#-----' separating header from data",
            Self::IgnoredHeaderLine => "contains unrecognized header lines",
            Self::NoDspacingForAngle => "no mono.d_spacing given with angle array",
            Self::UnversionedExtensionField => {
                "extension field used without versioning information"
            }
            Self::BadColumn1Label => "column.1 is not 'energy' or 'angle'",
            Self::NoElement => "element.symbol missing or not valid",
            Self::NoEdge => "element.edge missing or not valid",
            Self::BadReferenceElement => "element.reference not valid",
            Self::BadReferenceEdge => "element.ref_edge not valid",
            Self::BadTimestampFormat => "invalid timestamp: format should be YYYY-MM-DD HH:MM:SS",
            Self::BadTimestampRange => "invalid timestamp: date out of valid range",
            Self::BadDspacing => "bad value for mono.d_spacing",
            Self::BadSampleField => "bad value in sample family",
            Self::BadFacilityField => "bad value in facility family",
        }
    }
}

/// A non-blocking problem, with the line it was raised on when known
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
    pub line_number: Option<usize>,
    pub line: Option<String>,
}

impl Advisory {
    /// Create an advisory that is not tied to a source line
    pub fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line_number: None,
            line: None,
        }
    }

    /// Create an advisory using the standard description for its kind
    pub fn of(kind: AdvisoryKind) -> Self {
        Self::new(kind, kind.description())
    }

    /// Attach the source line that raised this advisory
    pub fn at_line(mut self, line_number: usize, line: impl Into<String>) -> Self {
        self.line_number = Some(line_number);
        self.line = Some(line.into());
        self
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }
}
