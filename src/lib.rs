//! XDI Processor Library
//!
//! A Rust library for reading, validating and writing XDI files, the
//! plaintext metadata-plus-table format used for synchrotron X-ray absorption
//! spectroscopy data.
//!
//! This library provides tools for:
//! - Parsing XDI files into an in-memory [`Document`] with ordered metadata,
//!   labelled columns and outer-scan breakpoints for 2D data
//! - Validating metadata values against the XDI dictionary rules
//! - Checking required and recommended metadata policies
//! - Writing documents back to canonical XDI text
//!
//! Problems that make a file unreadable are fatal [`XdiError`]s. Everything
//! else is reported as an [`Advisory`] collected on the document.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod line_reader;
pub mod models;
pub mod parser;
pub mod table;
pub mod validator;
pub mod writer;

use std::path::Path;

// Re-export commonly used types
pub use config::{ReaderConfig, WriterConfig, XdiConfig};
pub use error::{Advisory, AdvisoryKind, Result, XdiError};
pub use models::{Breakpoint, Column, ColumnSelector, Document, MetadataEntry, OuterScan};
pub use parser::{XdiReader, read};
pub use validator::{
    MetadataCheck, RecommendedFlags, RequiredFlags, ValidationResult, recommended_metadata,
    required_metadata, validate_document, validate_item,
};
pub use writer::{format_significant, render, write_document};

/// Write a document to `path` with default formatting
pub fn write(doc: &Document, path: &Path) -> Result<()> {
    write_document(doc, path, &WriterConfig::default())
}

/// Values of one column, by 0-based index or case-insensitive label
pub fn get_column<'d, 's>(
    doc: &'d Document,
    selector: impl Into<ColumnSelector<'s>>,
) -> Result<&'d [f64]> {
    doc.get_column(selector)
}
