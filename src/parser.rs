//! XDI file reader.
//!
//! Drives the three parsing phases in order: line loading, header parsing and
//! data table ingestion. The first fatal error stops the read. Advisories from
//! every phase are collected on the resulting [`Document`] in the order they
//! were raised.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xdi_processor::XdiReader;
//!
//! # fn example() -> xdi_processor::Result<()> {
//! let doc = XdiReader::default().read(std::path::Path::new("cu_foil.xdi"))?;
//! let energy = doc.get_column("energy")?;
//! println!("{} points from {:.1} eV", doc.npts, energy[0]);
//! # Ok(())
//! # }
//! ```

use crate::config::ReaderConfig;
use crate::constants::DEFAULT_COLUMN_PREFIX;
use crate::error::Result;
use crate::header::{ParsedHeader, parse_header};
use crate::line_reader::{SourceLine, load_lines, split_lines};
use crate::models::{Column, Document, OuterScan};
use crate::table::{ParsedTable, parse_table};
use crate::validator::check_dspacing_for_angle;
use std::path::Path;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Reads XDI files into [`Document`]s
#[derive(Debug, Clone, Default)]
pub struct XdiReader {
    config: ReaderConfig,
}

impl XdiReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read and parse an XDI file
    pub fn read(&self, path: &Path) -> Result<Document> {
        info!("Reading XDI file: {}", path.display());
        let lines = load_lines(path, &self.config)?;
        self.parse_lines(&lines, &path.display().to_string())
    }

    /// Parse XDI text held in memory; `source_name` becomes the document filename
    pub fn parse_str(&self, text: &str, source_name: &str) -> Result<Document> {
        let lines = split_lines(text, &self.config)?;
        self.parse_lines(&lines, source_name)
    }

    fn parse_lines(&self, lines: &[SourceLine], source_name: &str) -> Result<Document> {
        let header = parse_header(lines, &self.config)?;
        let table = parse_table(&lines[header.data_start..], &self.config)?;
        let doc = assemble(header, table, source_name);

        info!(
            "Parsed {}: {} arrays, {} points, {} outer segments, {} advisories",
            doc.filename,
            doc.narrays(),
            doc.npts,
            doc.nouter(),
            doc.advisories.len()
        );
        Ok(doc)
    }
}

/// Read an XDI file with default limits
pub fn read(path: &Path) -> Result<Document> {
    XdiReader::default().read(path)
}

fn assemble(header: ParsedHeader, table: ParsedTable, source_name: &str) -> Document {
    let ParsedHeader {
        xdi_version,
        extra_version,
        metadata,
        element,
        edge,
        dspacing,
        mut column_labels,
        outer_label,
        outer_seed,
        comments,
        mut advisories,
        ..
    } = header;

    let narrays = table.narrays();
    let stray_labels: Vec<usize> = column_labels
        .keys()
        .copied()
        .filter(|&index| index >= narrays)
        .collect();
    for index in stray_labels {
        warn!(
            "Label for column {} ignored: data has only {} columns",
            index + 1,
            narrays
        );
        column_labels.remove(&index);
    }

    let columns: Vec<Column> = table
        .columns
        .into_iter()
        .enumerate()
        .map(|(index, values)| {
            let mut column = match column_labels.remove(&index) {
                Some(label) => Column {
                    label: label.label,
                    unit: label.unit,
                    address: label.address,
                    values: Vec::new(),
                },
                None => Column::new(format!("{DEFAULT_COLUMN_PREFIX}{}", index + 1)),
            };
            column.values = values;
            column
        })
        .collect();

    let mut outer = OuterScan::new(outer_label, outer_seed.unwrap_or_default());
    for breakpoint in table.breakpoints {
        outer.push(breakpoint.value, breakpoint.row);
    }

    let labels: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    if let Err(advisory) = check_dspacing_for_angle(&labels, dspacing) {
        warn!("{}", advisory);
        advisories.push(advisory);
    }
    debug!("Column labels: {:?}", labels);

    let mut doc = Document::new(xdi_version);
    doc.extra_version = extra_version;
    doc.filename = source_name.to_string();
    doc.element = element;
    doc.edge = edge;
    doc.dspacing = dspacing;
    doc.comments = comments.join("\n");
    doc.metadata = metadata;
    doc.npts = table.npts;
    doc.columns = columns;
    doc.outer = outer;
    doc.advisories = advisories;
    doc
}
