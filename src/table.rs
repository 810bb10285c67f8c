//! Numeric data table ingestion.
//!
//! The first row fixes the number of columns; every later row must match it.
//! Comment lines inside the table are skipped, except `# outer.value: v`
//! markers, which open a new segment of a 2D scan at the current row.

use crate::config::ReaderConfig;
use crate::constants::{TOK_COMMENT, TOK_DELIM, TOK_DOT, fields};
use crate::error::{Result, XdiError};
use crate::line_reader::{SourceLine, split_on, split_words};
use crate::models::Breakpoint;
use tracing::debug;

/// Column data and segment markers read from the table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTable {
    /// One vector per column, all of length `npts`
    pub columns: Vec<Vec<f64>>,
    pub npts: usize,
    /// `outer.value` markers found inside the table
    pub breakpoints: Vec<Breakpoint>,
}

impl ParsedTable {
    pub fn narrays(&self) -> usize {
        self.columns.len()
    }
}

/// Parse a finite number; NaN and infinities are rejected
pub fn parse_number(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse the data section, starting at the first data row
pub fn parse_table(lines: &[SourceLine], config: &ReaderConfig) -> Result<ParsedTable> {
    let Some(first) = lines.first() else {
        return Err(XdiError::OnlyOneDataRow { rows: 0 });
    };

    let narrays = split_words(&first.text).len();
    if narrays > config.max_columns {
        return Err(XdiError::ResourceLimit {
            what: "column count",
            limit: config.max_columns,
            found: narrays,
            line_number: Some(first.number),
        });
    }

    let mut table = ParsedTable {
        columns: vec![Vec::new(); narrays],
        npts: 0,
        breakpoints: Vec::new(),
    };

    for line in lines {
        if let Some(body) = line.text.strip_prefix(TOK_COMMENT) {
            if let Some(value) = outer_value(body) {
                let value = parse_number(value).ok_or_else(|| non_numeric(value, line))?;
                debug!("Outer scan breakpoint {} at row {}", value, table.npts);
                table.breakpoints.push(Breakpoint {
                    value,
                    row: table.npts,
                });
            }
            continue;
        }

        let words = split_words(&line.text);
        if words.len() != narrays {
            return Err(XdiError::ColumnCountChanged {
                expected: narrays,
                found: words.len(),
                line_number: line.number,
                line: line.text.clone(),
            });
        }

        for (column, word) in table.columns.iter_mut().zip(words) {
            let value = parse_number(word).ok_or_else(|| non_numeric(word, line))?;
            column.push(value);
        }
        table.npts += 1;
    }

    if table.npts < 2 {
        return Err(XdiError::OnlyOneDataRow { rows: table.npts });
    }

    debug!(
        "Parsed data table: {} columns, {} rows, {} outer breakpoints",
        narrays,
        table.npts,
        table.breakpoints.len()
    );
    Ok(table)
}

/// Value of an `outer.value` comment, if the comment is one
fn outer_value(body: &str) -> Option<&str> {
    let (path, value) = split_on(body, TOK_DELIM)?;
    let (family, key) = path.split_once(TOK_DOT)?;
    let (outer_family, outer_key) = fields::OUTER_VALUE;
    let is_outer_value = family.trim().eq_ignore_ascii_case(outer_family)
        && key.trim().eq_ignore_ascii_case(outer_key);
    is_outer_value.then_some(value)
}

fn non_numeric(token: &str, line: &SourceLine) -> XdiError {
    XdiError::NonNumericValue {
        token: token.to_string(),
        line_number: line.number,
        line: line.text.clone(),
    }
}
