//! Serialise a [`Document`] back to XDI text.
//!
//! Output order is version line, metadata in file order, the user comment
//! block, the separator, a column label line, then the data rows. Outer-scan
//! breakpoints after the first are written as `# outer.value: v` markers
//! ahead of the row that starts each segment, so 2D documents read back with
//! the same segments.

use crate::config::WriterConfig;
use crate::constants::{
    MIN_DATA_LINE_LENGTH, SEPARATOR_LINE, TOK_COMMENT, TOK_COMMENT_START, TOK_VERSION,
    XDI_DEFAULT_FILE_VERSION, fields,
};
use crate::error::{Result, XdiError};
use crate::models::{Breakpoint, Document};
use std::path::Path;
use tracing::{debug, info, warn};

/// Render a document as XDI text
pub fn render(doc: &Document, config: &WriterConfig) -> String {
    let mut lines = Vec::with_capacity(doc.metadata.len() + doc.npts + 8);

    let version = if doc.xdi_version.is_empty() {
        XDI_DEFAULT_FILE_VERSION
    } else {
        doc.xdi_version.as_str()
    };
    match doc.extra_version.as_deref() {
        Some(extra) if !extra.trim().is_empty() => {
            lines.push(format!("{TOK_COMMENT} {TOK_VERSION}{version} {}", extra.trim()))
        }
        _ => lines.push(format!("{TOK_COMMENT} {TOK_VERSION}{version}")),
    }

    for entry in &doc.metadata {
        lines.push(format!(
            "{TOK_COMMENT} {}.{}: {}",
            entry.family, entry.key, entry.value
        ));
    }

    lines.push(format!("{TOK_COMMENT} {TOK_COMMENT_START}"));
    for comment in doc.comments.lines().skip_while(|l| l.trim().is_empty()) {
        let comment = comment.trim_end();
        if comment.is_empty() {
            lines.push(TOK_COMMENT.to_string());
        } else {
            lines.push(format!("{TOK_COMMENT} {comment}"));
        }
    }
    lines.push(SEPARATOR_LINE.to_string());
    lines.push(format!("{TOK_COMMENT} {}", doc.labels().join(" ")));

    let markers: &[Breakpoint] = if config.emit_outer_breakpoints {
        doc.outer.breakpoints.get(1..).unwrap_or_default()
    } else {
        &[]
    };
    let (outer_family, outer_key) = fields::OUTER_VALUE;
    let marker = |b: &Breakpoint| {
        format!(
            "{TOK_COMMENT} {outer_family}.{outer_key}: {}",
            format_significant(b.value, config.significant_digits)
        )
    };

    let rows = doc
        .columns
        .iter()
        .map(|c| c.values.len())
        .min()
        .unwrap_or(0)
        .min(doc.npts);
    if rows < doc.npts {
        warn!(
            "Columns hold fewer than npts={} values, writing {} rows",
            doc.npts, rows
        );
    }

    for row in 0..rows {
        lines.extend(markers.iter().filter(|b| b.row == row).map(&marker));

        let mut values: Vec<String> = doc
            .columns
            .iter()
            .filter_map(|c| c.values.get(row))
            .map(|&v| format_significant(v, config.significant_digits))
            .collect();
        if values.join(" ").len() <= MIN_DATA_LINE_LENGTH {
            values = values.iter().map(|v| widen_value(v)).collect();
        }
        let values: Vec<String> = values
            .iter()
            .map(|text| format!("{text:>width$}", width = config.field_width))
            .collect();
        lines.push(format!("  {}", values.join(" ")));
    }
    lines.extend(markers.iter().filter(|b| b.row >= rows).map(&marker));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write a document to `path`, replacing any existing file
pub fn write_document(doc: &Document, path: &Path, config: &WriterConfig) -> Result<()> {
    let text = render(doc, config);
    debug!(
        "Rendered {} metadata entries and {} rows ({} bytes)",
        doc.metadata.len(),
        doc.npts,
        text.len()
    );

    std::fs::write(path, text).map_err(|source| XdiError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote XDI file: {}", path.display());
    Ok(())
}

/// Format a value to `digits` significant digits, like C's `%g`
///
/// Fixed notation is used for exponents in `-4..digits`, scientific notation
/// otherwise. Trailing zeros are removed in both forms.
pub fn format_significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

/// Pad a short number with a decimal point and zeros
///
/// A row must be longer than [`MIN_DATA_LINE_LENGTH`] once trimmed or the
/// reader takes it for a header line.
fn widen_value(text: &str) -> String {
    let mut text = text.to_string();
    if !text.contains(['.', 'e', 'E']) {
        text.push('.');
    }
    while text.len() <= MIN_DATA_LINE_LENGTH {
        text.push('0');
    }
    text
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
