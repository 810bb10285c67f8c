//! Tests for 2D scans with outer-scan breakpoints

use super::*;
use crate::config::WriterConfig;
use crate::error::XdiError;
use crate::models::Breakpoint;
use crate::parser::XdiReader;
use crate::writer::render;

#[test]
fn test_outer_breakpoints() {
    let doc = XdiReader::default()
        .parse_str(&create_2d_xdi(), "fe_temps.xdi")
        .unwrap();

    assert_eq!(doc.npts, 6);
    assert_eq!(doc.nouter(), 3);
    assert!(doc.outer.is_2d());
    assert_eq!(doc.outer.label.as_deref(), Some("temperature"));
    assert_eq!(
        doc.outer.breakpoints,
        vec![
            Breakpoint { value: 300.0, row: 0 },
            Breakpoint { value: 350.0, row: 2 },
            Breakpoint { value: 400.0, row: 4 },
        ]
    );
    assert_eq!(doc.outer_segments(), vec![0..2, 2..4, 4..6]);
    assert!(doc.advisories.is_empty(), "{:?}", doc.advisories);
}

#[test]
fn test_breakpoints_survive_rewrite() {
    let reader = XdiReader::default();
    let doc = reader.parse_str(&create_2d_xdi(), "fe_temps.xdi").unwrap();

    let text = render(&doc, &WriterConfig::default());
    let again = reader.parse_str(&text, "rewritten.xdi").unwrap();

    assert_eq!(again.outer.breakpoints, doc.outer.breakpoints);
    assert_eq!(again.columns, doc.columns);
    assert_eq!(again.metadata, doc.metadata);
}

#[test]
fn test_breakpoints_dropped_when_disabled() {
    let reader = XdiReader::default();
    let doc = reader.parse_str(&create_2d_xdi(), "fe_temps.xdi").unwrap();

    let config = WriterConfig::default().without_outer_breakpoints();
    let again = reader
        .parse_str(&render(&doc, &config), "flat.xdi")
        .unwrap();

    assert_eq!(again.nouter(), 1);
    assert_eq!(again.npts, 6);
    // the header seed is plain metadata and is kept
    assert_eq!(again.outer.breakpoints[0].value, 300.0);
}

#[test]
fn test_non_numeric_outer_value_is_fatal() {
    let text = "# XDI/1.0\n#----\n1.0 2.0\n# outer.value: warm\n3.0 4.0\n";
    match XdiReader::default().parse_str(text, "bad_outer.xdi") {
        Err(XdiError::NonNumericValue { token, line_number, .. }) => {
            assert_eq!(token, "warm");
            assert_eq!(line_number, 4);
        }
        other => panic!("Expected NonNumericValue, got {other:?}"),
    }
}

#[test]
fn test_outer_seed_defaults_to_zero() {
    let text = "# XDI/1.0\n#----\n1.0 2.0\n2.0 3.0\n# outer.value: 5\n1.0 2.5\n2.0 3.5\n";
    let doc = XdiReader::default().parse_str(text, "seedless.xdi").unwrap();

    assert_eq!(doc.outer.breakpoints[0], Breakpoint { value: 0.0, row: 0 });
    assert_eq!(doc.outer.breakpoints[1], Breakpoint { value: 5.0, row: 2 });
}
