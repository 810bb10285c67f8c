//! Test fixtures for the XDI reader
//!
//! Shared sample files and helpers used by the reader test modules.

use std::io::Write;
use tempfile::NamedTempFile;

mod outer_scan;

/// A complete single-scan XDI file: copper foil at the Cu K edge
pub fn create_test_xdi() -> String {
    r#"# XDI/1.0 GSE/1.0
# Column.1: energy eV
# Column.2: i0
# Column.3: itrans
# Column.4: mutrans
# Element.edge: K
# Element.symbol: Cu
# Scan.edge_energy: 8980.0
# Mono.name: Si 111
# Mono.d_spacing: 3.13553
# Beamline.name: 13ID
# Beamline.collimation: none
# Beamline.focusing: yes
# Beamline.harmonic_rejection: rhodium-coated mirror
# Facility.name: APS
# Facility.energy: 7.00 GeV
# Facility.xray_source: APS Undulator A
# Scan.start_time: 2001-06-26T22:27:31
# Detector.I0: 10cm  N2
# Detector.I1: 10cm  N2
# GSE.EXTRA:  config 1
# ///
# Cu foil Room Temperature
# measured at beamline 13-ID
#----
# energy i0 itrans mutrans
  8779.0  149013.7  550643.1  -1.3070486
  8789.0  144864.7  531876.0  -1.2992853
  8799.0  132978.7  489591.0  -1.3033915
  8809.0  125444.7  463051.0  -1.3059462
"#
    .to_string()
}

/// A 2D scan: three energy sweeps at increasing sample temperature
pub fn create_2d_xdi() -> String {
    r#"# XDI/1.0
# Column.1: energy eV
# Column.2: mu
# Element.symbol: Fe
# Element.edge: K
# Mono.d_spacing: 3.13553
# Outer.name: temperature
# Outer.value: 300
#----
# energy mu
7100.0 0.10
7110.0 0.20
# Outer.value: 350
7100.0 0.15
7110.0 0.25
# Outer.value: 400
7100.0 0.18
7110.0 0.28
"#
    .to_string()
}

/// Smallest file the reader accepts without fatal errors
pub fn create_minimal_xdi() -> String {
    "# XDI/1.0\n1.0 2.0\n3.0 4.0\n".to_string()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file
}
