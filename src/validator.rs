//! Metadata validation.
//!
//! [`validate_item`] checks one `family.key: value` entry against the rules of
//! its family. Failures are [`Advisory`] values: a document with bad metadata
//! is still usable as data. [`required_metadata`] and [`recommended_metadata`]
//! summarise whole-document policies as bit flags with a readable message.

use crate::constants::{
    COLUMN_ANGLE, COLUMN_ENERGY, FACILITY_ENERGY_UNITS, MIN_TIMESTAMP_YEAR,
    NUMBER_WITH_UNIT_PATTERN, RECOMMENDED_FIELDS, TEMPERATURE_UNITS, TIMESTAMP_PATTERN, fields,
    is_dictionary_family, is_valid_edge, is_valid_element,
};
use crate::error::{Advisory, AdvisoryKind};
use crate::models::Document;
use crate::table::parse_number;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};
use std::sync::LazyLock;
use tracing::debug;

static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(NUMBER_WITH_UNIT_PATTERN).expect("number-with-unit pattern is valid")
});

static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is valid"));

/// `Ok` when the value is acceptable, otherwise the advisory it raises
pub type ValidationResult = std::result::Result<(), Advisory>;

/// Validate a single metadata value against the rules for its family
///
/// Family and key are matched case-insensitively. Keys without a rule are
/// accepted. A family outside the XDI dictionary is accepted only when it was
/// declared as an extension on the version line.
pub fn validate_item(doc: &Document, family: &str, key: &str, value: &str) -> ValidationResult {
    let family_lc = family.to_ascii_lowercase();
    let key_lc = key.to_ascii_lowercase();
    let value = value.trim();

    match family_lc.as_str() {
        "facility" => validate_facility(&key_lc, value),
        "mono" => validate_mono(&key_lc, value),
        "sample" => validate_sample(&key_lc, value),
        "scan" => validate_scan(&key_lc, value),
        "element" => validate_element(&key_lc, value),
        "column" => validate_column(&key_lc, value),
        f if is_dictionary_family(f) => Ok(()),
        f => {
            if doc.extension_families().iter().any(|declared| declared == f) {
                Ok(())
            } else {
                Err(Advisory::new(
                    AdvisoryKind::UnversionedExtensionField,
                    format!("extension field '{family}.{key}' used without versioning information"),
                ))
            }
        }
    }
}

/// Run [`validate_item`] over every metadata entry, in file order
pub fn validate_document(doc: &Document) -> Vec<Advisory> {
    let advisories: Vec<Advisory> = doc
        .metadata
        .iter()
        .filter_map(|entry| validate_item(doc, &entry.family, &entry.key, &entry.value).err())
        .collect();

    debug!(
        "Validated {} metadata entries, {} advisories",
        doc.metadata.len(),
        advisories.len()
    );
    advisories
}

/// Angle data cannot be converted to energy without a d-spacing
///
/// A negative d-spacing counts as missing.
pub fn check_dspacing_for_angle(labels: &[&str], dspacing: Option<f64>) -> ValidationResult {
    let has_label = |name: &str| labels.iter().any(|l| l.eq_ignore_ascii_case(name));
    let usable = dspacing.is_some_and(|d| d >= 0.0);
    if has_label(COLUMN_ANGLE) && !has_label(COLUMN_ENERGY) && !usable {
        return Err(Advisory::of(AdvisoryKind::NoDspacingForAngle));
    }
    Ok(())
}

fn validate_facility(key: &str, value: &str) -> ValidationResult {
    let valid = match key {
        "current" => number_with_unit(value)
            .is_some_and(|(_, unit)| unit.to_ascii_lowercase().contains('a')),
        "energy" => number_with_unit(value).is_some_and(|(_, unit)| {
            FACILITY_ENERGY_UNITS.contains(&unit.to_ascii_lowercase().as_str())
        }),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(Advisory::new(
            AdvisoryKind::BadFacilityField,
            format!("bad value for facility.{key}: '{value}'"),
        ))
    }
}

fn validate_mono(key: &str, value: &str) -> ValidationResult {
    if key != fields::MONO_D_SPACING.1 {
        return Ok(());
    }
    match parse_number(value) {
        Some(d) if d >= 0.0 => Ok(()),
        _ => Err(Advisory::new(
            AdvisoryKind::BadDspacing,
            format!("bad value for mono.d_spacing: '{value}'"),
        )),
    }
}

fn validate_sample(key: &str, value: &str) -> ValidationResult {
    if key != "temperature" {
        return Ok(());
    }
    let valid = number_with_unit(value)
        .is_some_and(|(_, unit)| TEMPERATURE_UNITS.contains(&unit.to_ascii_lowercase().as_str()));
    if valid {
        Ok(())
    } else {
        Err(Advisory::new(
            AdvisoryKind::BadSampleField,
            format!("bad value for sample.temperature: '{value}'"),
        ))
    }
}

fn validate_scan(key: &str, value: &str) -> ValidationResult {
    if key == fields::SCAN_START_TIME.1 || key == fields::SCAN_END_TIME.1 {
        validate_timestamp(value)
    } else {
        Ok(())
    }
}

fn validate_timestamp(value: &str) -> ValidationResult {
    let Some(caps) = TIMESTAMP.captures(value) else {
        return Err(Advisory::new(
            AdvisoryKind::BadTimestampFormat,
            format!("invalid timestamp '{value}': format should be YYYY-MM-DD HH:MM:SS"),
        ));
    };

    // The pattern guarantees every group is a short run of digits
    let part = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or_default()
    };
    let (year, month, day) = (part(1), part(2), part(3));
    let (hour, minute, second) = (part(4), part(5), part(6));

    let in_range = year >= MIN_TIMESTAMP_YEAR
        && (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour <= 23
        && minute <= 59
        && second <= 59;

    if in_range {
        Ok(())
    } else {
        Err(Advisory::new(
            AdvisoryKind::BadTimestampRange,
            format!("invalid timestamp '{value}': date out of valid range"),
        ))
    }
}

fn validate_element(key: &str, value: &str) -> ValidationResult {
    let (valid, kind) = match key {
        "symbol" => (is_valid_element(value), AdvisoryKind::NoElement),
        "edge" => (is_valid_edge(value), AdvisoryKind::NoEdge),
        "reference" => (is_valid_element(value), AdvisoryKind::BadReferenceElement),
        "ref_edge" => (is_valid_edge(value), AdvisoryKind::BadReferenceEdge),
        _ => return Ok(()),
    };
    if valid {
        Ok(())
    } else {
        Err(Advisory::new(
            kind,
            format!("{}: '{value}'", kind.description()),
        ))
    }
}

fn validate_column(key: &str, value: &str) -> ValidationResult {
    if key != fields::COLUMN_1.1 {
        return Ok(());
    }
    let label = value
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if label.contains(COLUMN_ENERGY) || label.contains(COLUMN_ANGLE) {
        Ok(())
    } else {
        Err(Advisory::new(
            AdvisoryKind::BadColumn1Label,
            format!("column.1 is not 'energy' or 'angle': '{value}'"),
        ))
    }
}

/// Split `100 mA` into its number and unit
fn number_with_unit(value: &str) -> Option<(f64, &str)> {
    let caps = NUMBER_WITH_UNIT.captures(value)?;
    let number = parse_number(caps.get(1)?.as_str())?;
    let unit = caps.get(2).map_or("", |m| m.as_str());
    Some((number, unit))
}

// =============================================================================
// Document-level policies
// =============================================================================

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$flag_meta:meta])* $flag:ident = $bit:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(u8);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: Self = Self(1 << $bit);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn bits(&self) -> u8 {
                self.0
            }

            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

flag_set! {
    /// Failures of the required-metadata policy
    RequiredFlags {
        /// `element.symbol` missing or not a known element
        ELEMENT = 0;
        /// `element.edge` missing or not a known edge
        EDGE = 1;
        NO_DSPACING = 2;
        /// `mono.d_spacing` not a non-negative number
        BAD_DSPACING = 3;
    }
}

flag_set! {
    /// Missing recommended fields, one bit per entry of `RECOMMENDED_FIELDS`
    RecommendedFlags {
        ELEMENT_SYMBOL = 0;
        ELEMENT_EDGE = 1;
        MONO_D_SPACING = 2;
        FACILITY_NAME = 3;
        FACILITY_XRAY_SOURCE = 4;
        BEAMLINE_NAME = 5;
        SCAN_START_TIME = 6;
        COLUMN_1 = 7;
    }
}

/// Outcome of a document-level metadata policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataCheck<F> {
    pub flags: F,
    /// One line per failing or missing field
    pub messages: Vec<String>,
}

impl<F> MetadataCheck<F> {
    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message(&self) -> String {
        self.messages.join("\n")
    }
}

/// Check the fields needed to use the data at all
pub fn required_metadata(doc: &Document) -> MetadataCheck<RequiredFlags> {
    let mut flags = RequiredFlags::empty();
    let mut messages = Vec::new();

    if !doc.element.as_deref().is_some_and(is_valid_element) {
        flags |= RequiredFlags::ELEMENT;
        messages.push("Element.symbol missing or not valid".to_string());
    }
    if !doc.edge.as_deref().is_some_and(is_valid_edge) {
        flags |= RequiredFlags::EDGE;
        messages.push("Element.edge missing or not valid".to_string());
    }

    // same rule the reader uses for Document::dspacing: first usable entry wins
    let (family, key) = fields::MONO_D_SPACING;
    let mut values = doc.metadata_values(family, key).peekable();
    match values.peek().copied() {
        None => {
            flags |= RequiredFlags::NO_DSPACING;
            messages.push("Mono.d_spacing missing".to_string());
        }
        Some(first) if !values.any(is_usable_dspacing) => {
            flags |= RequiredFlags::BAD_DSPACING;
            messages.push(format!("Mono.d_spacing not a valid number: '{first}'"));
        }
        Some(_) => {}
    }

    MetadataCheck { flags, messages }
}

/// Check for the presence of the recommended fields
pub fn recommended_metadata(doc: &Document) -> MetadataCheck<RecommendedFlags> {
    let mut flags = RecommendedFlags::empty();
    let mut messages = Vec::new();

    for (bit, (family, key)) in RECOMMENDED_FIELDS.iter().enumerate() {
        if !doc.has_metadata(family, key) {
            flags |= RecommendedFlags(1 << bit);
            messages.push(format!(
                "Missing recommended metadata field: {}.{key}",
                capitalize(family)
            ));
        }
    }

    MetadataCheck { flags, messages }
}

fn is_usable_dspacing(value: &str) -> bool {
    parse_number(value).is_some_and(|d| d >= 0.0)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetadataEntry;

    fn document_with(entries: &[(&str, &str, &str)]) -> Document {
        let mut doc = Document::new("1.0");
        doc.metadata = entries
            .iter()
            .map(|(f, k, v)| MetadataEntry::new(*f, *k, *v))
            .collect();
        doc.element = doc.metadata_value("element", "symbol").map(str::to_string);
        doc.edge = doc.metadata_value("element", "edge").map(str::to_string);
        doc
    }

    fn kind_of(result: ValidationResult) -> Option<AdvisoryKind> {
        result.err().map(|a| a.kind)
    }

    #[test]
    fn test_facility_fields() {
        let doc = Document::new("1.0");
        assert!(validate_item(&doc, "Facility", "current", "100 mA").is_ok());
        assert!(validate_item(&doc, "facility", "energy", "7.00 GeV").is_ok());
        assert!(validate_item(&doc, "facility", "energy", "800MeV").is_ok());
        assert!(validate_item(&doc, "facility", "name", "anything at all").is_ok());

        assert_eq!(
            kind_of(validate_item(&doc, "facility", "current", "100 mV")),
            Some(AdvisoryKind::BadFacilityField)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "facility", "energy", "7 TeV")),
            Some(AdvisoryKind::BadFacilityField)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "facility", "energy", "high")),
            Some(AdvisoryKind::BadFacilityField)
        );
    }

    #[test]
    fn test_mono_and_sample_fields() {
        let doc = Document::new("1.0");
        assert!(validate_item(&doc, "Mono", "d_spacing", "3.13555").is_ok());
        assert_eq!(
            kind_of(validate_item(&doc, "mono", "d_spacing", "-1.0")),
            Some(AdvisoryKind::BadDspacing)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "mono", "d_spacing", "Si(111)")),
            Some(AdvisoryKind::BadDspacing)
        );

        assert!(validate_item(&doc, "Sample", "temperature", "300 K").is_ok());
        assert!(validate_item(&doc, "sample", "temperature", "25C").is_ok());
        assert_eq!(
            kind_of(validate_item(&doc, "sample", "temperature", "room")),
            Some(AdvisoryKind::BadSampleField)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "sample", "temperature", "300 R")),
            Some(AdvisoryKind::BadSampleField)
        );
    }

    #[test]
    fn test_timestamps() {
        let doc = Document::new("1.0");
        assert!(validate_item(&doc, "Scan", "start_time", "2012-05-01 10:11:12").is_ok());
        assert!(validate_item(&doc, "scan", "end_time", "2012-05-01T10:11:12").is_ok());

        assert_eq!(
            kind_of(validate_item(&doc, "scan", "start_time", "May 1 2012")),
            Some(AdvisoryKind::BadTimestampFormat)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "scan", "start_time", "1850-05-01 10:11:12")),
            Some(AdvisoryKind::BadTimestampRange)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "scan", "end_time", "2012-13-01 10:11:12")),
            Some(AdvisoryKind::BadTimestampRange)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "scan", "end_time", "2012-05-01 24:00:00")),
            Some(AdvisoryKind::BadTimestampRange)
        );
    }

    #[test]
    fn test_element_fields() {
        let doc = Document::new("1.0");
        assert!(validate_item(&doc, "Element", "symbol", "cu").is_ok());
        assert!(validate_item(&doc, "element", "edge", "l3").is_ok());
        assert!(validate_item(&doc, "element", "reference", "Fe").is_ok());

        assert_eq!(
            kind_of(validate_item(&doc, "element", "symbol", "Xx")),
            Some(AdvisoryKind::NoElement)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "element", "edge", "Q")),
            Some(AdvisoryKind::NoEdge)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "element", "reference", "Zz")),
            Some(AdvisoryKind::BadReferenceElement)
        );
        assert_eq!(
            kind_of(validate_item(&doc, "element", "ref_edge", "K9")),
            Some(AdvisoryKind::BadReferenceEdge)
        );
    }

    #[test]
    fn test_column_one_label() {
        let doc = Document::new("1.0");
        assert!(validate_item(&doc, "Column", "1", "energy eV").is_ok());
        assert!(validate_item(&doc, "column", "1", "Angle degrees").is_ok());
        assert!(validate_item(&doc, "column", "2", "i0").is_ok());
        assert_eq!(
            kind_of(validate_item(&doc, "column", "1", "time s")),
            Some(AdvisoryKind::BadColumn1Label)
        );
    }

    #[test]
    fn test_extension_families() {
        let mut doc = Document::new("1.0");
        assert!(validate_item(&doc, "Detector", "i0", "10cm N2").is_ok());
        assert_eq!(
            kind_of(validate_item(&doc, "GSE", "EXTRA", "config")),
            Some(AdvisoryKind::UnversionedExtensionField)
        );

        doc.extra_version = Some("GSE/1.0".to_string());
        assert!(validate_item(&doc, "GSE", "EXTRA", "config").is_ok());
        assert_eq!(
            kind_of(validate_item(&doc, "Larch", "version", "0.9")),
            Some(AdvisoryKind::UnversionedExtensionField)
        );
    }

    #[test]
    fn test_validate_document_collects_in_order() {
        let doc = document_with(&[
            ("Element", "symbol", "Qq"),
            ("Mono", "d_spacing", "3.1"),
            ("Scan", "start_time", "yesterday"),
        ]);
        let kinds: Vec<AdvisoryKind> = validate_document(&doc).iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AdvisoryKind::NoElement, AdvisoryKind::BadTimestampFormat]);
    }

    #[test]
    fn test_dspacing_for_angle() {
        assert_eq!(
            check_dspacing_for_angle(&["angle", "i0"], None).unwrap_err().kind,
            AdvisoryKind::NoDspacingForAngle
        );
        assert!(check_dspacing_for_angle(&["angle", "i0"], Some(3.1)).is_ok());
        assert!(check_dspacing_for_angle(&["angle", "energy"], None).is_ok());
        assert!(check_dspacing_for_angle(&["energy", "i0"], None).is_ok());
        assert_eq!(
            kind_of(check_dspacing_for_angle(&["angle", "i0"], Some(-1.0))),
            Some(AdvisoryKind::NoDspacingForAngle)
        );
    }

    #[test]
    fn test_required_metadata_missing_edge() {
        let doc = document_with(&[("Element", "symbol", "Cu"), ("Mono", "d_spacing", "3.1")]);
        let check = required_metadata(&doc);
        assert!(check.flags.contains(RequiredFlags::EDGE));
        assert!(!check.flags.contains(RequiredFlags::ELEMENT));
        assert_eq!(check.flags.bits(), 2);
        assert!(check.message().contains("edge"));
    }

    #[test]
    fn test_required_metadata_dspacing() {
        let doc = document_with(&[("Element", "symbol", "Cu"), ("Element", "edge", "K")]);
        let check = required_metadata(&doc);
        assert_eq!(check.flags, RequiredFlags::NO_DSPACING);

        let doc = document_with(&[
            ("Element", "symbol", "Cu"),
            ("Element", "edge", "K"),
            ("Mono", "d_spacing", "unknown"),
        ]);
        let check = required_metadata(&doc);
        assert_eq!(check.flags, RequiredFlags::BAD_DSPACING);

        let doc = document_with(&[
            ("Element", "symbol", "Cu"),
            ("Element", "edge", "K"),
            ("Mono", "d_spacing", "3.13555"),
        ]);
        let check = required_metadata(&doc);
        assert!(check.is_ok());
        assert!(check.flags.is_empty());

        let doc = document_with(&[
            ("Element", "symbol", "Cu"),
            ("Element", "edge", "K"),
            ("Mono", "d_spacing", "-2.0"),
        ]);
        assert_eq!(required_metadata(&doc).flags, RequiredFlags::BAD_DSPACING);
    }

    #[test]
    fn test_required_metadata_duplicate_dspacing() {
        let doc = document_with(&[
            ("Element", "symbol", "Cu"),
            ("Element", "edge", "K"),
            ("Mono", "d_spacing", "Si(111)"),
            ("Mono", "d_spacing", "3.13"),
        ]);
        assert!(required_metadata(&doc).is_ok());
    }

    #[test]
    fn test_recommended_metadata_on_minimal_file() {
        let doc = document_with(&[
            ("Element", "symbol", "Cu"),
            ("Element", "edge", "K"),
            ("Mono", "d_spacing", "3.1"),
            ("Column", "1", "energy eV"),
        ]);
        let check = recommended_metadata(&doc);

        assert_eq!(
            check.flags,
            RecommendedFlags::FACILITY_NAME
                | RecommendedFlags::FACILITY_XRAY_SOURCE
                | RecommendedFlags::BEAMLINE_NAME
                | RecommendedFlags::SCAN_START_TIME
        );
        assert_eq!(check.messages.len(), 4);
        let message = check.message();
        for field in [
            "Facility.name",
            "Facility.xray_source",
            "Beamline.name",
            "Scan.start_time",
        ] {
            assert!(message.contains(field), "message should name {field}");
        }
    }
}
