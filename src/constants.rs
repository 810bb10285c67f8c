//! Application constants for the XDI processor
//!
//! This module contains the format tokens, reference tables, numeric codes
//! and default limits used throughout the XDI reader, validator and writer.

// =============================================================================
// Library and Format Versions
// =============================================================================

/// Version of the XDI specification implemented by this library
pub const XDI_LIBRARY_VERSION: &str = "1.0.0";

/// Version written to line 1 when serialising a document with no version
pub const XDI_DEFAULT_FILE_VERSION: &str = "1.0";

// =============================================================================
// Format Tokens
// =============================================================================

/// Version marker, required as the first word of line 1
pub const TOK_VERSION: &str = "XDI/";

/// Comment character at the start of every header line
pub const TOK_COMMENT: char = '#';

/// Delimiter between metadata name and value
pub const TOK_DELIM: char = ':';

/// Delimiter between metadata family and key
pub const TOK_DOT: char = '.';

/// Start of the multi-line user comment block
pub const TOK_COMMENT_START: &str = "///";

/// End of the user comment block, separating header from data
pub const TOK_COMMENT_END: &str = "---";

/// Separator line written between header and column labels
pub const SEPARATOR_LINE: &str = "#----";

/// Separator between a column unit and its hardware address
pub const TOK_COLUMN_ADDRESS: &str = "||";

/// Column label that marks an energy abscissa
pub const COLUMN_ENERGY: &str = "energy";

/// Column label that marks a monochromator angle abscissa
pub const COLUMN_ANGLE: &str = "angle";

/// Prefix used for columns without a `column.N` label
pub const DEFAULT_COLUMN_PREFIX: &str = "col";

/// Well-known metadata fields, as `(family, key)` pairs
pub mod fields {
    pub const ELEMENT_SYMBOL: (&str, &str) = ("element", "symbol");
    pub const ELEMENT_EDGE: (&str, &str) = ("element", "edge");
    pub const ELEMENT_REFERENCE: (&str, &str) = ("element", "reference");
    pub const ELEMENT_REF_EDGE: (&str, &str) = ("element", "ref_edge");
    pub const MONO_D_SPACING: (&str, &str) = ("mono", "d_spacing");
    pub const OUTER_NAME: (&str, &str) = ("outer", "name");
    pub const OUTER_VALUE: (&str, &str) = ("outer", "value");
    pub const SCAN_START_TIME: (&str, &str) = ("scan", "start_time");
    pub const SCAN_END_TIME: (&str, &str) = ("scan", "end_time");
    pub const FACILITY_NAME: (&str, &str) = ("facility", "name");
    pub const FACILITY_XRAY_SOURCE: (&str, &str) = ("facility", "xray_source");
    pub const BEAMLINE_NAME: (&str, &str) = ("beamline", "name");
    pub const COLUMN_1: (&str, &str) = ("column", "1");

    /// Family whose keys are 1-based column numbers
    pub const COLUMN_FAMILY: &str = "column";
}

// =============================================================================
// Grammar Patterns
// =============================================================================

/// Metadata family name: leading letter or underscore, then word characters
pub const FAMILY_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]+$";

/// Metadata key name: word characters only
pub const KEY_NAME_PATTERN: &str = r"^[A-Za-z0-9_]+$";

/// Start of a numeric data row: optional sign, then a digit or decimal point
pub const DATA_LINE_PATTERN: &str = r"^[+-]?(\d|\.)";

/// Lines this short are never taken as the first data row
pub const MIN_DATA_LINE_LENGTH: usize = 3;

/// Timestamp layout `YYYY-MM-DD[T ]HH:MM:SS`, trailing text allowed
pub const TIMESTAMP_PATTERN: &str =
    r"^(\d{4})-(\d{1,2})-(\d{1,2})[T ](\d{1,2}):(\d{2}):(\d{2})";

/// A number followed by an optional unit, e.g. `100 mA` or `3.5GeV`
pub const NUMBER_WITH_UNIT_PATTERN: &str =
    r"^([-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)\s*(\S*)$";

/// chrono layouts accepted for scan timestamps
pub const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Earliest year accepted in a scan timestamp
pub const MIN_TIMESTAMP_YEAR: u32 = 1900;

// =============================================================================
// Reference Tables
// =============================================================================

/// Valid absorption edge names
pub const VALID_EDGES: &[&str] = &[
    "K", "L", "L1", "L2", "L3", "M", "M1", "M2", "M3", "M4", "M5", "N", "N1", "N2", "N3", "N4",
    "N5", "N6", "N7", "O", "O1", "O2", "O3", "O4", "O5", "O6", "O7",
];

/// Valid atomic symbols
pub const VALID_ELEMENTS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Uut", "Fl", "Uup", "Lv", "Uus", "Uuo",
];

/// Families defined by the XDI dictionary; anything else needs an extension tag
pub const DICTIONARY_FAMILIES: &[&str] = &[
    "beamline", "column", "detector", "element", "facility", "mono", "outer", "sample", "scan",
];

/// Recommended metadata, in bit order of [`crate::validator::RecommendedFlags`]
pub const RECOMMENDED_FIELDS: &[(&str, &str)] = &[
    fields::ELEMENT_SYMBOL,
    fields::ELEMENT_EDGE,
    fields::MONO_D_SPACING,
    fields::FACILITY_NAME,
    fields::FACILITY_XRAY_SOURCE,
    fields::BEAMLINE_NAME,
    fields::SCAN_START_TIME,
    fields::COLUMN_1,
];

/// Beam energy units accepted for `facility.energy`
pub const FACILITY_ENERGY_UNITS: &[&str] = &["gev", "mev"];

/// Temperature units accepted for `sample.temperature`
pub const TEMPERATURE_UNITS: &[&str] = &["c", "f", "k"];

// =============================================================================
// Resource Limits
// =============================================================================

/// Default maximum number of lines in a file
pub const DEFAULT_MAX_LINES: usize = 16_384;

/// Default maximum length of a single line, in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8_192;

/// Default maximum number of data columns
pub const DEFAULT_MAX_COLUMNS: usize = 128;

// =============================================================================
// Writer Defaults
// =============================================================================

/// Significant digits written for each data value
pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 8;

/// Minimum field width of each data value
pub const DEFAULT_FIELD_WIDTH: usize = 16;

// =============================================================================
// Numeric Codes
// =============================================================================

/// Numeric codes for fatal errors, negative as in the classic C library
pub mod error_codes {
    pub const IO: i32 = -1;
    pub const NOT_XDI: i32 = -10;
    pub const NO_ARRAY_NAME: i32 = -21;
    pub const NO_ARRAY_INDEX: i32 = -22;
    pub const META_FAMILY_NAME: i32 = -41;
    pub const META_KEY_NAME: i32 = -42;
    pub const META_FORMAT: i32 = -43;
    pub const NCOLS_CHANGE: i32 = -81;
    pub const NON_NUMERIC: i32 = -82;
    pub const ONE_DATA_ROW: i32 = -83;
    pub const RESOURCE_LIMIT: i32 = -90;
}

/// Numeric codes for advisories; powers of two so they can be OR-ed
pub mod advisory_codes {
    pub const NO_ELEMENT: u32 = 1;
    pub const NO_EDGE: u32 = 1 << 1;
    pub const BAD_REFERENCE_ELEMENT: u32 = 1 << 2;
    pub const BAD_REFERENCE_EDGE: u32 = 1 << 3;
    pub const UNVERSIONED_EXTENSION: u32 = 1 << 4;
    pub const BAD_COLUMN1_LABEL: u32 = 1 << 5;
    pub const BAD_DSPACING: u32 = 1 << 6;
    pub const BAD_SAMPLE_FIELD: u32 = 1 << 7;
    pub const BAD_FACILITY_FIELD: u32 = 1 << 8;
    pub const BAD_TIMESTAMP_FORMAT: u32 = 1 << 9;
    pub const BAD_TIMESTAMP_RANGE: u32 = 1 << 10;
    pub const NO_DSPACING_FOR_ANGLE: u32 = 1 << 11;
    pub const MISSING_SEPARATOR: u32 = 1 << 12;
    pub const IGNORED_HEADER_LINE: u32 = 1 << 13;
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Check an atomic symbol against the reference table, ignoring case
pub fn is_valid_element(symbol: &str) -> bool {
    VALID_ELEMENTS.iter().any(|e| e.eq_ignore_ascii_case(symbol.trim()))
}

/// Check an absorption edge name against the reference table, ignoring case
pub fn is_valid_edge(edge: &str) -> bool {
    VALID_EDGES.iter().any(|e| e.eq_ignore_ascii_case(edge.trim()))
}

/// Check whether a family is part of the XDI dictionary
pub fn is_dictionary_family(family: &str) -> bool {
    DICTIONARY_FAMILIES
        .iter()
        .any(|f| f.eq_ignore_ascii_case(family))
}
