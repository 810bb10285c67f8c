//! XDI header parsing and metadata extraction.
//!
//! Validates the version line, finds the boundary between header and data,
//! and turns every `# Family.Key: Value` line into an ordered
//! [`MetadataEntry`]. Special fields (element, edge, d-spacing, column
//! labels, outer scan name and seed) and the user comment block are pulled
//! out along the way.

use crate::config::ReaderConfig;
use crate::constants::{
    DATA_LINE_PATTERN, FAMILY_NAME_PATTERN, KEY_NAME_PATTERN, MIN_DATA_LINE_LENGTH,
    TOK_COLUMN_ADDRESS, TOK_COMMENT, TOK_COMMENT_END, TOK_COMMENT_START, TOK_DELIM, TOK_DOT,
    TOK_VERSION, fields,
};
use crate::error::{Advisory, AdvisoryKind, Result, XdiError};
use crate::line_reader::{SourceLine, split_on};
use crate::models::MetadataEntry;
use crate::table::parse_number;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static FAMILY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FAMILY_NAME_PATTERN).expect("family name pattern is valid"));
static KEY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_NAME_PATTERN).expect("key name pattern is valid"));
static DATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATA_LINE_PATTERN).expect("data line pattern is valid"));

/// Label, unit and address taken from a `column.N` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabel {
    pub label: String,
    pub unit: Option<String>,
    pub address: Option<String>,
}

/// Everything the header contributes to a document
#[derive(Debug, Clone, Default)]
pub struct ParsedHeader {
    pub xdi_version: String,
    pub extra_version: Option<String>,
    pub metadata: Vec<MetadataEntry>,
    pub element: Option<String>,
    pub edge: Option<String>,
    pub dspacing: Option<f64>,
    /// Column labels keyed by 0-based column index
    pub column_labels: BTreeMap<usize, ColumnLabel>,
    pub outer_label: Option<String>,
    pub outer_seed: Option<f64>,
    pub comments: Vec<String>,
    pub has_separator: bool,
    /// Index into the line list of the first data row
    pub data_start: usize,
    pub advisories: Vec<Advisory>,
}

/// Parse the header section of a line list
pub fn parse_header(lines: &[SourceLine], config: &ReaderConfig) -> Result<ParsedHeader> {
    let first = lines.first().ok_or_else(|| XdiError::NotXdiFormat {
        reason: "file is empty".to_string(),
        line: String::new(),
    })?;
    let (xdi_version, extra_version) = parse_version_line(first)?;

    let data_start = find_data_start(lines);
    let mut builder = HeaderBuilder::new(config);
    for line in &lines[1..data_start] {
        builder.parse_line(line)?;
    }

    let header = builder.build(xdi_version, extra_version, data_start);
    debug!(
        "Parsed header: version={}, {} metadata entries, {} header lines, data starts at line {:?}",
        header.xdi_version,
        header.metadata.len(),
        data_start,
        lines.get(data_start).map(|l| l.number)
    );
    Ok(header)
}

/// Check line 1 and split it into version and extension tags
pub fn parse_version_line(line: &SourceLine) -> Result<(String, Option<String>)> {
    let not_xdi = |reason: &str| XdiError::NotXdiFormat {
        reason: reason.to_string(),
        line: line.text.clone(),
    };

    let body = line
        .text
        .strip_prefix(TOK_COMMENT)
        .ok_or_else(|| not_xdi("first line does not start with '#'"))?
        .trim();

    let (first_word, rest) = match body.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (body, ""),
    };

    let prefix_len = TOK_VERSION.len();
    let has_marker = first_word
        .get(..prefix_len)
        .is_some_and(|p| p.eq_ignore_ascii_case(TOK_VERSION));
    if !has_marker {
        return Err(not_xdi("first word of line 1 is not XDI/<version>"));
    }

    let version = &first_word[prefix_len..];
    if version.is_empty() {
        return Err(not_xdi("no version number after XDI/"));
    }

    let extra = (!rest.is_empty()).then(|| rest.to_string());
    Ok((version.to_string(), extra))
}

/// Whether a trimmed line looks like the first row of the data table
pub fn is_data_line(text: &str) -> bool {
    text.len() > MIN_DATA_LINE_LENGTH
        && !text.starts_with(TOK_COMMENT)
        && DATA_LINE.is_match(text)
}

/// Index of the first data row, or `lines.len()` when there is none
pub fn find_data_start(lines: &[SourceLine]) -> usize {
    lines
        .iter()
        .skip(1)
        .position(|line| is_data_line(&line.text))
        .map(|p| p + 1)
        .unwrap_or(lines.len())
}

/// Check a metadata family name against the identifier grammar
pub fn is_valid_family_name(family: &str) -> bool {
    FAMILY_NAME.is_match(family)
}

/// Check a metadata key name against the identifier grammar
pub fn is_valid_key_name(key: &str) -> bool {
    KEY_NAME.is_match(key)
}

/// Split a `column.N` value into label, unit and address
pub fn parse_column_label(value: &str) -> Option<ColumnLabel> {
    let (main, address) = match value.split_once(TOK_COLUMN_ADDRESS) {
        Some((main, address)) => (main.trim(), Some(address.trim())),
        None => (value.trim(), None),
    };

    let (label, unit) = match main.split_once(char::is_whitespace) {
        Some((label, unit)) => (label, Some(unit.trim())),
        None => (main, None),
    };
    if label.is_empty() {
        return None;
    }

    Some(ColumnLabel {
        label: label.to_string(),
        unit: unit.filter(|u| !u.is_empty()).map(str::to_string),
        address: address.filter(|a| !a.is_empty()).map(str::to_string),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderMode {
    /// `Family.Key: Value` lines expected
    Metadata,
    /// Inside the `///` user comment block
    Comment,
    /// Past the `---` separator
    Separated,
}

/// Accumulates header state line by line
struct HeaderBuilder<'a> {
    config: &'a ReaderConfig,
    mode: HeaderMode,
    metadata: Vec<MetadataEntry>,
    element: Option<String>,
    edge: Option<String>,
    dspacing: Option<f64>,
    column_labels: BTreeMap<usize, ColumnLabel>,
    outer_label: Option<String>,
    outer_seed: Option<f64>,
    comments: Vec<String>,
    has_separator: bool,
    ignored_line: bool,
    advisories: Vec<Advisory>,
}

impl<'a> HeaderBuilder<'a> {
    fn new(config: &'a ReaderConfig) -> Self {
        Self {
            config,
            mode: HeaderMode::Metadata,
            metadata: Vec::new(),
            element: None,
            edge: None,
            dspacing: None,
            column_labels: BTreeMap::new(),
            outer_label: None,
            outer_seed: None,
            comments: Vec::new(),
            has_separator: false,
            ignored_line: false,
            advisories: Vec::new(),
        }
    }

    fn parse_line(&mut self, line: &SourceLine) -> Result<()> {
        let Some(body) = line.text.strip_prefix(TOK_COMMENT) else {
            if self.mode != HeaderMode::Separated {
                self.ignore_line(line);
            }
            return Ok(());
        };
        let body = body.trim();
        if body.is_empty() {
            return Ok(());
        }

        match self.mode {
            HeaderMode::Comment => {
                if body.starts_with(TOK_COMMENT_END) {
                    self.end_header();
                } else {
                    self.comments.push(body.to_string());
                }
            }
            HeaderMode::Separated => {}
            HeaderMode::Metadata => {
                if body.starts_with(TOK_COMMENT_START) {
                    self.mode = HeaderMode::Comment;
                } else if body.starts_with(TOK_COMMENT_END) {
                    self.end_header();
                } else if let Some((path, value)) = split_on(body, TOK_DELIM) {
                    self.parse_metadata(path, value, line)?;
                } else {
                    self.ignore_line(line);
                }
            }
        }
        Ok(())
    }

    fn end_header(&mut self) {
        self.mode = HeaderMode::Separated;
        self.has_separator = true;
    }

    fn ignore_line(&mut self, line: &SourceLine) {
        if self.ignored_line {
            return;
        }
        self.ignored_line = true;
        warn!("Ignoring unrecognized header line {}: {}", line.number, line.text);
        self.advisories.push(
            Advisory::new(
                AdvisoryKind::IgnoredHeaderLine,
                format!("unrecognized header line {}: '{}'", line.number, line.text),
            )
            .at_line(line.number, line.text.as_str()),
        );
    }

    fn parse_metadata(&mut self, path: &str, value: &str, line: &SourceLine) -> Result<()> {
        let (family, key) = path
            .split_once(TOK_DOT)
            .ok_or_else(|| XdiError::MetadataFormatInvalid {
                line_number: line.number,
                line: line.text.clone(),
            })?;
        let (family, key) = (family.trim(), key.trim());

        if !is_valid_family_name(family) {
            return Err(XdiError::FamilyNameInvalid {
                family: family.to_string(),
                line_number: line.number,
                line: line.text.clone(),
            });
        }
        if !is_valid_key_name(key) {
            return Err(XdiError::KeyNameInvalid {
                key: key.to_string(),
                line_number: line.number,
                line: line.text.clone(),
            });
        }

        let entry = MetadataEntry::new(family, key, value);
        self.apply_special_field(&entry, line)?;
        self.metadata.push(entry);
        Ok(())
    }

    fn apply_special_field(&mut self, entry: &MetadataEntry, line: &SourceLine) -> Result<()> {
        let value = entry.value.as_str();

        if entry.family.eq_ignore_ascii_case(fields::COLUMN_FAMILY) {
            self.apply_column_label(&entry.key, value, line);
        } else if entry.is(fields::ELEMENT_SYMBOL.0, fields::ELEMENT_SYMBOL.1) {
            self.element.get_or_insert_with(|| value.to_string());
        } else if entry.is(fields::ELEMENT_EDGE.0, fields::ELEMENT_EDGE.1) {
            self.edge.get_or_insert_with(|| value.to_string());
        } else if entry.is(fields::MONO_D_SPACING.0, fields::MONO_D_SPACING.1) {
            match parse_number(value) {
                Some(dspacing) if dspacing >= 0.0 => {
                    self.dspacing.get_or_insert(dspacing);
                }
                parsed => {
                    let reason = if parsed.is_some() { "negative" } else { "non-numeric" };
                    warn!("Unusable mono.d_spacing at line {}: {}", line.number, value);
                    self.advisories.push(
                        Advisory::new(
                            AdvisoryKind::BadDspacing,
                            format!("{reason} value for mono.d_spacing: '{value}'"),
                        )
                        .at_line(line.number, line.text.as_str()),
                    );
                }
            }
        } else if entry.is(fields::OUTER_NAME.0, fields::OUTER_NAME.1) {
            self.outer_label = Some(value.to_string());
        } else if entry.is(fields::OUTER_VALUE.0, fields::OUTER_VALUE.1)
            && self.outer_seed.is_none()
        {
            let seed = parse_number(value).ok_or_else(|| XdiError::NonNumericValue {
                token: value.to_string(),
                line_number: line.number,
                line: line.text.clone(),
            })?;
            self.outer_seed = Some(seed);
        }
        Ok(())
    }

    fn apply_column_label(&mut self, key: &str, value: &str, line: &SourceLine) {
        let Ok(number) = key.parse::<usize>() else {
            return;
        };
        if number == 0 || number > self.config.max_columns {
            warn!(
                "Ignoring label for column {} at line {} (columns run from 1 to {})",
                number, line.number, self.config.max_columns
            );
            return;
        }
        if let Some(label) = parse_column_label(value) {
            self.column_labels.insert(number - 1, label);
        }
    }

    fn build(
        mut self,
        xdi_version: String,
        extra_version: Option<String>,
        data_start: usize,
    ) -> ParsedHeader {
        if !self.has_separator {
            warn!("No '#----' separator line between header and data");
            self.advisories.push(Advisory::of(AdvisoryKind::MissingSeparator));
        }

        ParsedHeader {
            xdi_version,
            extra_version,
            metadata: self.metadata,
            element: self.element,
            edge: self.edge,
            dspacing: self.dspacing,
            column_labels: self.column_labels,
            outer_label: self.outer_label,
            outer_seed: self.outer_seed,
            comments: self.comments,
            has_separator: self.has_separator,
            data_start,
            advisories: self.advisories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_reader::split_lines;

    fn lines(text: &str) -> Vec<SourceLine> {
        split_lines(text, &ReaderConfig::default()).unwrap()
    }

    fn parse(text: &str) -> Result<ParsedHeader> {
        parse_header(&lines(text), &ReaderConfig::default())
    }

    #[test]
    fn test_version_line() {
        let (version, extra) = parse_version_line(&SourceLine::new(1, "# XDI/1.0 GSE/1.0")).unwrap();
        assert_eq!(version, "1.0");
        assert_eq!(extra.as_deref(), Some("GSE/1.0"));

        let (version, extra) = parse_version_line(&SourceLine::new(1, "#xdi/1.1")).unwrap();
        assert_eq!(version, "1.1");
        assert_eq!(extra, None);

        let (_, extra) =
            parse_version_line(&SourceLine::new(1, "# XDI/1.0 GSE/1.0   Larch/0.9.13")).unwrap();
        assert_eq!(extra.as_deref(), Some("GSE/1.0   Larch/0.9.13"));
    }

    #[test]
    fn test_version_line_rejected() {
        for text in ["XDI/1.0", "# XDX/1.0", "# version XDI/1.0", "#", "# XDI/"] {
            match parse_version_line(&SourceLine::new(1, text)) {
                Err(XdiError::NotXdiFormat { line, .. }) => assert_eq!(line, text),
                other => panic!("Expected NotXdiFormat for '{text}', got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_input_is_not_xdi() {
        match parse_header(&[], &ReaderConfig::default()) {
            Err(XdiError::NotXdiFormat { .. }) => {}
            other => panic!("Expected NotXdiFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_data_line_detection() {
        assert!(is_data_line("8979.0 1.0 2.0"));
        assert!(is_data_line("-1.5e3  2"));
        assert!(is_data_line("+.5  2.0"));
        assert!(is_data_line(".25 1.0"));
        assert!(!is_data_line("1 2"));
        assert!(!is_data_line("# 1.0 2.0"));
        assert!(!is_data_line("energy i0"));
        assert!(!is_data_line("e 1.0 2.0"));
    }

    #[test]
    fn test_find_data_start() {
        let text = "# XDI/1.0\n# Element.symbol: Cu\n#----\n# energy i0\n10.0 20.0\n11.0 21.0\n";
        let lines = lines(text);
        assert_eq!(find_data_start(&lines), 4);

        let header_only = self::lines("# XDI/1.0\n# Element.symbol: Cu\n");
        assert_eq!(find_data_start(&header_only), 2);
    }

    #[test]
    fn test_identifier_grammar() {
        assert!(is_valid_family_name("Element"));
        assert!(is_valid_family_name("_private"));
        assert!(is_valid_family_name("GSE2"));
        assert!(!is_valid_family_name("9bad"));
        assert!(!is_valid_family_name("x"));
        assert!(!is_valid_family_name("bad name"));

        assert!(is_valid_key_name("d_spacing"));
        assert!(is_valid_key_name("1"));
        assert!(!is_valid_key_name("a.b"));
        assert!(!is_valid_key_name(""));
    }

    #[test]
    fn test_metadata_in_file_order_with_duplicates() {
        let header = parse(
            "# XDI/1.0\n# Element.symbol: Cu\n# Detector.I0: 10cm N2\n# Detector.I0: 20cm N2\n# Element.edge: K\n#----\n1.0 2.0 3.0\n",
        )
        .unwrap();

        let entries: Vec<(&str, &str, &str)> = header
            .metadata
            .iter()
            .map(|m| (m.family.as_str(), m.key.as_str(), m.value.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("Element", "symbol", "Cu"),
                ("Detector", "I0", "10cm N2"),
                ("Detector", "I0", "20cm N2"),
                ("Element", "edge", "K"),
            ]
        );
        assert_eq!(header.element.as_deref(), Some("Cu"));
        assert_eq!(header.edge.as_deref(), Some("K"));
        assert!(header.has_separator);
        assert!(header.advisories.is_empty());
    }

    #[test]
    fn test_value_keeps_colons() {
        let header =
            parse("# XDI/1.0\n# Scan.start_time: 2010-01-02 03:04:05\n#----\n1.0 2.0\n").unwrap();
        assert_eq!(header.metadata[0].value, "2010-01-02 03:04:05");
    }

    #[test]
    fn test_family_name_invalid() {
        match parse("# XDI/1.0\n# 9bad.key: v\n#----\n1.0 2.0\n") {
            Err(XdiError::FamilyNameInvalid {
                family,
                line_number,
                ..
            }) => {
                assert_eq!(family, "9bad");
                assert_eq!(line_number, 2);
            }
            other => panic!("Expected FamilyNameInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_key_name_invalid() {
        match parse("# XDI/1.0\n# Mono.d-spacing: 3.13\n#----\n1.0 2.0\n") {
            Err(XdiError::KeyNameInvalid { key, .. }) => assert_eq!(key, "d-spacing"),
            other => panic!("Expected KeyNameInvalid, got {other:?}"),
        }

        match parse("# XDI/1.0\n# Mono.name.extra: Si\n#----\n1.0 2.0\n") {
            Err(XdiError::KeyNameInvalid { key, .. }) => assert_eq!(key, "name.extra"),
            other => panic!("Expected KeyNameInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_without_family() {
        match parse("# XDI/1.0\n# Sample: copper foil\n#----\n1.0 2.0\n") {
            Err(XdiError::MetadataFormatInvalid { line_number, line }) => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "# Sample: copper foil");
            }
            other => panic!("Expected MetadataFormatInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_column_labels() {
        let header = parse(
            "# XDI/1.0\n# Column.1: energy eV\n# Column.3: i0 counts || scaler:ch1\n# Column.2: angle\n# Column.0: nothing\n# Column.x: nothing\n#----\n1.0 2.0 3.0\n",
        )
        .unwrap();

        assert_eq!(header.column_labels.len(), 3);
        assert_eq!(
            header.column_labels[&0],
            ColumnLabel {
                label: "energy".to_string(),
                unit: Some("eV".to_string()),
                address: None,
            }
        );
        assert_eq!(header.column_labels[&1].label, "angle");
        assert_eq!(header.column_labels[&1].unit, None);
        assert_eq!(header.column_labels[&2].unit.as_deref(), Some("counts"));
        assert_eq!(header.column_labels[&2].address.as_deref(), Some("scaler:ch1"));
        // invalid column numbers are still kept as metadata
        assert_eq!(header.metadata.len(), 5);
    }

    #[test]
    fn test_column_label_beyond_limit_is_skipped() {
        let config = ReaderConfig::default().with_max_columns(2);
        let header = parse_header(
            &lines("# XDI/1.0\n# Column.3: i0\n#----\n1.0 2.0\n"),
            &config,
        )
        .unwrap();
        assert!(header.column_labels.is_empty());
        assert_eq!(header.metadata.len(), 1);
    }

    #[test]
    fn test_dspacing() {
        let header = parse("# XDI/1.0\n# Mono.d_spacing: 3.13555\n#----\n1.0 2.0\n").unwrap();
        assert_eq!(header.dspacing, Some(3.13555));

        let header = parse("# XDI/1.0\n# Mono.d_spacing: Si(111)\n#----\n1.0 2.0\n").unwrap();
        assert_eq!(header.dspacing, None);
        assert_eq!(header.advisories.len(), 1);
        assert_eq!(header.advisories[0].kind, AdvisoryKind::BadDspacing);
        assert_eq!(header.advisories[0].line_number, Some(2));
        // the entry itself is still recorded
        assert_eq!(header.metadata[0].value, "Si(111)");
    }

    #[test]
    fn test_outer_fields() {
        let header = parse(
            "# XDI/1.0\n# Outer.name: temperature\n# Outer.value: 300\n# Outer.value: 310\n#----\n1.0 2.0\n",
        )
        .unwrap();
        assert_eq!(header.outer_label.as_deref(), Some("temperature"));
        assert_eq!(header.outer_seed, Some(300.0));

        match parse("# XDI/1.0\n# Outer.value: warm\n#----\n1.0 2.0\n") {
            Err(XdiError::NonNumericValue { token, .. }) => assert_eq!(token, "warm"),
            other => panic!("Expected NonNumericValue, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_block() {
        let header = parse(
            "# XDI/1.0\n# Element.symbol: Cu\n# ///\n# first comment\n# Looks.like: metadata\n#\n# last comment\n#----\n# energy i0\n1.0 2.0\n",
        )
        .unwrap();

        assert_eq!(
            header.comments,
            vec!["first comment", "Looks.like: metadata", "last comment"]
        );
        assert_eq!(header.metadata.len(), 1);
        assert!(header.has_separator);
        assert!(header.advisories.is_empty());
    }

    #[test]
    fn test_missing_separator_and_ignored_lines() {
        let header = parse(
            "# XDI/1.0\n# Element.symbol: Cu\n# a stray comment\n# another stray comment\nstray text\n1.0 2.0\n",
        )
        .unwrap();

        let kinds: Vec<AdvisoryKind> = header.advisories.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AdvisoryKind::IgnoredHeaderLine, AdvisoryKind::MissingSeparator]
        );
        // only the first ignored line is reported
        assert_eq!(header.advisories[0].line_number, Some(3));
        assert!(!header.has_separator);
    }

    #[test]
    fn test_lines_after_separator_are_ignored_silently() {
        let header =
            parse("# XDI/1.0\n#----\n# energy i0\n# Not.metadata: here\nlabel row\n1.0 2.0\n")
                .unwrap();
        assert!(header.metadata.is_empty());
        assert!(header.advisories.is_empty());
    }
}
