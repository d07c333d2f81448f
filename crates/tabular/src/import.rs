//! Parsing delimited text back into contact rows.
//!
//! The whole input is parsed in one pass before anything is returned. Parsing
//! never touches storage; inserting the accepted rows is a separate,
//! explicitly confirmed step.

use std::fmt;
use std::path::Path;

use database::ContactFields;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Result, TabularError};
use crate::field::{expected_headers, CanonicalField};

/// Field separator of an imported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Tie-break order when the header contains several candidates.
    const PRIORITY: [Delimiter; 3] = [Delimiter::Tab, Delimiter::Comma, Delimiter::Semicolon];

    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }

    /// Pick the delimiter for a whole file from its header line.
    ///
    /// The candidate occurring most often outside double quotes wins; ties go
    /// to tab, then comma, then semicolon. A header with none of them is a
    /// single comma-separated column.
    pub fn detect(header_line: &str) -> Self {
        let mut counts = [0usize; 3];
        let mut in_quotes = false;

        for c in header_line.chars() {
            if c == '"' {
                in_quotes = !in_quotes;
                continue;
            }
            if in_quotes {
                continue;
            }
            if let Some(slot) = Self::PRIORITY.iter().position(|d| d.as_char() == c) {
                counts[slot] += 1;
            }
        }

        let mut best = Delimiter::Comma;
        let mut best_count = 0;
        for (delimiter, count) in Self::PRIORITY.iter().zip(counts) {
            if count > best_count {
                best = *delimiter;
                best_count = count;
            }
        }
        best
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Semicolon => write!(f, "semicolon"),
            Delimiter::Tab => write!(f, "tab"),
        }
    }
}

/// Normalize a header token: trim, drop surrounding quotes, lower-case, and
/// collapse whitespace runs into a single underscore.
pub fn normalize_header(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    unquoted
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Position of each canonical field in the header row, if present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; 10],
}

impl ColumnMap {
    /// Map canonical fields onto a header row.
    ///
    /// The first header matching any synonym of a field wins.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
        let mut indices = [None; 10];

        for (slot, field) in CanonicalField::ALL.iter().enumerate() {
            indices[slot] = normalized.iter().position(|header| field.matches(header));
        }

        Self { indices }
    }

    /// Column index of a field, `None` when the header lacks it.
    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        CanonicalField::ALL
            .iter()
            .position(|f| *f == field)
            .and_then(|slot| self.indices[slot])
    }

    /// Fields the header did not provide.
    pub fn missing(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .iter()
            .zip(self.indices)
            .filter(|(_, index)| index.is_none())
            .map(|(field, _)| *field)
            .collect()
    }

    /// Build a record from one row of values. Absent columns and short rows
    /// yield empty strings.
    pub fn extract(&self, values: &[String]) -> ContactFields {
        let mut record = ContactFields::default();
        for (field, index) in CanonicalField::ALL.iter().zip(self.indices) {
            let value = index
                .and_then(|i| values.get(i))
                .cloned()
                .unwrap_or_default();
            field.set(&mut record, value);
        }
        record
    }
}

impl Serialize for ColumnMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CanonicalField::ALL.len()))?;
        for (field, index) in CanonicalField::ALL.iter().zip(self.indices) {
            map.serialize_entry(field.column_name(), &index)?;
        }
        map.end()
    }
}

/// Rows accepted from an import file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportBatch {
    /// Accepted rows in file order.
    pub rows: Vec<ContactFields>,
    /// Non-blank data rows seen (header excluded).
    pub rows_read: usize,
    pub delimiter: Delimiter,
    pub columns: ColumnMap,
}

impl ImportBatch {
    /// Number of accepted rows.
    pub fn accepted(&self) -> usize {
        self.rows.len()
    }

    /// Number of data rows dropped for lacking a name or phone number.
    pub fn rejected(&self) -> usize {
        self.rows_read - self.rows.len()
    }

    /// First accepted row, shown to the user before they confirm.
    pub fn preview(&self) -> Option<&ContactFields> {
        self.rows.first()
    }
}

/// Result of parsing an import file.
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// At least one row was accepted.
    Ready(ImportBatch),
    /// Nothing usable was found; callers should show [`expected_headers`].
    NoValidRows {
        rows_read: usize,
        columns: ColumnMap,
    },
}

impl ImportOutcome {
    /// The accepted batch, if any.
    pub fn batch(&self) -> Option<&ImportBatch> {
        match self {
            ImportOutcome::Ready(batch) => Some(batch),
            ImportOutcome::NoValidRows { .. } => None,
        }
    }

    /// Header names to suggest when nothing could be imported.
    pub fn expected_headers(&self) -> Vec<&'static str> {
        expected_headers()
    }
}

/// One parsed line (or quoted multi-line record).
#[derive(Debug, Default)]
struct Record {
    values: Vec<String>,
    any_quoted: bool,
}

impl Record {
    /// A line with nothing but whitespace. Tabs are whitespace, so a tab-only
    /// line in a TSV file is blank; `,,,` in a CSV file is an empty row.
    fn is_blank(&self, delimiter: Delimiter) -> bool {
        !self.any_quoted
            && self.values.iter().all(String::is_empty)
            && (self.values.len() <= 1 || delimiter == Delimiter::Tab)
    }
}

/// Accumulates the current field while scanning.
#[derive(Default)]
struct FieldBuf {
    text: String,
    // The field exactly as written, quotes included.
    raw: String,
    quoted: bool,
    // Byte length of the quoted section; text after it trails the closing quote.
    quoted_len: usize,
    in_quotes: bool,
    at_start: bool,
}

impl FieldBuf {
    fn new() -> Self {
        Self {
            at_start: true,
            ..Default::default()
        }
    }

    fn finish(&mut self) -> String {
        let value = if self.quoted {
            let (inner, trailing) = self.text.split_at(self.quoted_len);
            if trailing.trim().is_empty() {
                inner.to_string()
            } else {
                // `"expert" mason` is not a quoted field, just text.
                strip_quote_pair(self.raw.trim()).to_string()
            }
        } else {
            strip_quote_pair(self.text.trim()).to_string()
        };
        *self = FieldBuf::new();
        value
    }
}

/// Remove one matching pair of surrounding single or double quotes.
fn strip_quote_pair(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Split text into records and fields.
///
/// A double quote opens a quoted field only at the start of a field (leading
/// whitespace allowed). Inside quotes, delimiters and newlines are data and
/// `""` is a literal quote. Text after the closing quote turns the field
/// back into plain text.
fn parse_records(text: &str, delimiter: char) -> Vec<Record> {
    let mut records = Vec::new();
    let mut record = Record::default();
    let mut field = FieldBuf::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if field.in_quotes {
            field.raw.push(c);
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.raw.push('"');
                    field.text.push('"');
                } else {
                    field.in_quotes = false;
                    field.quoted_len = field.text.len();
                }
            } else {
                field.text.push(c);
            }
            continue;
        }

        if c == '"' && field.at_start {
            field.raw.push(c);
            field.text.clear();
            field.in_quotes = true;
            field.quoted = true;
            field.at_start = false;
            record.any_quoted = true;
        } else if c == delimiter {
            record.values.push(field.finish());
        } else if c == '\n' {
            record.values.push(field.finish());
            records.push(std::mem::take(&mut record));
        } else {
            if !c.is_whitespace() {
                field.at_start = false;
            }
            field.raw.push(c);
            field.text.push(c);
        }
    }

    // An unterminated quote keeps whatever was read.
    if field.in_quotes {
        field.quoted_len = field.text.len();
    }
    if !field.text.is_empty() || field.quoted || !record.values.is_empty() {
        record.values.push(field.finish());
        records.push(record);
    }

    records
}

/// Parse the raw contents of an import file.
///
/// Blank lines are skipped, the first remaining record is the header, and a
/// data row is accepted only when both name and phone number are non-empty.
pub fn parse_import(text: &str) -> ImportOutcome {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(header_line) = text.lines().find(|line| !line.trim().is_empty()) else {
        return ImportOutcome::NoValidRows {
            rows_read: 0,
            columns: ColumnMap::default(),
        };
    };

    let delimiter = Delimiter::detect(header_line);
    let mut records = parse_records(text, delimiter.as_char())
        .into_iter()
        .filter(|record| !record.is_blank(delimiter));

    let columns = match records.next() {
        Some(header) => ColumnMap::from_headers(&header.values),
        None => ColumnMap::default(),
    };

    let mut rows = Vec::new();
    let mut rows_read = 0;
    for record in records {
        rows_read += 1;
        let row = columns.extract(&record.values);
        if row.has_required() {
            rows.push(row);
        }
    }

    tracing::debug!(
        delimiter = %delimiter,
        rows_read,
        accepted = rows.len(),
        missing = ?columns.missing(),
        "Parsed import file"
    );

    if rows.is_empty() {
        return ImportOutcome::NoValidRows { rows_read, columns };
    }

    ImportOutcome::Ready(ImportBatch {
        rows,
        rows_read,
        delimiter,
        columns,
    })
}

/// Read and parse an import file from disk.
///
/// A file that cannot be read, or is not valid UTF-8, is an error; a file
/// without usable rows is reported through [`ImportOutcome::NoValidRows`].
pub fn load_import_file(path: impl AsRef<Path>) -> Result<ImportOutcome> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| TabularError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_import(&text))
}
