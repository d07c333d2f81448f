//! Serialising contacts into delimited text.

use database::ContactFields;

use crate::field::CanonicalField;
use crate::format::ExportFormat;

/// Header row for a format, without a trailing newline.
pub fn header_line(format: ExportFormat) -> String {
    let delimiter = format.delimiter().to_string();
    CanonicalField::ALL
        .iter()
        .map(|field| field.header_label())
        .collect::<Vec<_>>()
        .join(&delimiter)
}

/// One record as a single delimited line.
pub fn record_line(record: &ContactFields, format: ExportFormat) -> String {
    let delimiter = format.delimiter().to_string();
    CanonicalField::ALL
        .iter()
        .map(|field| format.escape_field(field.get(record)))
        .collect::<Vec<_>>()
        .join(&delimiter)
}

/// Render records as a complete export blob.
///
/// The header comes first, then one line per record in the given order.
/// Lines are separated by `\n` with no trailing newline.
pub fn export_contacts<'a, I>(records: I, format: ExportFormat) -> String
where
    I: IntoIterator<Item = &'a ContactFields>,
{
    let mut lines = vec![header_line(format)];
    lines.extend(records.into_iter().map(|record| record_line(record, format)));

    tracing::debug!(format = %format, rows = lines.len() - 1, "Rendered export");

    lines.join("\n")
}

/// File name for a saved export, e.g. `contacts_export_2025-03-01T10-20-30-000Z.csv`.
///
/// `:` and `.` in the timestamp are replaced with `-`.
pub fn export_file_name(format: ExportFormat, timestamp: &str) -> String {
    let stamp: String = timestamp
        .chars()
        .map(|c| if c == ':' || c == '.' { '-' } else { c })
        .collect();
    format!("contacts_export_{}.{}", stamp, format.extension())
}
