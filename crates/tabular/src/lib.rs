//! Tabular import/export of worker contacts.
//!
//! Export renders contacts as CSV or TSV with a fixed ten-column header.
//! Import accepts comma, semicolon or tab separated text, recognises a range
//! of header spellings in any column order, and keeps rows that carry both a
//! name and a phone number.
//!
//! # Example
//!
//! ```
//! use database::ContactFields;
//! use tabular::{export_contacts, parse_import, ExportFormat, ImportOutcome};
//!
//! let ravi = ContactFields::new("Ravi Kumar", "9876543210");
//! let text = export_contacts([&ravi], ExportFormat::Csv);
//!
//! match parse_import(&text) {
//!     ImportOutcome::Ready(batch) => assert_eq!(batch.rows, vec![ravi]),
//!     ImportOutcome::NoValidRows { .. } => unreachable!(),
//! }
//! ```

pub mod error;
pub mod export;
pub mod field;
pub mod format;
pub mod import;

pub use error::{Result, TabularError};
pub use export::{export_contacts, export_file_name, header_line};
pub use field::{expected_headers, CanonicalField};
pub use format::ExportFormat;
pub use import::{
    load_import_file, normalize_header, parse_import, ColumnMap, Delimiter, ImportBatch,
    ImportOutcome,
};
