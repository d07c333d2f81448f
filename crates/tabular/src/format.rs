//! Export formats and field escaping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TabularError;

/// Delimited text flavours produced by export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values.
    Csv,
    /// Tab-separated values, offered to users as "Excel Compatible".
    Tsv,
}

impl ExportFormat {
    /// Field delimiter.
    pub fn delimiter(&self) -> char {
        match self {
            ExportFormat::Csv => ',',
            ExportFormat::Tsv => '\t',
        }
    }

    /// File extension used for saved exports.
    ///
    /// TSV files are saved as `.xls` so spreadsheet apps open them directly.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "xls",
        }
    }

    /// MIME type for downloads.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Tsv => "text/tab-separated-values; charset=utf-8",
        }
    }

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Tsv => "Excel Compatible",
        }
    }

    /// Whether a value must be wrapped in quotes in this format.
    ///
    /// Besides delimiters, line breaks and double quotes, values whose edges
    /// import would trim or unquote are quoted too.
    fn needs_quoting(&self, value: &str) -> bool {
        let edge = |c: char| c.is_whitespace() || c == '\'' || c == '"';
        value.contains([self.delimiter(), '"', '\n', '\r'])
            || value.starts_with(edge)
            || value.ends_with(edge)
    }

    /// Escape one field value for this format.
    ///
    /// Quoted values have their inner double quotes doubled.
    pub fn escape_field(&self, value: &str) -> String {
        if self.needs_quoting(value) {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Tsv => write!(f, "tsv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TabularError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" | "excel" | "xls" => Ok(ExportFormat::Tsv),
            other => Err(TabularError::UnknownFormat(other.to_string())),
        }
    }
}
