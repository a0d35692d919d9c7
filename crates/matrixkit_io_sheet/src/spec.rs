//! Ingestion options and errors.

use thiserror::Error;

use crate::conf::N_CSV_SEPARATOR_DEFAULT;

/// Options shared by every ingestion entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReadOptions {
    /// CSV field separator byte.
    pub csv_separator: u8,
    /// Drop workbook sheets that contain no header row.
    pub if_skip_empty_sheets: bool,
}

impl Default for SpecSheetReadOptions {
    fn default() -> Self {
        Self {
            csv_separator: N_CSV_SEPARATOR_DEFAULT,
            if_skip_empty_sheets: false,
        }
    }
}

/// Failures while turning an input file into sheet tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetReadError {
    /// Extension is neither CSV nor a known workbook format.
    #[error("Unsupported file type: {file_name:?}")]
    UnsupportedFileType {
        /// Offending file name.
        file_name: String,
    },
    /// File could not be read from disk.
    #[error("Failed to read {file_name:?}: {message}")]
    Io {
        /// File name.
        file_name: String,
        /// Underlying error text.
        message: String,
    },
    /// File content could not be parsed.
    #[error("Failed to parse {file_name:?}: {message}")]
    Parse {
        /// File name.
        file_name: String,
        /// Underlying error text.
        message: String,
    },
}
