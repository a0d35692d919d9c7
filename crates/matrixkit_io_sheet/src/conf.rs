//! Ingestion constants.

/// Extensions read as delimited text (lower-case, without dot).
pub const TUP_EXTENSIONS_CSV: &[&str] = &["csv"];
/// Extensions read as spreadsheet workbooks (lower-case, without dot).
pub const TUP_EXTENSIONS_WORKBOOK: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Prefix of generated names for blank header cells.
pub const C_HEADER_UNNAMED_PREFIX: &str = "Unnamed: ";
/// Separator between a repeated header and its occurrence number.
pub const C_HEADER_DUPLICATE_SEPARATOR: &str = ".";

/// Default CSV field separator.
pub const N_CSV_SEPARATOR_DEFAULT: u8 = b',';
