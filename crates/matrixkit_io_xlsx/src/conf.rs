//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecMatrixFormats};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Replacement for illegal sheet-name characters.
pub const C_SHEET_NAME_REPLACEMENT: &str = "_";
/// Sheet name used when sanitising leaves nothing.
pub const C_SHEET_NAME_FALLBACK: &str = "Sheet";

/// Export file name prefix.
pub const C_EXPORT_FILE_PREFIX: &str = "matrices_";
/// Export file name timestamp (UTC, no colons, no millis).
pub const C_EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";
/// Export file extension.
pub const C_EXPORT_FILE_EXTENSION: &str = "xlsx";

/// Build default header/text/integer presets used by [`crate::writer::XlsxWriter`].
pub fn derive_default_matrix_formats() -> SpecMatrixFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Times New Roman".to_string()),
        font_size: Some(11),
        border: Some(1),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecMatrixFormats {
        text: cfg_base_fmt_spec.clone(),
        header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        }),
        integer: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            align: Some("center".to_string()),
            ..Default::default()
        }),
    }
}
