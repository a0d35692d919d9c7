//! `matrixkit_io_xlsx` v1:
//! Matrix export kernel.
//!
//! Modules:
//! - `conf`   : Excel limits, naming constants and default format presets
//! - `spec`   : formats, options, reports and errors
//! - `util`   : pure naming and slicing helpers
//! - `writer` : workbook writer
//! - `export` : one-call timestamped export
pub mod conf;
pub mod export;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_matrix_formats,
};
pub use export::{export_matrices, export_matrices_to_path};
pub use spec::{
    EnumAutofitColumnsRule, MatrixExportError, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecMatrixExportOptions, SpecMatrixExportResult, SpecMatrixFormats, SpecMatrixWriteOptions,
    SpecSheetSlice, SpecXlsxReport,
};
pub use util::{
    create_sheet_identifier, derive_export_file_name, plan_sheet_slices, sanitize_sheet_name,
};
pub use writer::XlsxWriter;
