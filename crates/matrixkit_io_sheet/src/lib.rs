//! `matrixkit_io_sheet` v1:
//! Sheet ingestion kernel.
//!
//! Modules:
//! - `conf`   : extension tables and naming constants
//! - `spec`   : read options and errors
//! - `util`   : header normalisation and file-type dispatch
//! - `reader` : CSV (polars) and workbook (calamine) readers
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;

pub use conf::{TUP_EXTENSIONS_CSV, TUP_EXTENSIONS_WORKBOOK};
pub use reader::{
    derive_sheet_table_from_dataframe, read_sheet_file, read_sheet_file_from_bytes,
    read_sheet_files,
};
pub use spec::{SheetReadError, SpecSheetReadOptions};
pub use util::{derive_file_type, derive_sheet_table_from_grid, normalize_headers};
