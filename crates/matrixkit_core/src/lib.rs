//! `matrixkit_core` v1:
//! Intersection matrix engine over ingested sheets.
//!
//! Modules:
//! - `conf`    : constants
//! - `spec`    : sheet/selection/matrix models and errors
//! - `config`  : JSON configuration document and validated plans
//! - `collect` : distinct axis value collection
//! - `build`   : matrix construction (independent and merge modes)
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod build;
pub mod collect;
pub mod conf;
pub mod config;
pub mod report;
pub mod spec;
pub mod util;

pub use build::{SheetResolver, build_matrices, compute_matrices};
pub use collect::{collect_axis_values, iter_axis_values};
pub use conf::{C_MATRIX_NAME_SEPARATOR, C_SELECTION_KEY_SEPARATOR, N_WORKERS_DEFAULT_MAX};
pub use config::{
    SpecAxisSelectionDocument, SpecFilterConfigDocument, SpecMatrixConfigDocument,
    SpecMatrixConfigEntryDocument, SpecMatrixPlan, SpecMatrixSourceDocument, parse_selection_key,
};
pub use report::{ReportMatrix, ReportMatrixBuilder};
pub use spec::{
    EnumCellValue, EnumSheetFileType, MatrixConfigError, SpecAxisSelection, SpecAxisSelectionKey,
    SpecBuildOptions, SpecMatrix, SpecMatrixConfig, SpecMatrixFilter, SpecMatrixSource,
    SpecSheetFile, SpecSheetTable,
};
pub use util::{convert_number_to_text, derive_axis_text, join_matrix_name, strip_file_extension};
