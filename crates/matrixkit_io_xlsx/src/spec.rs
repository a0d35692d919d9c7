//! Shared XLSX export specification models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::conf::derive_default_matrix_formats;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Format presets of one matrix sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMatrixFormats {
    /// X labels in the header row and the corner cell.
    pub header: SpecCellFormat,
    /// Y labels in the first column.
    pub text: SpecCellFormat,
    /// 0/1 intersection cells.
    pub integer: SpecCellFormat,
}

impl Default for SpecMatrixFormats {
    fn default() -> Self {
        derive_default_matrix_formats()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from the header row only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy for matrix sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            width_cell_min: 4,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMatrixWriteOptions {
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Freeze the header row and the Y-label column.
    pub if_freeze_labels: bool,
}

impl Default for SpecMatrixWriteOptions {
    fn default() -> Self {
        Self {
            policy_autofit: SpecAutofitCellsPolicy::default(),
            if_freeze_labels: true,
        }
    }
}

/// Options of [`crate::export::export_matrices`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecMatrixExportOptions {
    /// Cell format presets.
    pub formats: SpecMatrixFormats,
    /// Writer options.
    pub write_options: SpecMatrixWriteOptions,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
///
/// Ranges index the matrix axes, not worksheet cells; every part also carries
/// the header row and the Y-label column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive Y index start.
    pub row_start_inclusive: usize,
    /// Exclusive Y index end.
    pub row_end_exclusive: usize,
    /// Inclusive X index start.
    pub col_start_inclusive: usize,
    /// Exclusive X index end.
    pub col_end_exclusive: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-matrix write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Source matrix name.
    pub matrix_name: String,
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        let c_msg = msg.as_ref().to_string();
        log::warn!("{c_msg}");
        self.warnings.push(c_msg);
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_sheets".to_string(), self.sheets.len() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let l_sheet_names: Vec<&str> = self.sheets.iter().map(|s| s.sheet_name.as_str()).collect();
        format!(
            "{prefix} matrix={:?} sheets=[{}] warnings={}",
            self.matrix_name,
            l_sheet_names.join(", "),
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecXlsxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XLSX]"))
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMatrixExportResult {
    /// Written workbook path.
    pub path_file_out: PathBuf,
    /// One report per exported matrix, in input order.
    pub reports: Vec<SpecXlsxReport>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export failures. Computed matrices are untouched and can be exported again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixExportError {
    /// Nothing to export; a workbook needs at least one sheet.
    #[error("No matrices to export.")]
    EmptyMatrixList,
    /// Writer was already closed.
    #[error("Cannot write after close().")]
    WriterClosed,
    /// Output directory could not be prepared.
    #[error("Failed to prepare {path:?}: {message}")]
    Io {
        /// Directory path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Workbook construction or save failed.
    #[error("{0}")]
    Write(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
