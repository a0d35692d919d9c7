//! Matrix specification models, output records and top-level error types.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region SheetTableSpecification

/// Raw cell value as produced by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One parsed sheet: ordered headers plus rows keyed by header name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetTable {
    /// Sheet identifier, unique within its file.
    pub sheet_name: String,
    /// Ordered, distinct column names.
    pub headers: Vec<String>,
    /// Ordered records mapping header name to raw value.
    pub rows: Vec<BTreeMap<String, EnumCellValue>>,
}

impl SpecSheetTable {
    /// Create an empty table with the given headers.
    pub fn new(sheet_name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append one positional row. Missing trailing values become `None`;
    /// values beyond the header width are dropped.
    pub fn push_row(&mut self, values: Vec<EnumCellValue>) {
        let mut iter_values = values.into_iter();
        let dict_row = self
            .headers
            .iter()
            .map(|c_header| {
                (
                    c_header.clone(),
                    iter_values.next().unwrap_or(EnumCellValue::None),
                )
            })
            .collect();
        self.rows.push(dict_row);
    }

    /// Whether `column` is one of the table headers.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|c_header| c_header == column)
    }

    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Origin of a parsed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSheetFileType {
    /// Delimited text; always exactly one sheet.
    Csv,
    /// Spreadsheet workbook; one sheet per worksheet.
    Excel,
}

/// All sheets parsed from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetFile {
    /// Display name of the file (base name with extension).
    pub file_name: String,
    /// Parsed file kind.
    pub file_type: EnumSheetFileType,
    /// Sheets in file order.
    pub sheets: Vec<SpecSheetTable>,
}

impl SpecSheetFile {
    /// Look up a sheet by exact name.
    pub fn find_sheet(&self, sheet_name: &str) -> Option<&SpecSheetTable> {
        self.sheets.iter().find(|sheet| sheet.sheet_name == sheet_name)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region AxisSelectionSpecification

/// Lookup key of an axis selection: file position plus sheet name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpecAxisSelectionKey {
    /// Zero-based index into the ingested file list.
    pub file_index: usize,
    /// Sheet name inside that file.
    pub sheet_name: String,
}

impl SpecAxisSelectionKey {
    pub fn new(file_index: usize, sheet_name: impl Into<String>) -> Self {
        Self {
            file_index,
            sheet_name: sheet_name.into(),
        }
    }
}

/// Complete per-sheet axis selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAxisSelection {
    /// Column whose distinct values become matrix rows.
    pub y_axis_column: String,
    /// Column whose distinct values become matrix columns.
    pub x_axis_column: String,
    /// Optional column splitting the output into one matrix per value.
    pub secondary_axis_column: Option<String>,
}

impl SpecAxisSelection {
    pub fn new(y_axis_column: impl Into<String>, x_axis_column: impl Into<String>) -> Self {
        Self {
            y_axis_column: y_axis_column.into(),
            x_axis_column: x_axis_column.into(),
            secondary_axis_column: None,
        }
    }

    /// Return a copy with the secondary (split) column set.
    pub fn with_secondary(mut self, secondary_axis_column: impl Into<String>) -> Self {
        self.secondary_axis_column = Some(secondary_axis_column.into());
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MatrixConfigSpecification

/// Reference to one sheet participating in a matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMatrixSource {
    /// Zero-based index into the ingested file list.
    pub file_index: usize,
    /// Sheet name inside that file.
    pub sheet_name: String,
    /// Display name of the file.
    pub file_name: String,
}

impl SpecMatrixSource {
    pub fn new(
        file_index: usize,
        sheet_name: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            file_index,
            sheet_name: sheet_name.into(),
            file_name: file_name.into(),
        }
    }

    /// Selection key for this source.
    pub fn key(&self) -> SpecAxisSelectionKey {
        SpecAxisSelectionKey::new(self.file_index, self.sheet_name.clone())
    }
}

/// Named matrix definition over one or more sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMatrixConfig {
    /// User-assigned label.
    pub name: String,
    /// Ordered sources.
    pub sources: Vec<SpecMatrixSource>,
    /// Combine all sources into one axis universe.
    pub if_merge: bool,
}

/// Allow-list restricting which X values may become matrix columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecMatrixFilter {
    /// Allowed X values (exact match, already trimmed).
    pub values: BTreeSet<String>,
}

impl SpecMatrixFilter {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `value` passes the filter.
    pub fn allows(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

/// Options for one matrix computation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBuildOptions {
    /// Maximum worker threads for independent-mode sources.
    ///
    /// `Some(1)` runs serially; `None` uses the available parallelism.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecBuildOptions {
    fn default() -> Self {
        Self {
            num_workers_max: Some(1),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MatrixSpecification

/// Binary intersection matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecMatrix {
    /// Matrix label (suffixed with the secondary value when split).
    pub name: String,
    /// Sorted distinct row labels.
    #[serde(rename = "yAxis")]
    pub y_axis: Vec<String>,
    /// Sorted distinct column labels.
    #[serde(rename = "xAxis")]
    pub x_axis: Vec<String>,
    /// `y_axis.len()` rows of `x_axis.len()` cells, each 0 or 1.
    #[serde(rename = "data")]
    pub cells: Vec<Vec<u8>>,
}

impl SpecMatrix {
    /// Export grid: `["", ...x_axis]` then `[y_axis[i], ...cells[i]]`.
    pub fn to_rows(&self) -> Vec<Vec<EnumCellValue>> {
        let mut l_rows = Vec::with_capacity(self.y_axis.len() + 1);

        let mut l_header = Vec::with_capacity(self.x_axis.len() + 1);
        l_header.push(EnumCellValue::String(String::new()));
        l_header.extend(self.x_axis.iter().map(|c_x| EnumCellValue::from(c_x.as_str())));
        l_rows.push(l_header);

        for (c_y, l_cells) in self.y_axis.iter().zip(&self.cells) {
            let mut l_row = Vec::with_capacity(l_cells.len() + 1);
            l_row.push(EnumCellValue::from(c_y.as_str()));
            l_row.extend(l_cells.iter().map(|n| EnumCellValue::Number(f64::from(*n))));
            l_rows.push(l_row);
        }

        l_rows
    }

    /// Number of set cells.
    pub fn count_ones(&self) -> usize {
        self.cells
            .iter()
            .map(|l_row| l_row.iter().filter(|n| **n == 1).count())
            .sum()
    }

    /// Grid dimensions match the axes and every cell is 0 or 1.
    pub fn is_well_formed(&self) -> bool {
        self.cells.len() == self.y_axis.len()
            && self
                .cells
                .iter()
                .all(|l_row| l_row.len() == self.x_axis.len() && l_row.iter().all(|n| *n <= 1))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Configuration failures detected before any matrix is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixConfigError {
    /// Matrix definition lists no sources.
    #[error("Matrix {name:?} has no sources.")]
    EmptySources {
        /// Offending matrix name.
        name: String,
    },
    /// A resolvable source lacks a Y or X column selection.
    #[error("Sheet {sheet_name:?} of file #{file_index} needs both a Y axis and an X axis column.")]
    IncompleteAxisSelection {
        /// File position.
        file_index: usize,
        /// Sheet name.
        sheet_name: String,
    },
    /// Selection key is not `<fileIndex>-<sheetName>`.
    #[error("Invalid column selection key: {0:?}")]
    InvalidSelectionKey(String),
    /// Configuration document could not be parsed.
    #[error("Invalid configuration document: {0}")]
    InvalidDocument(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn derive_matrix() -> SpecMatrix {
        SpecMatrix {
            name: "m".to_string(),
            y_axis: vec!["Alice".to_string(), "Bob".to_string()],
            x_axis: vec!["Admin".to_string(), "Editor".to_string()],
            cells: vec![vec![1, 1], vec![1, 0]],
        }
    }

    #[test]
    fn test_push_row_pads_and_truncates_to_headers() {
        let mut table = SpecSheetTable::new("S", vec!["A".to_string(), "B".to_string()]);
        table.push_row(vec![EnumCellValue::from("x")]);
        table.push_row(vec![
            EnumCellValue::from("1"),
            EnumCellValue::from("2"),
            EnumCellValue::from("3"),
        ]);

        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[0]["B"], EnumCellValue::None);
        assert_eq!(table.rows[1].len(), 2);
        assert!(table.has_column("A"));
        assert!(!table.has_column("C"));
    }

    #[test]
    fn test_to_rows_follows_export_layout() {
        let l_rows = derive_matrix().to_rows();

        assert_eq!(l_rows.len(), 3);
        assert_eq!(
            l_rows[0],
            vec![
                EnumCellValue::from(""),
                EnumCellValue::from("Admin"),
                EnumCellValue::from("Editor"),
            ]
        );
        assert_eq!(
            l_rows[2],
            vec![
                EnumCellValue::from("Bob"),
                EnumCellValue::Number(1.0),
                EnumCellValue::Number(0.0),
            ]
        );
    }

    #[test]
    fn test_matrix_serializes_with_camel_case_field_names() {
        let value = serde_json::to_value(derive_matrix()).expect("serialize");

        assert_eq!(value["name"], "m");
        assert_eq!(value["yAxis"][1], "Bob");
        assert_eq!(value["xAxis"][0], "Admin");
        assert_eq!(value["data"][0][1], 1);
    }

    #[test]
    fn test_well_formed_and_count_ones() {
        let mut matrix = derive_matrix();
        assert!(matrix.is_well_formed());
        assert_eq!(matrix.count_ones(), 3);

        matrix.cells[1].push(0);
        assert!(!matrix.is_well_formed());
    }
}
