//! XLSX writer kernel that lays intersection matrices out as worksheets.

use std::collections::BTreeSet;
use std::path::PathBuf;

use matrixkit_core::{EnumCellValue, SpecMatrix};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{C_SHEET_NAME_REPLACEMENT, N_LEN_EXCEL_SHEET_NAME_MAX};
use crate::spec::{
    EnumAutofitColumnsRule, MatrixExportError, SpecCellFormat, SpecMatrixFormats,
    SpecMatrixWriteOptions, SpecSheetSlice, SpecXlsxReport,
};
use crate::util::{estimate_unicode_string_width, plan_sheet_slices, sanitize_sheet_name};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_header: Format,
    fmt_text: Format,
    fmt_integer: Format,
    write_options: SpecMatrixWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format/options presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(
        path_file_out: PathBuf,
        formats: &SpecMatrixFormats,
        write_options: SpecMatrixWriteOptions,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_header: derive_rust_xlsx_format(&formats.header),
            fmt_text: derive_rust_xlsx_format(&formats.text),
            fmt_integer: derive_rust_xlsx_format(&formats.integer),
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return immutable snapshot of per-matrix write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Number of worksheets added so far.
    pub fn sheet_count(&self) -> usize {
        self.set_sheet_names_existing.len()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), MatrixExportError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| MatrixExportError::Write(derive_xlsx_error_text(err)))?;
        self.if_closed = true;
        Ok(())
    }

    /// Write one matrix as one worksheet (several when over Excel limits).
    pub fn write_matrix(&mut self, matrix: &SpecMatrix) -> Result<(), MatrixExportError> {
        if self.if_closed {
            return Err(MatrixExportError::WriterClosed);
        }
        self.write_matrix_sheets(matrix)
            .map_err(MatrixExportError::Write)
    }

    fn write_matrix_sheets(&mut self, matrix: &SpecMatrix) -> Result<(), String> {
        let mut report = SpecXlsxReport {
            matrix_name: matrix.name.clone(),
            ..Default::default()
        };

        let l_sheet_parts = plan_sheet_slices(
            matrix.y_axis.len(),
            matrix.x_axis.len(),
            &sanitize_sheet_name(&matrix.name, C_SHEET_NAME_REPLACEMENT),
            &mut report,
        );
        let l_grid = matrix.to_rows();

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name)?;
            if sheet_name_unique != sheet_slice.sheet_name {
                report.warn(format!(
                    "Sheet name {:?} already used; matrix {:?} written to {:?}.",
                    sheet_slice.sheet_name, matrix.name, sheet_name_unique
                ));
            }

            let worksheet = self.workbook.add_worksheet();
            worksheet
                .set_name(&sheet_name_unique)
                .map_err(derive_xlsx_error_text)?;

            let l_widths = write_sheet_slice(
                worksheet,
                &l_grid,
                &sheet_slice,
                &self.fmt_header,
                &self.fmt_text,
                &self.fmt_integer,
            )?;

            if self.write_options.if_freeze_labels {
                worksheet
                    .set_freeze_panes(1, 1)
                    .map_err(derive_xlsx_error_text)?;
            }
            apply_autofit(worksheet, &l_widths, &self.write_options)?;

            log::debug!(
                "Wrote matrix {:?} to sheet {:?} ({} x {})",
                matrix.name,
                sheet_name_unique,
                sheet_slice.row_end_exclusive - sheet_slice.row_start_inclusive,
                sheet_slice.col_end_exclusive - sheet_slice.col_start_inclusive
            );
            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                ..sheet_slice
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    /// Reserve a sheet name unique under Excel's case-insensitive comparison.
    ///
    /// Collisions become `<base>__<n>`, with the base cut so the suffix fits.
    fn derive_unique_sheet_name(&mut self, name: &str) -> Result<String, String> {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return Ok(name.to_string());
        }

        // Among this many suffixes at least one is free.
        let n_idx_max = self.set_sheet_names_existing.len() + 2;
        for n_idx in 2..=n_idx_max {
            let c_suffix = format!("__{n_idx}");
            let n_len_base_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.chars().count());
            let c_base: String = name.chars().take(usize::max(1, n_len_base_max)).collect();
            let candidate = format!("{c_base}{c_suffix}");
            if self.set_sheet_names_existing.insert(candidate.to_lowercase()) {
                return Ok(candidate);
            }
        }

        Err(format!("No free sheet name left for {name:?}."))
    }
}

/// Per-column `(header, body)` display widths of one written slice.
type TypeColumnWidths = Vec<(usize, usize)>;

/// Write header row, label column and cells of one slice.
///
/// `l_grid` is the full [`SpecMatrix::to_rows`] layout; row 0 and column 0
/// are repeated on every slice.
fn write_sheet_slice(
    worksheet: &mut Worksheet,
    l_grid: &[Vec<EnumCellValue>],
    sheet_slice: &SpecSheetSlice,
    fmt_header: &Format,
    fmt_text: &Format,
    fmt_integer: &Format,
) -> Result<TypeColumnWidths, String> {
    let l_cols_src: Vec<usize> = std::iter::once(0)
        .chain(sheet_slice.col_start_inclusive + 1..sheet_slice.col_end_exclusive + 1)
        .collect();
    let l_rows_src: Vec<usize> = std::iter::once(0)
        .chain(sheet_slice.row_start_inclusive + 1..sheet_slice.row_end_exclusive + 1)
        .collect();

    let mut l_widths = vec![(0usize, 0usize); l_cols_src.len()];
    let value_missing = EnumCellValue::None;

    for (n_row_out, n_row_src) in l_rows_src.iter().enumerate() {
        let Some(l_row) = l_grid.get(*n_row_src) else {
            continue;
        };
        for (n_col_out, n_col_src) in l_cols_src.iter().enumerate() {
            let value = l_row.get(*n_col_src).unwrap_or(&value_missing);
            let format = match (n_row_out, n_col_out) {
                (0, _) => fmt_header,
                (_, 0) => fmt_text,
                _ => fmt_integer,
            };
            write_cell_with_format(worksheet, n_row_out, n_col_out, value, format)?;

            let n_width = estimate_width_len(value);
            let (n_width_header, n_width_body) = &mut l_widths[n_col_out];
            if n_row_out == 0 {
                *n_width_header = usize::max(*n_width_header, n_width);
            } else {
                *n_width_body = usize::max(*n_width_body, n_width);
            }
        }
    }

    Ok(l_widths)
}

fn apply_autofit(
    worksheet: &mut Worksheet,
    l_widths: &[(usize, usize)],
    write_options: &SpecMatrixWriteOptions,
) -> Result<(), String> {
    let policy_autofit = &write_options.policy_autofit;
    if matches!(policy_autofit.rule_columns, EnumAutofitColumnsRule::None) {
        return Ok(());
    }

    let n_min = usize::max(1, policy_autofit.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
    let n_pad = policy_autofit.width_cell_padding;

    for (n_idx_col, (n_width_header, n_width_body)) in l_widths.iter().enumerate() {
        let n_width_recorded = match policy_autofit.rule_columns {
            EnumAutofitColumnsRule::Header => *n_width_header,
            EnumAutofitColumnsRule::Body => *n_width_body,
            EnumAutofitColumnsRule::All | EnumAutofitColumnsRule::None => {
                usize::max(*n_width_header, *n_width_body)
            }
        };
        let n_width_final = usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad));
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)
            .map_err(derive_xlsx_error_text)?;
    }

    Ok(())
}

fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => (*n as i64).to_string().len(),
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), String> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) if val.is_empty() => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
        EnumCellValue::Number(val) => {
            worksheet
                .write_number_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    *val,
                    format,
                )
                .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
