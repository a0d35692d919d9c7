//! Pure helpers for sheet naming, slicing and export file naming.

use chrono::{DateTime, Utc};

use crate::conf::{
    C_EXPORT_FILE_EXTENSION, C_EXPORT_FILE_PREFIX, C_EXPORT_TIMESTAMP_FORMAT,
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecSheetSlice, SpecXlsxReport};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split a `n_y` x `n_x` matrix into Excel-compliant sheet slices.
///
/// One row and one column of every sheet are taken by the labels.
pub fn plan_sheet_slices(
    n_y: usize,
    n_x: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Vec<SpecSheetSlice> {
    let n_rows_data_max = N_NROWS_EXCEL_MAX - 1;
    let n_cols_data_max = N_NCOLS_EXCEL_MAX - 1;

    let l_col_slices = derive_axis_slices(n_x, n_cols_data_max);
    let l_row_slices = derive_axis_slices(n_y, n_rows_data_max);
    let n_parts_total = l_col_slices.len() * l_row_slices.len();

    let mut l_sheet_parts = Vec::with_capacity(n_parts_total);
    let mut n_idx_part = 1;
    for (col_start, col_end) in &l_col_slices {
        for (row_start, row_end) in &l_row_slices {
            let c_part_sheet_name = if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx_part)
            };

            l_sheet_parts.push(SpecSheetSlice {
                sheet_name: c_part_sheet_name,
                row_start_inclusive: *row_start,
                row_end_exclusive: *row_end,
                col_start_inclusive: *col_start,
                col_end_exclusive: *col_end,
            });
            n_idx_part += 1;
        }
    }

    if n_parts_total > 1 {
        let c_warning = format!(
            "Excel limit overflow: matrix {:?} ({n_y} x {n_x}) split into {n_parts_total} sheets (columns-first, then rows).",
            report.matrix_name
        );
        report.warn(c_warning);
    }

    l_sheet_parts
}

fn derive_axis_slices(n_len: usize, n_len_max: usize) -> Vec<(usize, usize)> {
    let mut l_slices = Vec::new();
    let mut n_start = 0;
    while n_start < n_len {
        let n_end = usize::min(n_len, n_start + n_len_max);
        l_slices.push((n_start, n_end));
        n_start = n_end;
    }
    if l_slices.is_empty() {
        l_slices.push((0, 0));
    }
    l_slices
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Export

/// `matrices_<YYYY-MM-DDTHH-MM-SS>.xlsx` for the given instant.
pub fn derive_export_file_name(now: DateTime<Utc>) -> String {
    format!(
        "{C_EXPORT_FILE_PREFIX}{}.{C_EXPORT_FILE_EXTENSION}",
        now.format(C_EXPORT_TIMESTAMP_FORMAT)
    )
}

/// Display width estimate; non-ASCII glyphs count wider.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c*d?e[f]g\\h", "_"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name("A very long matrix name - with suffix", "_"),
            "A very long matrix name - with "
        );
        assert_eq!(sanitize_sheet_name(&"é".repeat(40), "_").chars().count(), 31);
    }

    #[test]
    fn test_plan_sheet_slices_single_part() {
        let mut report = SpecXlsxReport::default();
        let l_parts = plan_sheet_slices(2, 3, "M", &mut report);

        assert_eq!(l_parts.len(), 1);
        assert_eq!(l_parts[0].sheet_name, "M");
        assert_eq!(l_parts[0].col_end_exclusive, 3);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_plan_sheet_slices_splits_wide_matrix() {
        let mut report = SpecXlsxReport::default();
        let l_parts = plan_sheet_slices(2, N_NCOLS_EXCEL_MAX + 5, "Wide", &mut report);

        assert_eq!(l_parts.len(), 2);
        assert_eq!(l_parts[0].sheet_name, "Wide_1");
        assert_eq!(l_parts[0].col_end_exclusive, N_NCOLS_EXCEL_MAX - 1);
        assert_eq!(l_parts[1].col_start_inclusive, N_NCOLS_EXCEL_MAX - 1);
        assert_eq!(l_parts[1].col_end_exclusive, N_NCOLS_EXCEL_MAX + 5);
        assert_eq!(l_parts[1].row_end_exclusive, 2);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_plan_sheet_slices_empty_matrix_keeps_one_sheet() {
        let mut report = SpecXlsxReport::default();
        let l_parts = plan_sheet_slices(0, 0, "E", &mut report);
        assert_eq!(l_parts.len(), 1);
        assert_eq!((l_parts[0].row_end_exclusive, l_parts[0].col_end_exclusive), (0, 0));
    }

    #[test]
    fn test_create_sheet_identifier_respects_length_cap() {
        let c_name = create_sheet_identifier(&"x".repeat(31), 12);
        assert_eq!(c_name.chars().count(), 31);
        assert!(c_name.ends_with("_12"));
    }

    #[test]
    fn test_derive_export_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).single().expect("valid");
        assert_eq!(derive_export_file_name(now), "matrices_2024-03-05T07-08-09.xlsx");
    }
}
