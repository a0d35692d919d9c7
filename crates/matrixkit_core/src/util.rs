//! Stateless helpers shared by the collector and builder.

use crate::conf::{C_MATRIX_NAME_SEPARATOR, N_WORKERS_DEFAULT_MAX};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Coerce a raw cell to trimmed text; `None` when missing or blank.
pub fn derive_axis_text(value: Option<&EnumCellValue>) -> Option<String> {
    let c_text = match value? {
        EnumCellValue::None => return None,
        EnumCellValue::String(s) => s.trim().to_string(),
        EnumCellValue::Number(n) => convert_number_to_text(*n),
    };
    if c_text.is_empty() {
        return None;
    }
    Some(c_text)
}

/// Shortest round-trip text of a number (`3.0` -> `"3"`).
pub fn convert_number_to_text(n: f64) -> String {
    if n.is_nan() {
        return String::new();
    }
    n.to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// Drop the final extension of a file name (`a.b.xlsx` -> `a.b`).
pub fn strip_file_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((c_stem, _)) if !c_stem.is_empty() => c_stem,
        _ => file_name,
    }
}

/// Join name parts with the matrix name separator.
pub fn join_matrix_name(parts: &[&str]) -> String {
    parts.join(C_MATRIX_NAME_SEPARATOR)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, N_WORKERS_DEFAULT_MAX),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
