//! Matrix computation constants.

/// Separator between name parts of generated matrices.
pub const C_MATRIX_NAME_SEPARATOR: &str = " - ";
/// Separator between file index and sheet name in selection keys.
pub const C_SELECTION_KEY_SEPARATOR: char = '-';
/// Worker cap applied when `num_workers_max` is `None`.
pub const N_WORKERS_DEFAULT_MAX: usize = 8;
