//! One-call export of computed matrices into a timestamped workbook.

use std::path::Path;

use chrono::Utc;
use matrixkit_core::SpecMatrix;

use crate::spec::{MatrixExportError, SpecMatrixExportOptions, SpecMatrixExportResult};
use crate::util::derive_export_file_name;
use crate::writer::XlsxWriter;

/// Write `matrices` to `<dir_out>/matrices_<timestamp>.xlsx`, one sheet each.
///
/// `dir_out` is created when missing.
pub fn export_matrices(
    matrices: &[SpecMatrix],
    dir_out: &Path,
    options: &SpecMatrixExportOptions,
) -> Result<SpecMatrixExportResult, MatrixExportError> {
    if matrices.is_empty() {
        return Err(MatrixExportError::EmptyMatrixList);
    }
    std::fs::create_dir_all(dir_out).map_err(|err| MatrixExportError::Io {
        path: dir_out.to_path_buf(),
        message: err.to_string(),
    })?;

    export_matrices_to_path(
        matrices,
        &dir_out.join(derive_export_file_name(Utc::now())),
        options,
    )
}

/// Write `matrices` to an explicit workbook path.
pub fn export_matrices_to_path(
    matrices: &[SpecMatrix],
    path_file_out: &Path,
    options: &SpecMatrixExportOptions,
) -> Result<SpecMatrixExportResult, MatrixExportError> {
    if matrices.is_empty() {
        return Err(MatrixExportError::EmptyMatrixList);
    }

    let mut writer = XlsxWriter::new(
        path_file_out.to_path_buf(),
        &options.formats,
        options.write_options.clone(),
    );
    for matrix in matrices {
        writer.write_matrix(matrix)?;
    }
    writer.close()?;

    let reports = writer.report();
    log::info!(
        "Exported {} matrices to {} ({} sheets)",
        matrices.len(),
        writer.file_out(),
        writer.sheet_count()
    );

    Ok(SpecMatrixExportResult {
        path_file_out: path_file_out.to_path_buf(),
        reports,
    })
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use tempfile::tempdir;

    use super::*;

    fn derive_matrices() -> Vec<SpecMatrix> {
        vec![
            SpecMatrix {
                name: "Access - HR".to_string(),
                y_axis: vec!["Alice".to_string(), "Bob".to_string()],
                x_axis: vec!["Admin".to_string(), "Editor".to_string()],
                cells: vec![vec![1, 0], vec![1, 0]],
            },
            SpecMatrix {
                name: "Access - Eng".to_string(),
                y_axis: vec!["Alice".to_string(), "Bob".to_string()],
                x_axis: vec!["Admin".to_string(), "Editor".to_string()],
                cells: vec![vec![0, 1], vec![0, 0]],
            },
        ]
    }

    #[test]
    fn test_export_matrices_writes_timestamped_workbook() {
        let tmp = tempdir().expect("tempdir");
        let dir_out = tmp.path().join("nested").join("out");

        let result = export_matrices(&derive_matrices(), &dir_out, &SpecMatrixExportOptions::default())
            .expect("export");

        let c_file_name = result
            .path_file_out
            .file_name()
            .map(|c| c.to_string_lossy().to_string())
            .expect("file name");
        assert!(c_file_name.starts_with("matrices_"));
        assert!(c_file_name.ends_with(".xlsx"));
        assert!(!c_file_name.contains(':'));
        assert_eq!(result.path_file_out.parent(), Some(dir_out.as_path()));
        assert_eq!(result.reports.len(), 2);

        let mut workbook: Xlsx<_> = open_workbook(&result.path_file_out).expect("open");
        assert_eq!(
            workbook.sheet_names(),
            vec!["Access - HR".to_string(), "Access - Eng".to_string()]
        );
        let range = workbook.worksheet_range("Access - Eng").expect("range");
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(1.0)));
        assert_eq!(range.get_value((2, 2)), Some(&Data::Float(0.0)));
    }

    #[test]
    fn test_export_empty_list_is_error() {
        let tmp = tempdir().expect("tempdir");
        assert_eq!(
            export_matrices(&[], tmp.path(), &SpecMatrixExportOptions::default()),
            Err(MatrixExportError::EmptyMatrixList)
        );
    }

    #[test]
    fn test_export_failure_leaves_matrices_usable() {
        let tmp = tempdir().expect("tempdir");
        let matrices = derive_matrices();
        let path_bad = tmp.path().join("missing_dir").join("out.xlsx");

        let err = export_matrices_to_path(&matrices, &path_bad, &SpecMatrixExportOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, MatrixExportError::Write(_)));

        let result = export_matrices_to_path(
            &matrices,
            &tmp.path().join("out.xlsx"),
            &SpecMatrixExportOptions::default(),
        )
        .expect("retry");
        assert_eq!(result.reports.len(), 2);
    }
}
