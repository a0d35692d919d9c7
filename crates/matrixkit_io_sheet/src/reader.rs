//! Sheet ingestion kernel: CSV through polars, workbooks through calamine.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use matrixkit_core::{EnumCellValue, EnumSheetFileType, SpecSheetFile, SpecSheetTable};
use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, SerReader};

use crate::spec::{SheetReadError, SpecSheetReadOptions};
use crate::util::{derive_file_type, derive_sheet_table_from_grid, normalize_headers};

/// Read every file in order; the output position is the file index.
pub fn read_sheet_files<I, P>(
    paths: I,
    options: &SpecSheetReadOptions,
) -> Result<Vec<SpecSheetFile>, SheetReadError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|path| read_sheet_file(path.as_ref(), options))
        .collect()
}

/// Read one file from disk.
pub fn read_sheet_file(
    path: &Path,
    options: &SpecSheetReadOptions,
) -> Result<SpecSheetFile, SheetReadError> {
    let c_file_name = path
        .file_name()
        .map(|c| c.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    derive_file_type(&c_file_name)?;
    let l_bytes = std::fs::read(path).map_err(|err| SheetReadError::Io {
        file_name: c_file_name.clone(),
        message: err.to_string(),
    })?;

    read_sheet_file_from_bytes(&c_file_name, &l_bytes, options)
}

/// Parse an in-memory file; `file_name` decides the format.
pub fn read_sheet_file_from_bytes(
    file_name: &str,
    bytes: &[u8],
    options: &SpecSheetReadOptions,
) -> Result<SpecSheetFile, SheetReadError> {
    let file_type = derive_file_type(file_name)?;
    let sheets = match file_type {
        EnumSheetFileType::Csv => vec![read_csv_sheet(file_name, bytes, options)?],
        EnumSheetFileType::Excel => read_workbook_sheets(file_name, bytes, options)?,
    };

    log::debug!("Read {file_name:?}: {} sheet(s)", sheets.len());
    Ok(SpecSheetFile {
        file_name: file_name.to_string(),
        file_type,
        sheets,
    })
}

/// Convert an in-memory dataframe; column names become headers.
pub fn derive_sheet_table_from_dataframe(
    sheet_name: &str,
    df: &DataFrame,
) -> Result<SpecSheetTable, SheetReadError> {
    let headers = normalize_headers(
        df.get_column_names_str()
            .into_iter()
            .map(|c| Some(c.to_string()))
            .collect(),
    );
    let mut table = SpecSheetTable::new(sheet_name, headers);

    for row in derive_cell_grid_from_dataframe(sheet_name, df)? {
        table.push_row(row);
    }
    Ok(table)
}

fn read_csv_sheet(
    file_name: &str,
    bytes: &[u8],
    options: &SpecSheetReadOptions,
) -> Result<SpecSheetTable, SheetReadError> {
    let n_separator = options.csv_separator;
    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_infer_schema_length(Some(0))
        .with_raise_if_empty(false)
        .map_parse_options(|opts| {
            opts.with_separator(n_separator)
                .with_truncate_ragged_lines(true)
        })
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|err| SheetReadError::Parse {
            file_name: file_name.to_string(),
            message: err.to_string(),
        })?;

    // Empty fields are missing values, whatever the parser made of them.
    let grid = derive_cell_grid_from_dataframe(file_name, &df)?
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| match value {
                    EnumCellValue::String(c) if c.is_empty() => EnumCellValue::None,
                    _ => value,
                })
                .collect::<Vec<_>>()
        });
    Ok(derive_sheet_table_from_grid(
        derive_file_stem(file_name),
        grid,
    ))
}

fn read_workbook_sheets(
    file_name: &str,
    bytes: &[u8],
    options: &SpecSheetReadOptions,
) -> Result<Vec<SpecSheetTable>, SheetReadError> {
    let derive_parse_error = |message: String| SheetReadError::Parse {
        file_name: file_name.to_string(),
        message,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|err| derive_parse_error(err.to_string()))?;

    let mut l_sheets = Vec::new();
    for c_sheet_name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&c_sheet_name)
            .map_err(|err| derive_parse_error(format!("sheet {c_sheet_name:?}: {err}")))?;

        let grid = range
            .rows()
            .map(|row| row.iter().map(derive_cell_value_from_data).collect::<Vec<_>>());
        let table = derive_sheet_table_from_grid(&c_sheet_name, grid);

        if options.if_skip_empty_sheets && table.headers.is_empty() {
            log::debug!("Skip empty sheet {c_sheet_name:?} of {file_name:?}");
            continue;
        }
        l_sheets.push(table);
    }

    Ok(l_sheets)
}

fn derive_file_stem(file_name: &str) -> &str {
    matrixkit_core::strip_file_extension(file_name)
}

fn derive_cell_grid_from_dataframe(
    file_name: &str,
    df: &DataFrame,
) -> Result<Vec<Vec<EnumCellValue>>, SheetReadError> {
    let n_height = df.height();
    let l_cols = df.get_columns();

    let mut l_grid = Vec::with_capacity(n_height);
    for n_idx_row in 0..n_height {
        let mut l_row = Vec::with_capacity(l_cols.len());
        for col in l_cols {
            let value = col.get(n_idx_row).map_err(|err| SheetReadError::Parse {
                file_name: file_name.to_string(),
                message: format!("Failed to read cell value: {err}"),
            })?;
            l_row.push(derive_cell_value_from_any_value(value));
        }
        l_grid.push(l_row);
    }

    Ok(l_grid)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => EnumCellValue::Number(val.as_f64()),
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        Data::Error(err) => EnumCellValue::String(err.to_string()),
    }
}
