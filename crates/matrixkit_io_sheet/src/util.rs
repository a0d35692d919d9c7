//! Pure helpers for header normalisation and file-type dispatch.

use std::collections::{BTreeMap, BTreeSet};

use matrixkit_core::{EnumCellValue, EnumSheetFileType, SpecSheetTable, convert_number_to_text};

use crate::conf::{
    C_HEADER_DUPLICATE_SEPARATOR, C_HEADER_UNNAMED_PREFIX, TUP_EXTENSIONS_CSV,
    TUP_EXTENSIONS_WORKBOOK,
};
use crate::spec::SheetReadError;

////////////////////////////////////////////////////////////////////////////////
// #region FileName

/// Resolve the file kind from the (case-insensitive) extension.
pub fn derive_file_type(file_name: &str) -> Result<EnumSheetFileType, SheetReadError> {
    let c_ext = file_name
        .rsplit_once('.')
        .map(|(_, c_ext)| c_ext.to_ascii_lowercase())
        .unwrap_or_default();

    if TUP_EXTENSIONS_CSV.contains(&c_ext.as_str()) {
        Ok(EnumSheetFileType::Csv)
    } else if TUP_EXTENSIONS_WORKBOOK.contains(&c_ext.as_str()) {
        Ok(EnumSheetFileType::Excel)
    } else {
        Err(SheetReadError::UnsupportedFileType {
            file_name: file_name.to_string(),
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Headers

/// Make header cells usable as record keys.
///
/// Blank cells become `Unnamed: <position>`; repeats get `.1`, `.2`, ...
/// appended, skipping suffixes already taken by another header.
pub fn normalize_headers(headers: Vec<Option<String>>) -> Vec<String> {
    let l_raw: Vec<String> = headers
        .into_iter()
        .enumerate()
        .map(|(n_idx, c_header)| match c_header {
            Some(c) if !c.trim().is_empty() => c,
            _ => format!("{C_HEADER_UNNAMED_PREFIX}{n_idx}"),
        })
        .collect();

    let set_raw: BTreeSet<&str> = l_raw.iter().map(String::as_str).collect();
    let mut set_taken: BTreeSet<String> = BTreeSet::new();
    let mut dict_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut l_headers = Vec::with_capacity(l_raw.len());

    for c_header in &l_raw {
        if set_taken.insert(c_header.clone()) {
            l_headers.push(c_header.clone());
            continue;
        }
        let n_count = dict_counts.entry(c_header.as_str()).or_insert(0);
        loop {
            *n_count += 1;
            let c_candidate = format!("{c_header}{C_HEADER_DUPLICATE_SEPARATOR}{n_count}");
            if !set_raw.contains(c_candidate.as_str()) && set_taken.insert(c_candidate.clone()) {
                l_headers.push(c_candidate);
                break;
            }
        }
    }

    l_headers
}

/// Header text of a raw cell; `None` when blank.
pub fn derive_header_text(value: &EnumCellValue) -> Option<String> {
    match value {
        EnumCellValue::None => None,
        EnumCellValue::String(c) if c.trim().is_empty() => None,
        EnumCellValue::String(c) => Some(c.clone()),
        EnumCellValue::Number(n) => Some(convert_number_to_text(*n)).filter(|c| !c.is_empty()),
    }
}

/// Whether every cell of a row is blank.
pub fn is_blank_row(row: &[EnumCellValue]) -> bool {
    row.iter().all(|value| match value {
        EnumCellValue::None => true,
        EnumCellValue::String(c) => c.trim().is_empty(),
        EnumCellValue::Number(_) => false,
    })
}

/// Build a table from a positional grid.
///
/// Blank rows are dropped; the first remaining row is the header row.
pub fn derive_sheet_table_from_grid(
    sheet_name: &str,
    grid: impl IntoIterator<Item = Vec<EnumCellValue>>,
) -> SpecSheetTable {
    let mut iter_rows = grid.into_iter().filter(|row| !is_blank_row(row));

    let Some(l_header_row) = iter_rows.next() else {
        return SpecSheetTable::new(sheet_name, vec![]);
    };
    let headers = normalize_headers(l_header_row.iter().map(derive_header_text).collect());

    let mut table = SpecSheetTable::new(sheet_name, headers);
    for row in iter_rows {
        table.push_row(row);
    }
    table
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
