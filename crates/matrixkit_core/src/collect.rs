//! Distinct axis value collection across one or more sheets.

use std::collections::BTreeSet;

use crate::spec::SpecSheetTable;
use crate::util::derive_axis_text;

/// Iterate the trimmed, non-empty values of `column`, row by row.
///
/// Rows without the column (or with a blank cell) yield `None`, so a column
/// missing from the headers behaves as an all-empty column.
pub fn iter_axis_values<'a>(
    table: &'a SpecSheetTable,
    column: &'a str,
) -> impl Iterator<Item = Option<String>> + 'a {
    table
        .rows
        .iter()
        .map(move |dict_row| derive_axis_text(dict_row.get(column)))
}

/// Collect the sorted distinct values of each `(table, column)` pair.
///
/// Values are trimmed, blanks are dropped, deduplication is exact and
/// case-sensitive, and ordering is by code point.
pub fn collect_axis_values<'a, I>(pairs: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a SpecSheetTable, &'a str)>,
{
    let mut set_values = BTreeSet::new();
    for (table, column) in pairs {
        set_values.extend(iter_axis_values(table, column).flatten());
    }
    set_values.into_iter().collect()
}
