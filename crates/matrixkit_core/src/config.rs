//! Configuration document parsing and validated matrix plans.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::conf::C_SELECTION_KEY_SEPARATOR;
use crate::spec::{
    MatrixConfigError, SpecAxisSelection, SpecAxisSelectionKey, SpecMatrixConfig,
    SpecMatrixFilter, SpecMatrixSource, SpecSheetFile, SpecSheetTable,
};

////////////////////////////////////////////////////////////////////////////////
// #region ConfigDocument

/// Host-supplied configuration, as exchanged in JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMatrixConfigDocument {
    /// Selections keyed `"<fileIndex>-<sheetName>"`.
    #[serde(default)]
    pub column_selections: BTreeMap<String, SpecAxisSelectionDocument>,
    /// Matrix definitions in output order.
    #[serde(default)]
    pub matrix_config: Vec<SpecMatrixConfigEntryDocument>,
    /// Optional X-axis allow-list.
    #[serde(default)]
    pub filter_config: Option<SpecFilterConfigDocument>,
}

/// Possibly incomplete selection as picked in the host UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecAxisSelectionDocument {
    #[serde(default)]
    pub y_axis: Option<String>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub secondary_x_axis: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMatrixConfigEntryDocument {
    pub name: String,
    #[serde(default)]
    pub merge: bool,
    #[serde(default)]
    pub sources: Vec<SpecMatrixSourceDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMatrixSourceDocument {
    pub file_index: usize,
    pub sheet_name: String,
    /// Defaults to the ingested file's name when omitted.
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecFilterConfigDocument {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub values: Vec<String>,
}

impl SpecMatrixConfigDocument {
    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self, MatrixConfigError> {
        serde_json::from_str(text).map_err(|err| MatrixConfigError::InvalidDocument(err.to_string()))
    }

    /// Validate against ingested files and freeze into a plan.
    pub fn into_plan(self, files: Vec<SpecSheetFile>) -> Result<SpecMatrixPlan, MatrixConfigError> {
        let mut dict_selections = BTreeMap::new();
        let mut l_warnings_keys = Vec::new();
        for (c_key, selection_doc) in self.column_selections {
            // Sources under a malformed key fail later as incomplete selections.
            let Ok(key) = parse_selection_key(&c_key) else {
                l_warnings_keys.push(format!("Ignored malformed column selection key {c_key:?}."));
                continue;
            };
            if let Some(selection) = derive_complete_selection(selection_doc) {
                dict_selections.insert(key, selection);
            }
        }

        let l_configs = self
            .matrix_config
            .into_iter()
            .map(|entry| SpecMatrixConfig {
                name: entry.name,
                if_merge: entry.merge,
                sources: entry
                    .sources
                    .into_iter()
                    .map(|source_doc| {
                        let c_file_name = source_doc.file_name.unwrap_or_else(|| {
                            files
                                .get(source_doc.file_index)
                                .map(|file| file.file_name.clone())
                                .unwrap_or_default()
                        });
                        SpecMatrixSource::new(
                            source_doc.file_index,
                            source_doc.sheet_name,
                            c_file_name,
                        )
                    })
                    .collect(),
            })
            .collect();

        let filter = self
            .filter_config
            .filter(|filter_doc| filter_doc.enabled && !filter_doc.values.is_empty())
            .map(|filter_doc| SpecMatrixFilter::new(filter_doc.values));

        let mut plan = SpecMatrixPlan::try_new(files, dict_selections, l_configs, filter)?;
        plan.warnings.extend(l_warnings_keys);
        plan.warnings.sort();
        plan.warnings.dedup();
        Ok(plan)
    }
}

/// Parse `"<fileIndex>-<sheetName>"`; the sheet name may itself contain `-`.
pub fn parse_selection_key(key: &str) -> Result<SpecAxisSelectionKey, MatrixConfigError> {
    let Some((c_index, c_sheet_name)) = key.split_once(C_SELECTION_KEY_SEPARATOR) else {
        return Err(MatrixConfigError::InvalidSelectionKey(key.to_string()));
    };
    let n_file_index = c_index
        .parse::<usize>()
        .map_err(|_| MatrixConfigError::InvalidSelectionKey(key.to_string()))?;
    Ok(SpecAxisSelectionKey::new(n_file_index, c_sheet_name))
}

fn derive_complete_selection(selection_doc: SpecAxisSelectionDocument) -> Option<SpecAxisSelection> {
    let c_y = selection_doc.y_axis.filter(|c| !c.is_empty())?;
    let c_x = selection_doc.x_axis.filter(|c| !c.is_empty())?;
    Some(SpecAxisSelection {
        y_axis_column: c_y,
        x_axis_column: c_x,
        secondary_axis_column: selection_doc.secondary_x_axis.filter(|c| !c.is_empty()),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MatrixPlan

/// Immutable, validated input of a matrix computation run.
#[derive(Debug, Clone)]
pub struct SpecMatrixPlan {
    files: Vec<SpecSheetFile>,
    selections: BTreeMap<SpecAxisSelectionKey, SpecAxisSelection>,
    configs: Vec<SpecMatrixConfig>,
    filter: Option<SpecMatrixFilter>,
    warnings: Vec<String>,
}

impl SpecMatrixPlan {
    /// Validate and assemble a plan.
    ///
    /// Fails when a matrix has no sources or when a source that resolves to
    /// an ingested sheet has no complete selection. Sources that do not
    /// resolve are left for the builder to skip. Selected columns missing from
    /// a sheet and identical Y/X columns are accepted with a warning.
    pub fn try_new(
        files: Vec<SpecSheetFile>,
        selections: BTreeMap<SpecAxisSelectionKey, SpecAxisSelection>,
        configs: Vec<SpecMatrixConfig>,
        filter: Option<SpecMatrixFilter>,
    ) -> Result<Self, MatrixConfigError> {
        let mut l_warnings = Vec::new();

        for config in &configs {
            if config.sources.is_empty() {
                return Err(MatrixConfigError::EmptySources {
                    name: config.name.clone(),
                });
            }

            for source in &config.sources {
                let Some(table) = find_table(&files, source) else {
                    continue;
                };
                let Some(selection) = selections.get(&source.key()) else {
                    return Err(MatrixConfigError::IncompleteAxisSelection {
                        file_index: source.file_index,
                        sheet_name: source.sheet_name.clone(),
                    });
                };
                l_warnings.extend(derive_selection_warnings(source, table, selection));
            }
        }

        l_warnings.sort();
        l_warnings.dedup();

        Ok(Self {
            files,
            selections,
            configs,
            filter,
            warnings: l_warnings,
        })
    }

    pub fn files(&self) -> &[SpecSheetFile] {
        &self.files
    }

    pub fn configs(&self) -> &[SpecMatrixConfig] {
        &self.configs
    }

    pub fn filter(&self) -> Option<&SpecMatrixFilter> {
        self.filter.as_ref()
    }

    /// Warnings raised during validation.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Locate the sheet and selection of `source`.
    pub fn resolve_source(
        &self,
        source: &SpecMatrixSource,
    ) -> Option<(&SpecSheetTable, &SpecAxisSelection)> {
        let table = find_table(&self.files, source)?;
        let selection = self.selections.get(&source.key())?;
        Some((table, selection))
    }
}

fn find_table<'a>(
    files: &'a [SpecSheetFile],
    source: &SpecMatrixSource,
) -> Option<&'a SpecSheetTable> {
    files.get(source.file_index)?.find_sheet(&source.sheet_name)
}

fn derive_selection_warnings(
    source: &SpecMatrixSource,
    table: &SpecSheetTable,
    selection: &SpecAxisSelection,
) -> Vec<String> {
    let mut l_warnings = Vec::new();

    let l_columns = [
        Some(&selection.y_axis_column),
        Some(&selection.x_axis_column),
        selection.secondary_axis_column.as_ref(),
    ];
    for c_column in l_columns.into_iter().flatten() {
        if !table.has_column(c_column) {
            l_warnings.push(format!(
                "Column {c_column:?} not found in sheet {:?} of {:?}; treated as empty.",
                source.sheet_name, source.file_name
            ));
        }
    }

    if selection.y_axis_column == selection.x_axis_column {
        l_warnings.push(format!(
            "Sheet {:?} of {:?} uses column {:?} for both axes.",
            source.sheet_name, source.file_name, selection.y_axis_column
        ));
    }

    l_warnings
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
