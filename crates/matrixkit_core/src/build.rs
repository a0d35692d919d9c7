//! Intersection matrix construction (independent and merge modes).

use std::collections::HashMap;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::collect::collect_axis_values;
use crate::config::SpecMatrixPlan;
use crate::report::{ReportMatrix, ReportMatrixBuilder};
use crate::spec::{
    SpecAxisSelection, SpecBuildOptions, SpecMatrix, SpecMatrixConfig, SpecMatrixFilter,
    SpecMatrixSource, SpecSheetTable,
};
use crate::util::{calculate_worker_limit, derive_axis_text, join_matrix_name, strip_file_extension};

/// Lookup seam between matrix definitions and ingested data.
pub trait SheetResolver {
    /// Sheet and complete selection of `source`, or `None` when stale.
    fn resolve(&self, source: &SpecMatrixSource) -> Option<(&SpecSheetTable, &SpecAxisSelection)>;
}

impl SheetResolver for SpecMatrixPlan {
    fn resolve(&self, source: &SpecMatrixSource) -> Option<(&SpecSheetTable, &SpecAxisSelection)> {
        self.resolve_source(source)
    }
}

type TypeResolvedSource<'a> = (&'a SpecSheetTable, &'a SpecAxisSelection);

/// Compute every matrix of a validated plan, in definition order.
pub fn compute_matrices(plan: &SpecMatrixPlan, options: &SpecBuildOptions) -> ReportMatrix {
    let mut builder_report = ReportMatrixBuilder::default();
    for c_warning in plan.warnings() {
        builder_report.add_warning(c_warning.clone());
    }

    for config in plan.configs() {
        let l_matrices = build_matrices(config, plan, plan.filter(), options, &mut builder_report);
        builder_report.extend_matrices(l_matrices);
    }

    let report = builder_report.build();
    log::debug!("{report}");
    report
}

/// Turn one matrix definition into one or more matrices.
///
/// Sources that do not resolve are skipped and recorded in `builder_report`.
pub fn build_matrices<R>(
    config: &SpecMatrixConfig,
    resolver: &R,
    filter: Option<&SpecMatrixFilter>,
    options: &SpecBuildOptions,
    builder_report: &mut ReportMatrixBuilder,
) -> Vec<SpecMatrix>
where
    R: SheetResolver,
{
    builder_report.add_spec();

    let l_resolved: Vec<Option<TypeResolvedSource<'_>>> = config
        .sources
        .iter()
        .map(|source| resolver.resolve(source))
        .collect();
    for (source, resolved) in config.sources.iter().zip(&l_resolved) {
        if resolved.is_some() {
            builder_report.add_resolved();
        } else {
            builder_report.add_skipped(format!(
                "Matrix {:?}: source sheet {:?} of file #{} ({:?}) not found; skipped.",
                config.name, source.sheet_name, source.file_index, source.file_name
            ));
        }
    }

    let l_matrices = if config.if_merge {
        let l_inputs: Vec<TypeResolvedSource<'_>> = l_resolved.into_iter().flatten().collect();
        build_merged_matrices(&config.name, &l_inputs, filter)
    } else {
        let l_tasks: Vec<(&SpecMatrixSource, TypeResolvedSource<'_>)> = config
            .sources
            .iter()
            .zip(l_resolved)
            .filter_map(|(source, resolved)| resolved.map(|input| (source, input)))
            .collect();
        build_independent_matrices(l_tasks, filter, options, builder_report)
    };

    log::debug!(
        "Matrix {:?} ({}): {} matrices",
        config.name,
        if config.if_merge { "merge" } else { "independent" },
        l_matrices.len()
    );
    l_matrices
}

fn build_independent_matrices(
    l_tasks: Vec<(&SpecMatrixSource, TypeResolvedSource<'_>)>,
    filter: Option<&SpecMatrixFilter>,
    options: &SpecBuildOptions,
    builder_report: &mut ReportMatrixBuilder,
) -> Vec<SpecMatrix> {
    let build_one = |(source, input)| build_source_matrices(source, input, filter);

    let n_workers_max = calculate_worker_limit(options.num_workers_max);
    if n_workers_max <= 1 || l_tasks.len() <= 1 {
        return l_tasks.into_iter().flat_map(build_one).collect();
    }

    let Ok(thread_pool) = ThreadPoolBuilder::new().num_threads(n_workers_max).build() else {
        builder_report.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial build."
        ));
        return l_tasks.into_iter().flat_map(build_one).collect();
    };

    let l_groups: Vec<Vec<SpecMatrix>> =
        thread_pool.install(|| l_tasks.into_par_iter().map(build_one).collect());
    l_groups.into_iter().flatten().collect()
}

fn build_source_matrices(
    source: &SpecMatrixSource,
    input: TypeResolvedSource<'_>,
    filter: Option<&SpecMatrixFilter>,
) -> Vec<SpecMatrix> {
    let (table, selection) = input;
    let l_inputs = [input];

    let l_y_axis = collect_axis_values([(table, selection.y_axis_column.as_str())]);
    let l_x_axis = apply_filter(
        collect_axis_values([(table, selection.x_axis_column.as_str())]),
        filter,
    );
    let l_secondary = match &selection.secondary_axis_column {
        Some(c_column) => collect_axis_values([(table, c_column.as_str())]),
        None => vec![],
    };

    let c_name_base = join_matrix_name(&[
        strip_file_extension(&source.file_name),
        source.sheet_name.as_str(),
    ]);

    if l_secondary.is_empty() {
        return vec![fill_matrix(c_name_base, l_y_axis, l_x_axis, &l_inputs, None)];
    }

    l_secondary
        .iter()
        .map(|c_secondary| {
            fill_matrix(
                join_matrix_name(&[c_name_base.as_str(), c_secondary.as_str()]),
                l_y_axis.clone(),
                l_x_axis.clone(),
                &l_inputs,
                Some(c_secondary),
            )
        })
        .collect()
}

fn build_merged_matrices(
    name: &str,
    l_inputs: &[TypeResolvedSource<'_>],
    filter: Option<&SpecMatrixFilter>,
) -> Vec<SpecMatrix> {
    let l_y_axis = collect_axis_values(
        l_inputs
            .iter()
            .map(|(table, selection)| (*table, selection.y_axis_column.as_str())),
    );
    let l_x_axis = apply_filter(
        collect_axis_values(
            l_inputs
                .iter()
                .map(|(table, selection)| (*table, selection.x_axis_column.as_str())),
        ),
        filter,
    );

    let if_has_secondary = l_inputs
        .iter()
        .any(|(_, selection)| selection.secondary_axis_column.is_some());
    let l_secondary = if if_has_secondary {
        collect_axis_values(l_inputs.iter().filter_map(|(table, selection)| {
            selection
                .secondary_axis_column
                .as_deref()
                .map(|c_column| (*table, c_column))
        }))
    } else {
        vec![]
    };

    if l_secondary.is_empty() {
        return vec![fill_matrix(name.to_string(), l_y_axis, l_x_axis, l_inputs, None)];
    }

    l_secondary
        .iter()
        .map(|c_secondary| {
            fill_matrix(
                join_matrix_name(&[name, c_secondary.as_str()]),
                l_y_axis.clone(),
                l_x_axis.clone(),
                l_inputs,
                Some(c_secondary),
            )
        })
        .collect()
}

fn apply_filter(mut l_values: Vec<String>, filter: Option<&SpecMatrixFilter>) -> Vec<String> {
    if let Some(filter) = filter {
        l_values.retain(|c_value| filter.allows(c_value));
    }
    l_values
}

/// Set `cells[i][j]` for every row whose Y and X land on the axes.
///
/// With `secondary_key`, only rows whose trimmed secondary value equals the
/// key count, and inputs without a secondary column contribute nothing.
fn fill_matrix(
    name: String,
    y_axis: Vec<String>,
    x_axis: Vec<String>,
    l_inputs: &[TypeResolvedSource<'_>],
    secondary_key: Option<&str>,
) -> SpecMatrix {
    let mut cells = vec![vec![0u8; x_axis.len()]; y_axis.len()];

    {
        let dict_idx_y: HashMap<&str, usize> = y_axis
            .iter()
            .enumerate()
            .map(|(n_idx, c_value)| (c_value.as_str(), n_idx))
            .collect();
        let dict_idx_x: HashMap<&str, usize> = x_axis
            .iter()
            .enumerate()
            .map(|(n_idx, c_value)| (c_value.as_str(), n_idx))
            .collect();

        for (table, selection) in l_inputs {
            let c_column_secondary = match secondary_key {
                Some(_) => match selection.secondary_axis_column.as_deref() {
                    Some(c_column) => Some(c_column),
                    None => continue,
                },
                None => None,
            };

            for dict_row in &table.rows {
                let Some(c_y) = derive_axis_text(dict_row.get(selection.y_axis_column.as_str()))
                else {
                    continue;
                };
                let Some(c_x) = derive_axis_text(dict_row.get(selection.x_axis_column.as_str()))
                else {
                    continue;
                };
                if let (Some(c_key), Some(c_column)) = (secondary_key, c_column_secondary)
                    && derive_axis_text(dict_row.get(c_column)).as_deref() != Some(c_key)
                {
                    continue;
                }

                if let (Some(n_idx_y), Some(n_idx_x)) =
                    (dict_idx_y.get(c_y.as_str()), dict_idx_x.get(c_x.as_str()))
                {
                    cells[*n_idx_y][*n_idx_x] = 1;
                }
            }
        }
    }

    SpecMatrix {
        name,
        y_axis,
        x_axis,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::spec::{
        EnumCellValue, EnumSheetFileType, SpecAxisSelectionKey, SpecSheetFile,
    };

    fn derive_table(name: &str, headers: &[&str], rows: &[&[&str]]) -> SpecSheetTable {
        let mut table = SpecSheetTable::new(name, headers.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|c| EnumCellValue::from(*c)).collect());
        }
        table
    }

    fn derive_staff_table() -> SpecSheetTable {
        derive_table(
            "Staff",
            &["Emp", "Role", "Dept"],
            &[
                &["Alice", "Admin", "HR"],
                &["Bob", "Admin", "HR"],
                &["Alice", "Editor", "Eng"],
            ],
        )
    }

    struct PlanInput {
        files: Vec<SpecSheetFile>,
        selections: BTreeMap<SpecAxisSelectionKey, SpecAxisSelection>,
    }

    impl PlanInput {
        fn new() -> Self {
            Self {
                files: vec![],
                selections: BTreeMap::new(),
            }
        }

        fn add_file(&mut self, file_name: &str, table: SpecSheetTable, selection: SpecAxisSelection) {
            let n_idx = self.files.len();
            self.selections.insert(
                SpecAxisSelectionKey::new(n_idx, table.sheet_name.clone()),
                selection,
            );
            self.files.push(SpecSheetFile {
                file_name: file_name.to_string(),
                file_type: EnumSheetFileType::Excel,
                sheets: vec![table],
            });
        }

        fn source(&self, n_idx: usize) -> SpecMatrixSource {
            SpecMatrixSource::new(
                n_idx,
                self.files[n_idx].sheets[0].sheet_name.clone(),
                self.files[n_idx].file_name.clone(),
            )
        }

        fn plan(self, configs: Vec<SpecMatrixConfig>, filter: Option<SpecMatrixFilter>) -> SpecMatrixPlan {
            SpecMatrixPlan::try_new(self.files, self.selections, configs, filter).expect("valid plan")
        }
    }

    fn derive_config(name: &str, sources: Vec<SpecMatrixSource>, if_merge: bool) -> SpecMatrixConfig {
        SpecMatrixConfig {
            name: name.to_string(),
            sources,
            if_merge,
        }
    }

    #[test]
    fn test_single_sheet_intersection() {
        let mut input = PlanInput::new();
        input.add_file("staff.xlsx", derive_staff_table(), SpecAxisSelection::new("Emp", "Role"));
        let configs = vec![derive_config("Access", vec![input.source(0)], false)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        assert_eq!(report.matrix_count(), 1);
        let matrix = &report.matrices[0];
        assert_eq!(matrix.name, "staff - Staff");
        assert_eq!(matrix.y_axis, vec!["Alice", "Bob"]);
        assert_eq!(matrix.x_axis, vec!["Admin", "Editor"]);
        assert_eq!(matrix.cells, vec![vec![1, 1], vec![1, 0]]);
    }

    #[test]
    fn test_secondary_axis_splits_per_value() {
        let mut input = PlanInput::new();
        input.add_file(
            "staff.xlsx",
            derive_staff_table(),
            SpecAxisSelection::new("Emp", "Role").with_secondary("Dept"),
        );
        let configs = vec![derive_config("Access", vec![input.source(0)], false)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        let l_names: Vec<&str> = report.matrices.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(l_names, vec!["staff - Staff - Eng", "staff - Staff - HR"]);
        assert_eq!(report.matrices[0].cells, vec![vec![0, 1], vec![0, 0]]);
        assert_eq!(report.matrices[1].cells, vec![vec![1, 0], vec![1, 0]]);
        assert_eq!(report.matrices[0].y_axis, report.matrices[1].y_axis);
    }

    #[test]
    fn test_blank_secondary_column_falls_back_to_single_matrix() {
        let table = derive_table("S", &["Emp", "Role", "Dept"], &[&["Alice", "Admin", "  "]]);
        let mut input = PlanInput::new();
        input.add_file("t.csv", table, SpecAxisSelection::new("Emp", "Role").with_secondary("Dept"));
        let configs = vec![derive_config("M", vec![input.source(0)], false)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        assert_eq!(report.matrix_count(), 1);
        assert_eq!(report.matrices[0].name, "t - S");
        assert_eq!(report.matrices[0].cells, vec![vec![1]]);
    }

    #[test]
    fn test_merge_disjoint_sheets_unions_axes() {
        let mut input = PlanInput::new();
        input.add_file(
            "a.xlsx",
            derive_table("A", &["Emp", "Role"], &[&["Alice", "Admin"]]),
            SpecAxisSelection::new("Emp", "Role"),
        );
        input.add_file(
            "b.xlsx",
            derive_table("B", &["Emp", "Role"], &[&["Bob", "Viewer"]]),
            SpecAxisSelection::new("Emp", "Role"),
        );
        let configs = vec![derive_config("All", vec![input.source(0), input.source(1)], true)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        assert_eq!(report.matrix_count(), 1);
        let matrix = &report.matrices[0];
        assert_eq!(matrix.name, "All");
        assert_eq!(matrix.y_axis, vec!["Alice", "Bob"]);
        assert_eq!(matrix.x_axis, vec!["Admin", "Viewer"]);
        assert_eq!(matrix.cells, vec![vec![1, 0], vec![0, 1]]);
    }

    #[test]
    fn test_merge_with_partial_secondary_ignores_sources_without_it() {
        let mut input = PlanInput::new();
        input.add_file(
            "a.xlsx",
            derive_staff_table(),
            SpecAxisSelection::new("Emp", "Role").with_secondary("Dept"),
        );
        input.add_file(
            "b.xlsx",
            derive_table("B", &["Emp", "Role"], &[&["Carol", "Admin"]]),
            SpecAxisSelection::new("Emp", "Role"),
        );
        let configs = vec![derive_config("All", vec![input.source(0), input.source(1)], true)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        let l_names: Vec<&str> = report.matrices.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(l_names, vec!["All - Eng", "All - HR"]);
        for matrix in &report.matrices {
            assert_eq!(matrix.y_axis, vec!["Alice", "Bob", "Carol"]);
            assert_eq!(matrix.cells[2], vec![0, 0]);
        }
        assert_eq!(report.matrices[1].cells, vec![vec![1, 0], vec![1, 0], vec![0, 0]]);
    }

    #[test]
    fn test_whitespace_is_trimmed_for_matching() {
        let table = derive_table(
            "S",
            &["Emp", "Role"],
            &[&["  Alice  ", "Admin"], &["Alice", " Editor"]],
        );
        let mut input = PlanInput::new();
        input.add_file("t.csv", table, SpecAxisSelection::new("Emp", "Role"));
        let configs = vec![derive_config("M", vec![input.source(0)], false)];
        let plan = input.plan(configs, None);

        let matrix = compute_matrices(&plan, &SpecBuildOptions::default()).matrices.remove(0);

        assert_eq!(matrix.y_axis, vec!["Alice"]);
        assert_eq!(matrix.cells, vec![vec![1, 1]]);
    }

    #[test]
    fn test_stale_source_is_skipped_and_reported() {
        let mut input = PlanInput::new();
        input.add_file("staff.xlsx", derive_staff_table(), SpecAxisSelection::new("Emp", "Role"));
        let l_sources = vec![
            input.source(0),
            SpecMatrixSource::new(4, "Missing", "gone.xlsx"),
            SpecMatrixSource::new(0, "NoSuchSheet", "staff.xlsx"),
        ];
        let configs = vec![derive_config("M", l_sources, false)];
        let plan = input.plan(configs, None);

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        assert_eq!(report.matrix_count(), 1);
        assert_eq!(report.cnt_sources_resolved, 1);
        assert_eq!(report.cnt_sources_skipped, 2);
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_filter_restricts_x_axis() {
        let mut input = PlanInput::new();
        input.add_file("staff.xlsx", derive_staff_table(), SpecAxisSelection::new("Emp", "Role"));
        let configs = vec![
            derive_config("Ind", vec![input.source(0)], false),
            derive_config("Mrg", vec![input.source(0)], true),
        ];
        let plan = input.plan(configs, Some(SpecMatrixFilter::new(["Editor", "Unused"])));

        let report = compute_matrices(&plan, &SpecBuildOptions::default());

        for matrix in &report.matrices {
            assert_eq!(matrix.y_axis, vec!["Alice", "Bob"]);
            assert_eq!(matrix.x_axis, vec!["Editor"]);
            assert_eq!(matrix.cells, vec![vec![1], vec![0]]);
        }
    }

    #[test]
    fn test_parallel_build_preserves_source_order() {
        let mut input = PlanInput::new();
        for n_idx in 0..6 {
            let c_x = format!("x{n_idx}");
            input.add_file(
                &format!("f{n_idx}.csv"),
                derive_table("S", &["Y", "X"], &[&["y", c_x.as_str()]]),
                SpecAxisSelection::new("Y", "X"),
            );
        }
        let l_sources = (0..6).map(|n_idx| input.source(n_idx)).collect();
        let configs = vec![derive_config("M", l_sources, false)];
        let plan = input.plan(configs, None);

        let report_serial = compute_matrices(&plan, &SpecBuildOptions::default());
        let report_parallel = compute_matrices(
            &plan,
            &SpecBuildOptions {
                num_workers_max: None,
            },
        );

        assert_eq!(report_serial.matrix_count(), 6);
        assert_eq!(report_serial.matrices, report_parallel.matrices);
        assert_eq!(report_serial.matrices[5].name, "f5 - S");
    }

    proptest! {
        #[test]
        fn prop_matrices_are_well_formed_and_deterministic(
            l_rows in proptest::collection::vec(
                ("[ a-d]{0,2}", "[ p-s]{0,2}", "[ 0-2]{0,1}"),
                0..30
            ),
            if_merge in any::<bool>(),
            if_secondary in any::<bool>(),
        ) {
            let mut table = SpecSheetTable::new("S", vec!["Y".into(), "X".into(), "Z".into()]);
            for (c_y, c_x, c_z) in &l_rows {
                table.push_row(vec![
                    EnumCellValue::from(c_y.as_str()),
                    EnumCellValue::from(c_x.as_str()),
                    EnumCellValue::from(c_z.as_str()),
                ]);
            }
            let mut selection = SpecAxisSelection::new("Y", "X");
            if if_secondary {
                selection = selection.with_secondary("Z");
            }
            let mut input = PlanInput::new();
            input.add_file("p.csv", table, selection);
            let configs = vec![derive_config("P", vec![input.source(0), input.source(0)], if_merge)];
            let plan = input.plan(configs, None);

            let report_a = compute_matrices(&plan, &SpecBuildOptions::default());
            let report_b = compute_matrices(&plan, &SpecBuildOptions::default());

            prop_assert_eq!(&report_a.matrices, &report_b.matrices);
            prop_assert!(report_a.matrix_count() >= 1);
            for matrix in &report_a.matrices {
                prop_assert!(matrix.is_well_formed());
            }
            if !if_secondary && !if_merge {
                prop_assert_eq!(report_a.matrix_count(), 2);
            }
        }
    }
}
