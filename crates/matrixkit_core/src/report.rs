//! Matrix computation report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SpecMatrix;

/// Matrices and diagnostics of one `compute_matrices` run.
#[derive(Debug, Default, Clone)]
pub struct ReportMatrix {
    /// Output matrices in emission order.
    pub matrices: Vec<SpecMatrix>,
    /// Number of matrix definitions processed.
    pub cnt_specs: u64,
    /// Number of sources resolved to a sheet and selection.
    pub cnt_sources_resolved: u64,
    /// Number of sources skipped as unresolvable.
    pub cnt_sources_skipped: u64,
    /// Non-fatal warnings (tolerated configuration drift).
    pub warnings: Vec<String>,
}

impl ReportMatrix {
    /// Number of produced matrices.
    pub fn matrix_count(&self) -> usize {
        self.matrices.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_specs".to_string(), self.cnt_specs);
        dict_counts.insert("cnt_sources_resolved".to_string(), self.cnt_sources_resolved);
        dict_counts.insert("cnt_sources_skipped".to_string(), self.cnt_sources_skipped);
        dict_counts.insert("cnt_matrices".to_string(), self.matrix_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} specs={} resolved={} skipped={} matrices={} warnings={}",
            dict_counts["cnt_specs"],
            dict_counts["cnt_sources_resolved"],
            dict_counts["cnt_sources_skipped"],
            dict_counts["cnt_matrices"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[MATRIX]"))
    }
}

/// Mutable accumulator used while matrices are built.
#[derive(Debug, Default, Clone)]
pub struct ReportMatrixBuilder {
    /// See [`ReportMatrix::matrices`].
    pub matrices: Vec<SpecMatrix>,
    /// See [`ReportMatrix::cnt_specs`].
    pub cnt_specs: u64,
    /// See [`ReportMatrix::cnt_sources_resolved`].
    pub cnt_sources_resolved: u64,
    /// See [`ReportMatrix::cnt_sources_skipped`].
    pub cnt_sources_skipped: u64,
    /// See [`ReportMatrix::warnings`].
    pub warnings: Vec<String>,
}

impl ReportMatrixBuilder {
    /// Increment spec count by one.
    pub fn add_spec(&mut self) {
        self.cnt_specs += 1;
    }

    /// Increment resolved-source count by one.
    pub fn add_resolved(&mut self) {
        self.cnt_sources_resolved += 1;
    }

    /// Record one skipped source with its reason.
    pub fn add_skipped(&mut self, warning: String) {
        self.cnt_sources_skipped += 1;
        self.add_warning(warning);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Append produced matrices.
    pub fn extend_matrices(&mut self, matrices: Vec<SpecMatrix>) {
        self.matrices.extend(matrices);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportMatrix {
        ReportMatrix {
            matrices: self.matrices,
            cnt_specs: self.cnt_specs,
            cnt_sources_resolved: self.cnt_sources_resolved,
            cnt_sources_skipped: self.cnt_sources_skipped,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_matrix_to_dict_and_format() {
        let mut builder = ReportMatrixBuilder::default();
        builder.add_spec();
        builder.add_resolved();
        builder.add_resolved();
        builder.add_skipped("gone".to_string());
        builder.extend_matrices(vec![SpecMatrix {
            name: "m".to_string(),
            y_axis: vec![],
            x_axis: vec![],
            cells: vec![],
        }]);
        let report = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_specs"], 1);
        assert_eq!(dict_counts["cnt_sources_resolved"], 2);
        assert_eq!(dict_counts["cnt_sources_skipped"], 1);
        assert_eq!(dict_counts["cnt_matrices"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[MATRIX]");
        assert_eq!(
            txt,
            "[MATRIX] specs=1 resolved=2 skipped=1 matrices=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
