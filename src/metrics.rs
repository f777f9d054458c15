//! Pipeline metrics.
//!
//! Counters are recorded through the `metrics` facade; without an installed
//! recorder they are no-ops, so library users opt in by installing their own.

use crate::pipeline::CleanReport;

pub const RUNS_TOTAL: &str = "sheet_cleaner_pipeline_runs_total";
pub const FAILURES_TOTAL: &str = "sheet_cleaner_pipeline_failures_total";
pub const ROWS_DROPPED_TOTAL: &str = "sheet_cleaner_rows_dropped_total";
pub const ROWS_OUT: &str = "sheet_cleaner_pipeline_rows_out";

pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Record a completed run and the rows each stage dropped
    pub fn record_run(report: &CleanReport) {
        ::metrics::counter!(RUNS_TOTAL).increment(1);
        for stage in &report.stages {
            ::metrics::counter!(ROWS_DROPPED_TOTAL, "stage" => stage.stage.as_str())
                .increment(stage.rows_dropped as u64);
        }
        ::metrics::histogram!(ROWS_OUT).record(report.rows_out as f64);
    }

    pub fn record_failure() {
        ::metrics::counter!(FAILURES_TOTAL).increment(1);
    }
}
