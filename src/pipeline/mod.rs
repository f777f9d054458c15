//! The cleaning pipeline: a fixed sequence of table transformations.
//!
//! Stages run in this order and never re-order:
//! columns -> blanks -> email -> phone -> dedupe -> impute.
//! The table is moved in and only handed back once every stage succeeded, so a
//! failing run never exposes a half-cleaned table.

pub mod stages;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::{CleanerError, Result};
use crate::metrics::PipelineMetrics;
use crate::types::Table;

/// What to do when two raw headers normalize to the same canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Drop the earlier column; the later one keeps its position.
    #[default]
    LastWins,
    Error,
}

/// What to do when a column has missing values but nothing to impute them from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyColumnPolicy {
    /// Leave the cells missing and list the column in the report.
    #[default]
    Keep,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    #[serde(default)]
    pub empty_column_policy: EmptyColumnPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Columns,
    Blanks,
    Email,
    Phone,
    Dedupe,
    Impute,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Columns => "columns",
            StageName::Blanks => "blanks",
            StageName::Email => "email",
            StageName::Phone => "phone",
            StageName::Dedupe => "dedupe",
            StageName::Impute => "impute",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect of one stage on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: StageName,
    pub rows_dropped: usize,
    /// Headers renamed (columns stage) or cells rewritten (all other stages).
    pub cells_changed: usize,
}

impl StageReport {
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            rows_dropped: 0,
            cells_changed: 0,
        }
    }
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows_in: usize,
    pub rows_out: usize,
    pub stages: Vec<StageReport>,
    /// Columns that still hold missing values because nothing could be imputed.
    pub unfilled_columns: Vec<String>,
}

impl CleanReport {
    pub fn rows_dropped(&self) -> usize {
        self.stages.iter().map(|s| s.rows_dropped).sum()
    }

    pub fn stage(&self, name: StageName) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: Table,
    pub report: CleanReport,
}

#[derive(Debug, Clone, Default)]
pub struct CleaningPipeline {
    options: PipelineOptions,
}

impl CleaningPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs every stage over `table`. Either the fully cleaned table comes back or an error does.
    #[instrument(skip(self, table), fields(rows_in = table.len(), columns = table.columns().len()))]
    pub fn run(&self, table: Table) -> Result<CleanOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let rows_in = table.len();
        info!(%run_id, "Starting cleaning pipeline");

        match self.run_stages(table) {
            Ok((table, stages, unfilled_columns)) => {
                let report = CleanReport {
                    run_id,
                    started_at,
                    finished_at: Utc::now(),
                    rows_in,
                    rows_out: table.len(),
                    stages,
                    unfilled_columns,
                };
                PipelineMetrics::record_run(&report);
                info!(
                    %run_id,
                    rows_in = report.rows_in,
                    rows_out = report.rows_out,
                    "Cleaning pipeline finished"
                );
                Ok(CleanOutcome { table, report })
            }
            Err(e) => {
                PipelineMetrics::record_failure();
                error!(%run_id, "Cleaning pipeline failed: {}", e);
                Err(match e {
                    CleanerError::Pipeline(msg) => CleanerError::Pipeline(msg),
                    other => CleanerError::Pipeline(other.to_string()),
                })
            }
        }
    }

    fn run_stages(&self, mut table: Table) -> Result<(Table, Vec<StageReport>, Vec<String>)> {
        table.check_shape()?;

        let mut reports = Vec::with_capacity(6);
        reports.push(stages::columns::apply(&mut table, self.options.collision_policy)?);
        reports.push(stages::blanks::apply(&mut table));
        reports.push(stages::email::apply(&mut table));
        reports.push(stages::phone::apply(&mut table));
        reports.push(stages::dedupe::apply(&mut table));
        let imputed = stages::impute::apply(&mut table, self.options.empty_column_policy)?;
        reports.push(imputed.report);

        for report in &reports {
            info!(
                stage = %report.stage,
                rows_dropped = report.rows_dropped,
                cells_changed = report.cells_changed,
                "Stage complete"
            );
        }

        Ok((table, reports, imputed.unfilled_columns))
    }
}

/// Runs the pipeline with default options and returns only the cleaned table.
pub fn clean(table: Table) -> Result<Table> {
    CleaningPipeline::new().run(table).map(|outcome| outcome.table)
}
