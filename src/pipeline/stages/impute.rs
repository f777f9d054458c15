use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{CleanerError, Result};
use crate::pipeline::{EmptyColumnPolicy, StageName, StageReport};
use crate::types::{Cell, CellKey, ColumnKind, Table};

/// Median of a numeric sample; the mean of the middle pair for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent non-missing value; ties go to the smallest value.
pub fn mode<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Option<Cell> {
    let mut counts: HashMap<CellKey, (usize, &'a Cell)> = HashMap::new();
    for cell in cells {
        if cell.is_missing() {
            continue;
        }
        counts.entry(CellKey::from(cell)).or_insert((0, cell)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(ka, (ca, _)), (kb, (cb, _))| ca.cmp(cb).then_with(|| kb.cmp(ka)))
        .map(|(_, (_, cell))| cell.clone())
}

fn numeric_fill(cells: &[&Cell]) -> Option<Cell> {
    let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
    let m = median(&values)?;
    let all_int = cells.iter().all(|c| matches!(c, Cell::Int(_)));
    if all_int && m.fract() == 0.0 && m >= i64::MIN as f64 && m < i64::MAX as f64 {
        Some(Cell::Int(m as i64))
    } else {
        Some(Cell::Float(m))
    }
}

/// Outcome of the imputation stage: the stage report plus columns left with missing values.
#[derive(Debug)]
pub struct ImputeOutcome {
    pub report: StageReport,
    pub unfilled_columns: Vec<String>,
}

/// Fills missing values column by column: median for numeric columns, mode otherwise.
pub fn apply(table: &mut Table, policy: EmptyColumnPolicy) -> Result<ImputeOutcome> {
    let mut report = StageReport::new(StageName::Impute);
    let mut unfilled_columns = Vec::new();

    for idx in 0..table.columns().len() {
        let present: Vec<&Cell> = table.column_values(idx).filter(|c| !c.is_missing()).collect();
        let missing = table.len() - present.len();
        if missing == 0 {
            continue;
        }

        let column = &table.columns()[idx];
        let fill = match column.kind {
            ColumnKind::Numeric => numeric_fill(&present),
            ColumnKind::Text | ColumnKind::Empty => mode(present.iter().copied()),
        };

        let Some(fill) = fill else {
            match policy {
                EmptyColumnPolicy::Keep => {
                    warn!(
                        "Column '{}' has no values to impute from; leaving {} cells missing",
                        column.name, missing
                    );
                    unfilled_columns.push(column.name.clone());
                    continue;
                }
                EmptyColumnPolicy::Error => {
                    return Err(CleanerError::Pipeline(format!(
                        "column '{}' has no non-missing values to impute from",
                        column.name
                    )));
                }
            }
        };

        debug!("Filling {} missing cells in '{}' with {:?}", missing, column.name, fill);
        for row in table.rows_mut().iter_mut() {
            if row[idx].is_missing() {
                row[idx] = fill.clone();
            }
        }
        report.cells_changed += missing;
    }

    Ok(ImputeOutcome {
        report,
        unfilled_columns,
    })
}
