use crate::pipeline::{StageName, StageReport};
use crate::types::{Cell, Table};

/// Turns empty and whitespace-only text cells into `Missing`, in every column.
pub fn apply(table: &mut Table) -> StageReport {
    let mut report = StageReport::new(StageName::Blanks);
    for cell in table.rows_mut().iter_mut().flatten() {
        if cell.is_blank() {
            *cell = Cell::Missing;
            report.cells_changed += 1;
        }
    }
    report
}
