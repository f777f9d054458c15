use std::collections::HashSet;

use tracing::debug;

use crate::pipeline::stages::email::EMAIL_COLUMN;
use crate::pipeline::{StageName, StageReport};
use crate::types::{CellKey, Table};

/// Drops repeated Email values (first wins), then rows identical across every column.
pub fn apply(table: &mut Table) -> StageReport {
    let mut report = StageReport::new(StageName::Dedupe);

    if let Some(email_idx) = table.column_index(EMAIL_COLUMN) {
        let mut seen: HashSet<CellKey> = HashSet::new();
        let dropped = table.retain_rows(|row| seen.insert(CellKey::from(&row[email_idx])));
        debug!("Dropped {} rows with a repeated email", dropped);
        report.rows_dropped += dropped;
    }

    let mut seen: HashSet<Vec<CellKey>> = HashSet::new();
    let dropped = table.retain_rows(|row| seen.insert(row.iter().map(CellKey::from).collect()));
    debug!("Dropped {} fully identical rows", dropped);
    report.rows_dropped += dropped;

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    #[test]
    fn test_repeated_email_keeps_first() {
        let mut table = Table::new(
            vec!["Name".into(), "Email".into()],
            vec![
                vec![Cell::text("Ann"), Cell::text("a@b.com")],
                vec![Cell::text("Annie"), Cell::text("a@b.com")],
                vec![Cell::text("Bob"), Cell::text("b@b.com")],
            ],
        );

        let report = apply(&mut table);

        assert_eq!(report.rows_dropped, 1);
        assert_eq!(table.get(0, "Name"), Some(&Cell::text("Ann")));
        assert_eq!(table.get(1, "Name"), Some(&Cell::text("Bob")));
    }

    #[test]
    fn test_missing_emails_count_as_equal() {
        let mut table = Table::new(
            vec!["Name".into(), "Email".into()],
            vec![
                vec![Cell::text("Ann"), Cell::Missing],
                vec![Cell::text("Bob"), Cell::Missing],
            ],
        );

        apply(&mut table);

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_identical_rows_without_email_column() {
        let mut table = Table::new(
            vec!["City".into(), "Score".into()],
            vec![
                vec![Cell::text("Oslo"), Cell::Int(3)],
                vec![Cell::text("Oslo"), Cell::Float(3.0)],
                vec![Cell::text("Oslo"), Cell::Int(4)],
                vec![Cell::Missing, Cell::Missing],
                vec![Cell::Missing, Cell::Missing],
            ],
        );

        let report = apply(&mut table);

        assert_eq!(report.rows_dropped, 2);
        assert_eq!(table.len(), 3);
    }
}
