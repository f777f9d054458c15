use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::pipeline::{StageName, StageReport};
use crate::types::{Cell, ColumnKind, Table};

const PHONE_MARKERS: [&str; 3] = ["phone", "mobile", "contact"];

static NON_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\D").expect("non-digit pattern is valid"));
static MIN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{6,}$").expect("digit pattern is valid"));

pub fn is_phone_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    PHONE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Text form of any cell before digit stripping; missing values render as `<NA>`.
fn text_form(cell: &Cell) -> Cow<'_, str> {
    match cell {
        Cell::Missing => Cow::Borrowed("<NA>"),
        Cell::Text(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

pub fn digits_only(cell: &Cell) -> String {
    NON_DIGIT.replace_all(&text_form(cell), "").into_owned()
}

pub fn is_valid_number(digits: &str) -> bool {
    MIN_DIGITS.is_match(digits)
}

/// Strips every phone-like column down to digits and drops rows with fewer than six.
/// Columns are handled one after another, each pass over the rows that survived the last.
pub fn apply(table: &mut Table) -> StageReport {
    let mut report = StageReport::new(StageName::Phone);
    let phone_columns: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| is_phone_column(&column.name))
        .map(|(idx, _)| idx)
        .collect();

    for idx in phone_columns {
        for row in table.rows_mut().iter_mut() {
            let digits = Cell::Text(digits_only(&row[idx]));
            if row[idx] != digits {
                row[idx] = digits;
                report.cells_changed += 1;
            }
        }
        table.columns_mut()[idx].kind = ColumnKind::Text;

        let dropped = table.retain_rows(|row| {
            row[idx].as_text().map(is_valid_number).unwrap_or(false)
        });
        debug!(
            "Phone column '{}' dropped {} rows",
            table.columns()[idx].name,
            dropped
        );
        report.rows_dropped += dropped;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_column_detection() {
        assert!(is_phone_column("Phone"));
        assert!(is_phone_column("Mobile_Number"));
        assert!(is_phone_column("Emergency_Contact"));
        assert!(is_phone_column("Telephone"));
        assert!(!is_phone_column("Email"));
        assert!(!is_phone_column("Name"));
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only(&Cell::text("(555) 123-4567 x2")), "55512345672");
        assert_eq!(digits_only(&Cell::Int(5551234)), "5551234");
        assert_eq!(digits_only(&Cell::Float(12.5)), "125");
        assert_eq!(digits_only(&Cell::Missing), "");
        assert_eq!(digits_only(&Cell::text("+44 20 7946 0958")), "442079460958");
    }

    #[test]
    fn test_length_rule_has_no_upper_bound() {
        assert!(is_valid_number("123456"));
        assert!(is_valid_number("12345678901234567890"));
        assert!(!is_valid_number("12345"));
        assert!(!is_valid_number(""));
    }

    #[test]
    fn test_each_phone_column_filters_independently() {
        let mut table = Table::new(
            vec!["Phone".into(), "Mobile".into(), "Notes".into()],
            vec![
                vec![Cell::text("(555) 123-4567"), Cell::text("555-000-1111"), Cell::text("ok")],
                vec![Cell::text("123"), Cell::text("555-000-2222"), Cell::text("short phone")],
                vec![Cell::text("555 987 6543"), Cell::Missing, Cell::text("no mobile")],
                vec![Cell::Int(5559876543), Cell::Int(5550003333), Cell::text("numeric")],
            ],
        );

        let report = apply(&mut table);

        assert_eq!(report.rows_dropped, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Phone"), Some(&Cell::text("5551234567")));
        assert_eq!(table.get(0, "Mobile"), Some(&Cell::text("5550001111")));
        assert_eq!(table.get(1, "Phone"), Some(&Cell::text("5559876543")));
        assert_eq!(table.get(1, "Notes"), Some(&Cell::text("numeric")));
        assert_eq!(table.columns()[0].kind, ColumnKind::Text);
        assert_eq!(table.columns()[1].kind, ColumnKind::Text);
    }
}
