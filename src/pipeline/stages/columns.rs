use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{CleanerError, Result};
use crate::pipeline::{CollisionPolicy, StageName, StageReport};
use crate::types::Table;

/// Canonicalizes a raw header: trim, lowercase, spaces to underscores, then title-case.
pub fn canonical_name(raw: &str) -> String {
    let snake = raw.trim().to_lowercase().replace(' ', "_");
    title_case(&snake)
}

/// Uppercases every letter that follows a non-letter, lowercases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Renames every column to its canonical name and resolves collisions per `policy`.
pub fn apply(table: &mut Table, policy: CollisionPolicy) -> Result<StageReport> {
    let mut report = StageReport::new(StageName::Columns);
    let mut holders: HashMap<String, usize> = HashMap::new();
    let mut shadowed: Vec<usize> = Vec::new();
    let raw_names: Vec<String> = table.columns().iter().map(|c| c.name.clone()).collect();

    for (idx, column) in table.columns_mut().iter_mut().enumerate() {
        let canonical = canonical_name(&column.name);
        if let Some(&earlier) = holders.get(&canonical) {
            match policy {
                CollisionPolicy::LastWins => {
                    warn!(
                        "Column '{}' normalizes to '{}', replacing the earlier column",
                        column.name, canonical
                    );
                    shadowed.push(earlier);
                }
                CollisionPolicy::Error => {
                    return Err(CleanerError::Pipeline(format!(
                        "columns '{}' (#{}) and '{}' (#{}) both normalize to '{}'",
                        raw_names[earlier],
                        earlier + 1,
                        raw_names[idx],
                        idx + 1,
                        canonical
                    )));
                }
            }
        }
        holders.insert(canonical.clone(), idx);

        if column.name != canonical {
            debug!("Renamed column '{}' -> '{}'", column.name, canonical);
            column.name = canonical;
            report.cells_changed += 1;
        }
    }

    shadowed.sort_unstable();
    for idx in shadowed.into_iter().rev() {
        table.remove_column(idx);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("  Email "), "Email");
        assert_eq!(canonical_name("phone number"), "Phone_Number");
        assert_eq!(canonical_name("FULL NAME"), "Full_Name");
        assert_eq!(canonical_name("e-mail"), "E-Mail");
        assert_eq!(canonical_name("2nd phone"), "2Nd_Phone");
        assert_eq!(canonical_name("already_snake_case"), "Already_Snake_Case");
    }

    #[test]
    fn test_collision_last_wins_keeps_later_column() {
        let mut table = Table::new(
            vec!["email".into(), "Name".into(), " EMAIL".into()],
            vec![vec![Cell::text("old@a.com"), Cell::text("Ann"), Cell::text("new@a.com")]],
        );

        apply(&mut table, CollisionPolicy::LastWins).unwrap();

        assert_eq!(table.column_names(), vec!["Name", "Email"]);
        assert_eq!(table.get(0, "Email"), Some(&Cell::text("new@a.com")));
    }

    #[test]
    fn test_collision_error_policy() {
        let mut table = Table::new(vec!["Phone".into(), "phone ".into()], vec![]);
        let err = apply(&mut table, CollisionPolicy::Error).unwrap_err();
        assert!(matches!(err, CleanerError::Pipeline(_)));
        assert!(err.to_string().contains("'Phone'"));
    }

    #[test]
    fn test_report_counts_renamed_columns() {
        let mut table = Table::new(vec!["Name".into(), "email".into()], vec![]);
        let report = apply(&mut table, CollisionPolicy::LastWins).unwrap();
        assert_eq!(report.cells_changed, 1);
        assert_eq!(report.rows_dropped, 0);
    }
}
