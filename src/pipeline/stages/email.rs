use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::pipeline::{StageName, StageReport};
use crate::types::{Cell, ColumnKind, Table};

pub const EMAIL_COLUMN: &str = "Email";
pub const NAME_COLUMN: &str = "Name";

/// A single ordered string rewrite.
pub struct RewriteRule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl RewriteRule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("email rewrite pattern is valid"),
            replacement,
        }
    }

    pub fn apply(&self, input: &str) -> String {
        self.pattern.replace_all(input, self.replacement).into_owned()
    }
}

/// Applied in order after trimming and lowercasing.
pub static EMAIL_RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        RewriteRule::new("collapse_periods", r"\.\.+", "."),
        RewriteRule::new("collapse_at_signs", r"@+", "@"),
        RewriteRule::new("fix_con_typo", r"\.con$", ".com"),
        // Greedy: drops the last '@' and keeps everything between it and the first.
        RewriteRule::new("drop_extra_at", r"(@.*)@", "${1}"),
    ]
});

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").expect("email shape pattern is valid"));

pub fn normalize_email(raw: &str) -> String {
    let base = raw.trim().to_lowercase();
    EMAIL_RULES.iter().fold(base, |acc, rule| rule.apply(&acc))
}

/// Structural check only: one '@' with a '.' somewhere after it.
pub fn has_valid_shape(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Normalizes the Email column and, when Name is present too, drops rows that
/// lack either value or whose email fails the shape check.
pub fn apply(table: &mut Table) -> StageReport {
    let mut report = StageReport::new(StageName::Email);
    let Some(email_idx) = table.column_index(EMAIL_COLUMN) else {
        return report;
    };

    for row in table.rows_mut().iter_mut() {
        let cell = &mut row[email_idx];
        let normalized = match cell {
            Cell::Missing => continue,
            Cell::Text(raw) => Cell::Text(normalize_email(raw)),
            // String operations yield nothing for non-string values.
            Cell::Int(_) | Cell::Float(_) => Cell::Missing,
        };
        if *cell != normalized {
            *cell = normalized;
            report.cells_changed += 1;
        }
    }

    let kind = ColumnKind::infer(table.column_values(email_idx));
    table.columns_mut()[email_idx].kind = kind;

    let Some(name_idx) = table.column_index(NAME_COLUMN) else {
        return report;
    };

    report.rows_dropped = table.retain_rows(|row| {
        let keep = !row[name_idx].is_missing()
            && row[email_idx].as_text().map(has_valid_shape).unwrap_or(false);
        if !keep {
            debug!("Dropping row: name={:?} email={:?}", row[name_idx], row[email_idx]);
        }
        keep
    });

    report
}
