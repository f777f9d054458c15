//! CSV encoding of cleaned tables and a plain-text preview for the terminal.

use std::fs;
use std::path::Path;

use crate::error::{CleanerError, Result};
use crate::types::Table;

/// Encodes `table` as UTF-8 CSV: one header row of column names, no index column.
/// Missing cells are written as empty fields.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| CleanerError::Io(e.into_error()))
}

pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let bytes = to_csv_bytes(table)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Renders the first `limit` rows as an aligned text table.
pub fn preview(table: &Table, limit: usize) -> String {
    const MAX_WIDTH: usize = 28;

    let header: Vec<String> = table
        .columns()
        .iter()
        .map(|c| truncate(&c.name, MAX_WIDTH))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(|cell| truncate(&cell.to_string(), MAX_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            body.iter()
                .filter_map(|row| row.get(idx))
                .map(|v| v.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut out = String::new();
    out.push_str(&render(header.as_slice()));
    out.push('\n');
    let rule_len = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 3;
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in &body {
        out.push_str(&render(row.as_slice()));
        out.push('\n');
    }
    if table.len() > limit {
        out.push_str(&format!("... {} more rows\n", table.len() - limit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn sample() -> Table {
        Table::new(
            vec!["Name".into(), "Note".into(), "Age".into()],
            vec![
                vec![Cell::text("Ann"), Cell::text("likes, commas"), Cell::Int(30)],
                vec![Cell::text("Bob"), Cell::Missing, Cell::Float(12.5)],
            ],
        )
    }

    #[test]
    fn test_csv_encoding() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Name,Note,Age\nAnn,\"likes, commas\",30\nBob,,12.5\n");
    }

    #[test]
    fn test_write_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_data.csv");
        write_csv(&sample(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Name,Note,Age\n"));
    }

    #[test]
    fn test_preview_limits_rows() {
        let text = preview(&sample(), 1);
        assert!(text.starts_with("Name | Note          | Age"));
        assert!(text.contains("Ann  | likes, commas | 30"));
        assert!(!text.contains("Bob"));
        assert!(text.ends_with("... 1 more rows\n"));
    }
}
