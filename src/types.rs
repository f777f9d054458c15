use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CleanerError, Result};

/// A single value in a table.
///
/// `Missing` is its own value and is never the empty string; blank text becomes
/// `Missing` only once the blank normalizer has run.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// True for text made only of whitespace (including the empty string).
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Parses a raw spreadsheet string the way spreadsheet clients numericise values.
    ///
    /// Integers with a leading zero or sign prefix stay text so identifiers such as
    /// postcodes and phone numbers survive intact. So do digit runs too long for `i64`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Text(raw.to_string());
        }

        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
        if trimmed.starts_with('+') || leading_zero {
            return Cell::Text(raw.to_string());
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return Cell::Int(i);
        }
        if is_integer_literal(trimmed) {
            return Cell::Text(raw.to_string());
        }
        if trimmed.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Cell::Float(f);
                }
            }
        }
        Cell::Text(raw.to_string())
    }
}

/// An optional `-` followed by one or more ASCII digits.
pub(crate) fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Hashable, totally ordered view of a cell used for deduplication and mode counting.
///
/// `Missing` equals `Missing`; integral floats compare equal to the matching integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Missing,
    Int(i64),
    Float(u64),
    Text(String),
}

impl CellKey {
    fn rank(&self) -> u8 {
        match self {
            CellKey::Missing => 0,
            CellKey::Int(_) | CellKey::Float(_) => 1,
            CellKey::Text(_) => 2,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            CellKey::Int(i) => Some(*i as f64),
            CellKey::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }
}

impl From<&Cell> for CellKey {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Missing => CellKey::Missing,
            Cell::Int(i) => CellKey::Int(*i),
            Cell::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    CellKey::Int(*f as i64)
                } else if f.is_nan() {
                    CellKey::Float(f64::NAN.to_bits())
                } else {
                    CellKey::Float(f.to_bits())
                }
            }
            Cell::Text(s) => CellKey::Text(s.clone()),
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellKey::Int(a), CellKey::Int(b)) => a.cmp(b),
            (CellKey::Text(a), CellKey::Text(b)) => a.cmp(b),
            (CellKey::Missing, CellKey::Missing) => Ordering::Equal,
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => {
                    let self_float = matches!(self, CellKey::Float(_));
                    let other_float = matches!(other, CellKey::Float(_));
                    a.total_cmp(&b).then_with(|| self_float.cmp(&other_float))
                }
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-column type tag, decided once when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    /// No value at all: every cell is missing or blank.
    Empty,
}

impl ColumnKind {
    /// Infers a kind from cell values, ignoring missing and blank cells.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut seen = false;
        for cell in cells {
            if cell.is_missing() || cell.is_blank() {
                continue;
            }
            if !cell.is_numeric() {
                return ColumnKind::Text;
            }
            seen = true;
        }
        if seen {
            ColumnKind::Numeric
        } else {
            ColumnKind::Empty
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered rows of cells sharing one column set. Cells are aligned with `columns` by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table and infers each column's kind from its values.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name,
                kind: ColumnKind::infer(rows.iter().filter_map(|row| row.get(idx))),
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from `(column, value)` records. Column order follows first appearance;
    /// columns absent from a record are `Missing` there.
    pub fn from_records<K, I>(records: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = Vec<(K, Cell)>>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut keyed: Vec<Vec<(usize, Cell)>> = Vec::new();
        for record in records {
            let mut row = Vec::with_capacity(record.len());
            for (key, cell) in record {
                let key = key.into();
                let idx = match headers.iter().position(|h| *h == key) {
                    Some(idx) => idx,
                    None => {
                        headers.push(key);
                        headers.len() - 1
                    }
                };
                row.push((idx, cell));
            }
            keyed.push(row);
        }

        let width = headers.len();
        let rows = keyed
            .into_iter()
            .map(|pairs| {
                let mut row = vec![Cell::Missing; width];
                for (idx, cell) in pairs {
                    row[idx] = cell;
                }
                row
            })
            .collect();
        Self::new(headers, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// All values of the column at `idx`, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Checks that every row carries exactly one cell per column.
    pub fn check_shape(&self) -> Result<()> {
        let width = self.columns.len();
        for (n, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(CleanerError::Pipeline(format!(
                    "row {} has {} cells, expected {}",
                    n,
                    row.len(),
                    width
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }

    /// Keeps rows matching `keep`, preserving order. Returns how many were dropped.
    pub(crate) fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }

    pub(crate) fn remove_column(&mut self, idx: usize) {
        self.columns.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
    }
}
