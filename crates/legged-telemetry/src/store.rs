//! In-memory columnar session buffer.

use std::collections::HashMap;
use std::fmt;

/// One scalar telemetry value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Single-precision sample (joint state, gains, commands)
    F32(f32),
    /// Double-precision sample (wall-clock timestamps)
    F64(f64),
    /// Free text (state names)
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::F32(v) => write!(f, "{v}"),
            Cell::F64(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f32> for Cell {
    fn from(v: f32) -> Self {
        Cell::F32(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::F64(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    cells: Vec<Option<Cell>>,
}

/// Named, append-only columns sharing a row index.
///
/// Rows are opened with [`begin_row`](Self::begin_row). A cell appended to a
/// column that has fallen behind the current row is placed on the current
/// row, and the skipped rows read as empty. In particular a column first
/// seen mid-session has empty leading cells. Columns that stop being
/// appended to are padded with empty cells at the end when read back.
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows_begun: usize,
}

impl TelemetryStore {
    /// Create an empty store with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column without appending to it. No-op if it exists.
    pub fn declare(&mut self, name: &str) {
        self.column_index(name);
    }

    /// Open a new row and return its index.
    pub fn begin_row(&mut self) -> usize {
        let row = self.rows_begun;
        self.rows_begun = self.rows_begun.saturating_add(1);
        row
    }

    /// Append `value` to column `name`, creating the column if needed.
    pub fn append(&mut self, name: &str, value: impl Into<Cell>) {
        let row = self.rows_begun.saturating_sub(1);
        let idx = self.column_index(name);
        if let Some(column) = self.columns.get_mut(idx) {
            if column.cells.len() < row {
                column.cells.resize(row, None);
            }
            column.cells.push(Some(value.into()));
        }
    }

    fn column_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(Column {
            name: name.to_string(),
            cells: Vec::new(),
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Cells of one column, or `None` if it was never declared.
    pub fn column(&self, name: &str) -> Option<&[Option<Cell>]> {
        let idx = *self.index.get(name)?;
        self.columns.get(idx).map(|c| c.cells.as_slice())
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Length of the longest column.
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.cells.len())
            .max()
            .unwrap_or(0)
    }

    /// Whether no cell has been recorded.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Cell at (`row`, `column`), `None` when empty or out of range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column)?.cells.get(row)?.as_ref()
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No data recorded".to_string();
        }
        format!(
            "Records: {}, Columns: {}",
            self.row_count(),
            self.column_count()
        )
    }
}
