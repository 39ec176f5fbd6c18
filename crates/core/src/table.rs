//! The token table handed to the pipeline by a tokenizer: every column of
//! the source, each an ordered run of line/column-addressed cells.

use crate::columns;
use serde::Serialize;
use std::collections::HashMap;

/// One addressed cell. Identity of anything derived from a cell comes from
/// `(line, col)`, never from its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub column: String,
    /// 1-based source line
    pub line: u32,
    /// 1-based source column
    pub col: u32,
    pub contents: Option<String>,
}

impl Cell {
    pub fn new(column: &str, line: u32, col: u32, contents: Option<&str>) -> Self {
        Cell {
            column: column.to_owned(),
            line,
            col,
            contents: contents.map(str::to_owned),
        }
    }

    pub fn text(&self) -> &str {
        self.contents.as_deref().unwrap_or("")
    }

    /// Absent, empty, or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTable {
    headers: Vec<String>,
    columns: HashMap<String, Vec<Cell>>,
    encoding: String,
    origin: Option<String>,
}

impl TokenTable {
    pub fn new(origin: Option<&str>, encoding: &str) -> Self {
        TokenTable {
            headers: Vec::new(),
            columns: HashMap::new(),
            encoding: encoding.to_owned(),
            origin: origin.map(str::to_owned),
        }
    }

    /// Add (or replace) a column. Reserved header names are normalized to
    /// their canonical spelling; the cells are re-tagged with that name.
    pub fn push_column(&mut self, name: &str, mut cells: Vec<Cell>) {
        let name = columns::normalize_header(name);
        for cell in &mut cells {
            cell.column.clone_from(&name);
        }
        if !self.headers.contains(&name) {
            self.headers.push(name.clone());
        }
        self.columns.insert(name, cells);
    }

    /// Build a table from row-major text, the way a CSV tokenizer sees it:
    /// headers on line 1, data from line 2, columns numbered from 1. Short
    /// rows are padded with absent cells.
    pub fn from_rows(origin: Option<&str>, headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let mut table = TokenTable::new(origin, "UTF-8");
        for (c, header) in headers.iter().enumerate() {
            let cells = rows
                .iter()
                .enumerate()
                .map(|(r, row)| {
                    Cell::new(header, r as u32 + 2, c as u32 + 1, row.get(c).copied())
                })
                .collect();
            table.push_column(header, cells);
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Number of data rows, as counted by the question column.
    pub fn row_count(&self) -> usize {
        self.columns.get(columns::QUESTION).map_or(0, Vec::len)
    }

    /// Sort every column by line so that row `i` of one column is the same
    /// source row as row `i` of any other.
    pub fn sort_rows(&mut self) {
        for cells in self.columns.values_mut() {
            cells.sort_by_key(|cell| (cell.line, cell.col));
        }
    }

    /// The cell of `column` on row `row`, if the column exists.
    pub fn cell(&self, column: &str, row: usize) -> Option<&Cell> {
        self.columns.get(column).and_then(|cells| cells.get(row))
    }

    /// Non-blank cells of a column with their row index. Empty when the
    /// column is absent.
    pub fn non_blank(&self, column: &str) -> Vec<(usize, &Cell)> {
        self.columns
            .get(column)
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.is_blank())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Columns not in the reserved set, in source order.
    pub fn passthrough_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| !columns::is_known(h))
            .cloned()
            .collect()
    }
}
