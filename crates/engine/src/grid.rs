//! Grid model and error overlay.
//!
//! A rectangular, row-major store of raw cell text. Every displayed string is
//! a deterministic function of the raw strings alone. The error overlay is a
//! sparse map holding the last thrown parse/evaluation message per cell; an
//! entry exists iff the most recent evaluation of that cell threw.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::formula::eval::{is_blank_formula, is_formula, CellSource, Evaluator, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major raw text
    cells: Vec<Vec<String>>,
    /// Last thrown error message per cell
    #[serde(skip)]
    errors: FxHashMap<(usize, usize), String>,
}

impl CellSource for Grid {
    fn raw(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Grid {
    /// Create an empty grid. Dimensions are clamped to at least 1x1.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![vec![String::new(); cols]; rows],
            errors: FxHashMap::default(),
        }
    }

    /// Build a grid from a row-major matrix, padding short rows with empty
    /// strings. An empty matrix produces a 1x1 grid.
    pub fn load_from_matrix(matrix: Vec<Vec<String>>) -> Self {
        let cols = matrix.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let rows = matrix.len().max(1);
        let mut grid = Self::new(rows, cols);
        for (r, mut row) in matrix.into_iter().enumerate() {
            row.resize(cols, String::new());
            grid.cells[r] = row;
        }
        grid
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Set raw text. Out-of-bounds writes are dropped.
    pub fn set_raw(&mut self, row: usize, col: usize, text: impl Into<String>) {
        if row < self.rows && col < self.cols {
            self.cells[row][col] = text.into();
        }
    }

    pub fn add_row(&mut self) {
        self.cells.push(vec![String::new(); self.cols]);
        self.rows += 1;
    }

    pub fn add_column(&mut self) {
        for row in &mut self.cells {
            row.push(String::new());
        }
        self.cols += 1;
    }

    /// Remove the last row, keeping at least one.
    pub fn remove_row(&mut self) {
        if self.rows > 1 {
            self.cells.pop();
            self.rows -= 1;
            self.errors.retain(|&(r, _), _| r < self.rows);
        }
    }

    /// Remove the last column, keeping at least one.
    pub fn remove_column(&mut self) {
        if self.cols > 1 {
            for row in &mut self.cells {
                row.pop();
            }
            self.cols -= 1;
            self.errors.retain(|&(_, c), _| c < self.cols);
        }
    }

    /// Resize to the given dimensions (clamped to 1x1), preserving content
    /// that stays in bounds.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let rows = rows.max(1);
        let cols = cols.max(1);
        self.cells.resize(rows, vec![String::new(); cols]);
        for row in &mut self.cells {
            row.resize(cols, String::new());
        }
        self.rows = rows;
        self.cols = cols;
        self.errors
            .retain(|&(r, c), _| r < rows && c < cols);
    }

    /// Evaluate the cell at (row, col) and refresh its error-overlay entry.
    ///
    /// Non-formulas and blank-formulas pass their raw text through. Formula
    /// cells evaluate their body; a thrown error records its message in the
    /// overlay and yields `Invalid`, everything else (including in-band error
    /// values) clears the entry.
    pub fn value_at(&mut self, row: usize, col: usize) -> CellValue {
        let raw = self.raw(row, col);
        if !is_formula(raw) || is_blank_formula(raw) {
            let text = raw.to_string();
            self.errors.remove(&(row, col));
            return CellValue::Text(text);
        }

        let result = {
            let evaluator = Evaluator::new(&*self);
            let body = &self.raw(row, col)[1..];
            evaluator.eval_formula_at(row, col, body)
        };
        match result {
            Ok(Value::Number(n)) => {
                self.errors.remove(&(row, col));
                CellValue::Number(n)
            }
            Ok(Value::Error(code)) => {
                self.errors.remove(&(row, col));
                CellValue::Error(code)
            }
            // Lists never escape eval_formula_at's root check
            Ok(Value::List(_)) => {
                self.errors
                    .insert((row, col), "Invalid range in expression".to_string());
                CellValue::Invalid
            }
            Err(message) => {
                self.errors.insert((row, col), message);
                CellValue::Invalid
            }
        }
    }

    /// Displayed string for a cell.
    pub fn display_value(&mut self, row: usize, col: usize) -> String {
        self.value_at(row, col).to_text()
    }

    /// Visit the displayed string of every cell except `active`, row-major.
    /// The active cell is skipped so in-progress editor text is never
    /// overwritten.
    pub fn for_each_display<F>(&mut self, active: Option<(usize, usize)>, mut f: F)
    where
        F: FnMut(usize, usize, &str),
    {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if active == Some((row, col)) {
                    continue;
                }
                let text = self.display_value(row, col);
                f(row, col, &text);
            }
        }
    }

    /// Last thrown error message for a cell, if its most recent evaluation
    /// failed.
    pub fn error(&self, row: usize, col: usize) -> Option<&str> {
        self.errors.get(&(row, col)).map(String::as_str)
    }

    /// Read-only iteration over the error overlay.
    pub fn errors(&self) -> impl Iterator<Item = ((usize, usize), &str)> {
        self.errors.iter().map(|(&pos, msg)| (pos, msg.as_str()))
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
