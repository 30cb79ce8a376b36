//! Block copy and paste with formula translation.
//!
//! Blocks are tab/newline-delimited rectangles of raw cell text. When a
//! paste has a recorded source origin, formula bodies are shifted by the
//! origin delta so relative references land where the author meant them.

use crate::formula::eval::is_formula;
use crate::formula::rewrite::shift_formula_refs;
use crate::grid::Grid;

/// Split a tab/newline-delimited block into rows of cells. Handles CRLF and
/// ignores a single trailing newline.
pub fn split_block(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n')
        .map(|line| {
            line.strip_suffix('\r')
                .unwrap_or(line)
                .split('\t')
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Join the raw text of a rectangular region into a block. Corner order does
/// not matter.
pub fn copy_block(grid: &Grid, r1: usize, c1: usize, r2: usize, c2: usize) -> String {
    use crate::formula::eval::CellSource;

    let (top, bottom) = (r1.min(r2), r1.max(r2));
    let (left, right) = (c1.min(c2), c1.max(c2));
    let mut lines = Vec::with_capacity(bottom - top + 1);
    for row in top..=bottom {
        let cells: Vec<&str> = (left..=right).map(|col| grid.raw(row, col)).collect();
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

/// Paste a block at (dest_row, dest_col). If `source_origin` was recorded by
/// a prior copy/cut, formula bodies are rewritten by the origin delta.
/// Cells landing outside the grid are dropped.
pub fn paste_block(
    grid: &mut Grid,
    dest_row: usize,
    dest_col: usize,
    text: &str,
    source_origin: Option<(usize, usize)>,
) {
    let delta = source_origin.map(|(src_row, src_col)| {
        (
            dest_row as i64 - src_row as i64,
            dest_col as i64 - src_col as i64,
        )
    });

    for (dr, row) in split_block(text).into_iter().enumerate() {
        for (dc, cell) in row.into_iter().enumerate() {
            let row_idx = dest_row + dr;
            let col_idx = dest_col + dc;
            if row_idx >= grid.rows() || col_idx >= grid.cols() {
                continue;
            }
            let value = match delta {
                Some((row_delta, col_delta)) if is_formula(&cell) => {
                    format!("={}", shift_formula_refs(&cell[1..], row_delta, col_delta))
                }
                _ => cell,
            };
            grid.set_raw(row_idx, col_idx, value);
        }
    }
}
