//! A1 reference model.
//!
//! Parses and formats textual cell addresses (`A1`, `$B$2`, `AA10`) with
//! independent absolute flags on the row and column components. Coordinates
//! are zero-based in parsed form, one-based in textual form.

use serde::{Deserialize, Serialize};

/// A single cell reference.
/// - `row_abs`/`col_abs`: true if that component is absolute ($1 vs 1, $A vs A)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
    pub row_abs: bool,
    pub col_abs: bool,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col, row_abs: false, col_abs: false }
    }
}

/// Parse an A1-style reference. Accepts `$`-prefixed components and lowercase
/// letters. Returns None if the text is not exactly one reference.
pub fn parse_a1(text: &str) -> Option<CellRef> {
    let mut chars = text.chars().peekable();

    let col_abs = if chars.peek() == Some(&'$') {
        chars.next();
        true
    } else {
        false
    };

    let mut col_str = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() {
            col_str.push(c.to_ascii_uppercase());
            chars.next();
        } else {
            break;
        }
    }
    if col_str.is_empty() {
        return None;
    }

    let row_abs = if chars.peek() == Some(&'$') {
        chars.next();
        true
    } else {
        false
    };

    let row_str: String = chars.collect();
    if row_str.is_empty() || !row_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: usize = row_str.parse().ok()?;
    if row == 0 {
        return None;
    }

    // Column letters decode as base-26 with A=1, then shift to zero-based
    let col = col_str
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1))
        - 1;

    Some(CellRef { row: row - 1, col, row_abs, col_abs })
}

/// Format a reference in A1 notation, emitting `$` flags per component.
pub fn format_a1(r: &CellRef) -> String {
    format!(
        "{}{}{}{}",
        if r.col_abs { "$" } else { "" },
        col_to_letters(r.col),
        if r.row_abs { "$" } else { "" },
        r.row + 1
    )
}

/// Convert a zero-based column index to letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col + 1; // 1-indexed for calculation
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_relative() {
        assert_eq!(parse_a1("A1"), Some(CellRef::new(0, 0)));
        assert_eq!(parse_a1("B3"), Some(CellRef::new(2, 1)));
        // AA10 -> row 9, col 26
        assert_eq!(parse_a1("AA10"), Some(CellRef::new(9, 26)));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(parse_a1("aa10"), parse_a1("AA10"));
        assert_eq!(parse_a1("b2"), Some(CellRef::new(1, 1)));
    }

    #[test]
    fn test_parse_absolute_flags() {
        let r = parse_a1("$A$1").unwrap();
        assert!(r.col_abs && r.row_abs);
        let r = parse_a1("$A1").unwrap();
        assert!(r.col_abs && !r.row_abs);
        let r = parse_a1("A$1").unwrap();
        assert!(!r.col_abs && r.row_abs);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_a1(""), None);
        assert_eq!(parse_a1("A"), None);
        assert_eq!(parse_a1("1"), None);
        assert_eq!(parse_a1("A0"), None); // rows are one-based
        assert_eq!(parse_a1("A1B"), None);
        assert_eq!(parse_a1("$$A1"), None);
        assert_eq!(parse_a1("A 1"), None);
    }

    #[test]
    fn test_format_basic() {
        assert_eq!(format_a1(&CellRef::new(0, 0)), "A1");
        assert_eq!(format_a1(&CellRef::new(9, 26)), "AA10");
        // col 27 is AB
        assert_eq!(col_to_letters(27), "AB");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
    }

    #[test]
    fn test_format_absolute_flags() {
        let r = CellRef { row: 0, col: 0, row_abs: true, col_abs: true };
        assert_eq!(format_a1(&r), "$A$1");
        let r = CellRef { row: 4, col: 0, row_abs: true, col_abs: false };
        assert_eq!(format_a1(&r), "A$5");
    }

    proptest! {
        #[test]
        fn roundtrip_relative(row in 0usize..10_000, col in 0usize..10_000) {
            let r = CellRef::new(row, col);
            prop_assert_eq!(parse_a1(&format_a1(&r)), Some(r));
        }

        #[test]
        fn roundtrip_flags(row in 0usize..200, col in 0usize..200,
                           row_abs: bool, col_abs: bool) {
            let r = CellRef { row, col, row_abs, col_abs };
            prop_assert_eq!(parse_a1(&format_a1(&r)), Some(r));
        }
    }
}
