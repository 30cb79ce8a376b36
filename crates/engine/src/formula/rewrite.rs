//! Reference rewriter.
//!
//! Shifts every non-absolute row/column component in a formula body by a
//! (row, col) delta. Used when pasting a copied formula at a new origin.
//! Works on the raw text, not the AST: range endpoints are matched and
//! rewritten independently, and anything that is not a reference literal is
//! left alone. The grammar has no string literals, so a reference-shaped
//! substring is always a real reference.

use regex::Regex;

use super::refs::col_to_letters;

/// Shift cell references in a formula body by row/col deltas, respecting
/// `$` anchors. A reference pushed above row 1 or left of column A becomes
/// `#REF!`.
pub fn shift_formula_refs(body: &str, row_delta: i64, col_delta: i64) -> String {
    // Optional $ before col letters, col letters, optional $ before row, row digits
    let re = Regex::new(r"(\$?)([A-Za-z]+)(\$?)(\d+)").unwrap();

    re.replace_all(body, |caps: &regex::Captures| {
        let col_abs = &caps[1] == "$";
        let col_letters = &caps[2];
        let row_abs = &caps[3] == "$";
        let row_num: i64 = match caps[4].parse() {
            Ok(n) => n,
            Err(_) => return caps[0].to_string(),
        };
        // Row numbers are one-based; "A0" is not a reference, leave it alone
        if row_num == 0 {
            return caps[0].to_string();
        }

        let col = col_letters
            .to_uppercase()
            .chars()
            .fold(0i64, |acc, c| acc * 26 + (c as i64 - 'A' as i64 + 1))
            - 1;

        let new_col = if col_abs { col } else { col + col_delta };
        let new_row = if row_abs { row_num } else { row_num + row_delta };

        if new_col < 0 || new_row < 1 {
            return "#REF!".to_string();
        }

        format!(
            "{}{}{}{}",
            if col_abs { "$" } else { "" },
            col_to_letters(new_col as usize),
            if row_abs { "$" } else { "" },
            new_row
        )
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_flags_respected() {
        assert_eq!(
            shift_formula_refs("$A$1+$A1+A$1+A1", 1, 1),
            "$A$1+$A2+B$1+B2"
        );
    }

    #[test]
    fn test_range_endpoints_shift_independently() {
        assert_eq!(shift_formula_refs("SUM(A1:B2)", 2, 1), "SUM(B3:C4)");
        assert_eq!(shift_formula_refs("SUM($A$1:B2)", 2, 1), "SUM($A$1:C4)");
    }

    #[test]
    fn test_zero_delta_is_identity() {
        let body = "SUM($A$1:B2)+C3*2";
        assert_eq!(shift_formula_refs(body, 0, 0), body);
    }

    #[test]
    fn test_negative_deltas() {
        assert_eq!(shift_formula_refs("B2+C3", -1, -1), "A1+B2");
    }

    #[test]
    fn test_underflow_becomes_ref_error() {
        assert_eq!(shift_formula_refs("A1", -1, 0), "#REF!");
        assert_eq!(shift_formula_refs("A1+B2", 0, -1), "#REF!+A2");
    }

    #[test]
    fn test_function_names_untouched() {
        // SUM has no trailing digits, so it never matches
        assert_eq!(shift_formula_refs("SUM(A1)", 1, 0), "SUM(A2)");
    }

    #[test]
    fn test_numbers_untouched() {
        assert_eq!(shift_formula_refs("A1*100+2.5", 1, 1), "B2*100+2.5");
    }

    #[test]
    fn test_row_zero_left_alone() {
        assert_eq!(shift_formula_refs("A0", 1, 1), "A0");
    }

    #[test]
    fn test_multi_letter_columns() {
        assert_eq!(shift_formula_refs("Z1", 0, 1), "AA1");
        assert_eq!(shift_formula_refs("AA10", 1, 1), "AB11");
    }

    #[test]
    fn test_lowercase_refs_normalize() {
        assert_eq!(shift_formula_refs("a1+b2", 1, 0), "A2+B3");
    }

    #[test]
    fn test_whitespace_only_body_unchanged() {
        assert_eq!(shift_formula_refs("   ", 3, 3), "   ");
    }
}
