// Evaluated cell results and the display policy

use crate::formula::eval::ErrorCode;

/// What a cell holds after evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Raw text passed through unchanged (non-formulas and blank-formulas)
    Text(String),
    Number(f64),
    /// In-band evaluation error (#VALUE!, #CIRC!)
    Error(ErrorCode),
    /// Structural failure; the message lives in the grid's error overlay
    Invalid,
}

impl CellValue {
    /// Canonical display string. Finite integers print without a decimal
    /// point; other numbers use shortest round-trip formatting.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Error(code) => code.as_str().to_string(),
            CellValue::Invalid => "ERR".to_string(),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_display_has_no_decimal_point() {
        assert_eq!(CellValue::Number(7.0).to_text(), "7");
        assert_eq!(CellValue::Number(-3.0).to_text(), "-3");
        assert_eq!(CellValue::Number(0.0).to_text(), "0");
    }

    #[test]
    fn test_fractional_display() {
        assert_eq!(CellValue::Number(0.5).to_text(), "0.5");
        assert_eq!(CellValue::Number(1.25).to_text(), "1.25");
    }

    #[test]
    fn test_large_magnitude_keeps_float_formatting() {
        assert_eq!(CellValue::Number(1e15).to_text(), "1000000000000000");
    }

    #[test]
    fn test_error_and_sentinel_display() {
        assert_eq!(CellValue::Error(ErrorCode::Value).to_text(), "#VALUE!");
        assert_eq!(CellValue::Error(ErrorCode::Circ).to_text(), "#CIRC!");
        assert_eq!(CellValue::Invalid.to_text(), "ERR");
    }

    #[test]
    fn test_text_passthrough() {
        assert_eq!(CellValue::Text("hello".into()).to_text(), "hello");
    }
}
