// Built-in spreadsheet functions

use super::eval::{ErrorCode, Value};

/// Check if a function name is a known built-in function.
/// This is the single source of truth for supported functions.
/// Function names must be uppercase (as produced by the tokenizer).
pub fn is_known_function(name: &str) -> bool {
    matches!(name, "SUM" | "MIN" | "MAX" | "AVERAGE")
}

/// Apply a function to its evaluated arguments. Arguments are flattened one
/// level (range lists splice into scalars) and the first in-band error wins.
/// The name must already have passed `is_known_function`.
pub fn apply(name: &str, args: &[Value]) -> Result<Value, String> {
    let nums = match flatten(args) {
        Ok(nums) => nums,
        Err(code) => return Ok(Value::Error(code)),
    };
    let result = match name {
        "SUM" => sum(&nums),
        "MIN" => min(&nums),
        "MAX" => max(&nums),
        "AVERAGE" => average(&nums),
        _ => return Err(format!("Unknown function {}", name)),
    };
    // Overflowed reductions become #VALUE! like any other operator
    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Ok(Value::Error(ErrorCode::Value))
    }
}

/// Flatten an argument vector into scalars, left to right.
fn flatten(args: &[Value]) -> Result<Vec<f64>, ErrorCode> {
    let mut nums = Vec::new();
    for arg in args {
        match arg {
            Value::Number(n) => nums.push(*n),
            Value::Error(e) => return Err(*e),
            Value::List(items) => {
                for item in items {
                    match item {
                        Value::Number(n) => nums.push(*n),
                        Value::Error(e) => return Err(*e),
                        // Ranges produce flat lists; nesting cannot occur
                        Value::List(_) => unreachable!(),
                    }
                }
            }
        }
    }
    Ok(nums)
}

fn sum(nums: &[f64]) -> f64 {
    nums.iter().sum()
}

fn min(nums: &[f64]) -> f64 {
    nums.iter().copied().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |a| a.min(n)))
    })
    .unwrap_or(0.0)
}

fn max(nums: &[f64]) -> f64 {
    nums.iter().copied().fold(None, |acc: Option<f64>, n| {
        Some(acc.map_or(n, |a| a.max(n)))
    })
    .unwrap_or(0.0)
}

fn average(nums: &[f64]) -> f64 {
    if nums.is_empty() {
        0.0
    } else {
        sum(nums) / nums.len() as f64
    }
}
