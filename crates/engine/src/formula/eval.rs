// Formula evaluator - walks the parsed AST against a cell source.
//
// Two error channels: structural failures (bad syntax, list in scalar
// position) are Err(String) and surface as ERR with an overlay message;
// value errors (#VALUE!, #CIRC!) travel in-band through Value and display
// as their code.

use std::cell::RefCell;

use rustc_hash::FxHashSet;

use super::parser::{self, Expr, Op};

/// In-band error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Numeric coercion failure or non-finite arithmetic result
    Value,
    /// Reference cycle detected during evaluation
    Circ,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Circ => "#CIRC!",
        }
    }
}

/// Result of evaluating an expression: a scalar, a flat list (only produced
/// by a range primary), or an in-band error.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    List(Vec<Value>),
    Error(ErrorCode),
}

/// Read-only view of raw cell text, the seam between evaluator and grid.
pub trait CellSource {
    /// Raw text at (row, col). Out-of-bounds reads return "".
    fn raw(&self, row: usize, col: usize) -> &str;
}

/// True if the text is a formula ('=' prefix).
pub fn is_formula(raw: &str) -> bool {
    raw.starts_with('=')
}

/// True if the text is '=' followed only by whitespace. Blank-formulas are
/// carried verbatim and never evaluated.
pub fn is_blank_formula(raw: &str) -> bool {
    is_formula(raw) && raw[1..].trim().is_empty()
}

/// Coerce literal cell text to a number: empty -> 0, finite parse -> number,
/// anything else -> #VALUE!.
pub fn coerce_text(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Number(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Error(ErrorCode::Value),
    }
}

/// One evaluation pass over a cell source. The visiting set spans the whole
/// recursive walk, so a reference cycle comes back as #CIRC! instead of
/// recursing forever.
pub struct Evaluator<'a, S: CellSource> {
    source: &'a S,
    visiting: RefCell<FxHashSet<(usize, usize)>>,
}

impl<'a, S: CellSource> Evaluator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            visiting: RefCell::new(FxHashSet::default()),
        }
    }

    /// Evaluate a formula body. A list at the root is a structural error.
    pub fn eval_body(&self, body: &str) -> Result<Value, String> {
        let expr = parser::parse_body(body)?;
        let value = self.eval(&expr)?;
        if matches!(value, Value::List(_)) {
            return Err("Invalid range in expression".to_string());
        }
        Ok(value)
    }

    /// Evaluate the formula body of the cell at (row, col), marking the cell
    /// as in-progress for cycle detection.
    pub fn eval_formula_at(&self, row: usize, col: usize, body: &str) -> Result<Value, String> {
        self.visiting.borrow_mut().insert((row, col));
        let result = self.eval_body(body);
        self.visiting.borrow_mut().remove(&(row, col));
        result
    }

    fn eval(&self, expr: &Expr) -> Result<Value, String> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::CellRef(r) => self.cell_value(r.row, r.col),
            Expr::Range(start, end) => {
                // Normalize so either corner order works
                let r1 = start.row.min(end.row);
                let r2 = start.row.max(end.row);
                let c1 = start.col.min(end.col);
                let c2 = start.col.max(end.col);
                let mut items = Vec::with_capacity((r2 - r1 + 1) * (c2 - c1 + 1));
                for row in r1..=r2 {
                    for col in c1..=c2 {
                        items.push(self.cell_value(row, col)?);
                    }
                }
                Ok(Value::List(items))
            }
            Expr::Function { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                super::functions::apply(name, &values)
            }
            Expr::BinaryOp { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                apply_op(*op, l, r)
            }
        }
    }

    /// Scalar value of a cell: formulas are evaluated recursively, literals
    /// coerced. Revisiting a cell already on the evaluation stack yields
    /// #CIRC!.
    fn cell_value(&self, row: usize, col: usize) -> Result<Value, String> {
        if self.visiting.borrow().contains(&(row, col)) {
            return Ok(Value::Error(ErrorCode::Circ));
        }

        let raw = self.source.raw(row, col);
        if is_formula(raw) && !is_blank_formula(raw) {
            self.eval_formula_at(row, col, &raw[1..])
        } else {
            Ok(coerce_text(raw))
        }
    }
}

fn apply_op(op: Op, left: Value, right: Value) -> Result<Value, String> {
    let l = scalar_operand(left)?;
    let r = scalar_operand(right)?;
    // First error wins, left to right
    let l = match l {
        Value::Number(n) => n,
        Value::Error(e) => return Ok(Value::Error(e)),
        Value::List(_) => unreachable!(),
    };
    let r = match r {
        Value::Number(n) => n,
        Value::Error(e) => return Ok(Value::Error(e)),
        Value::List(_) => unreachable!(),
    };
    let result = match op {
        Op::Add => l + r,
        Op::Sub => l - r,
        Op::Mul => l * r,
        Op::Div => l / r,
    };
    // Non-finite results (division by zero, overflow) become #VALUE! here
    if result.is_finite() {
        Ok(Value::Number(result))
    } else {
        Ok(Value::Error(ErrorCode::Value))
    }
}

fn scalar_operand(value: Value) -> Result<Value, String> {
    match value {
        Value::List(_) => Err("Invalid range in expression".to_string()),
        other => Ok(other),
    }
}
