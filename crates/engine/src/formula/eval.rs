//! Formula evaluation and canonical rendering.
//!
//! Evaluation is a pure function of the expression and a `CellLookup`
//! capability; the sheet passes itself as the lookup rather than exposing
//! any global state. Undefined numeric results (division by zero, overflow
//! to infinity) are reported as the `ArithError` marker value, never as a
//! failure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::addr::Addr;

use super::parser::{Expr, Op, UnOp};

/// Arithmetic-error marker: the value of a formula whose computation is
/// numerically undefined. Propagates through dependent formulas as a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithError;

impl fmt::Display for ArithError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#ARITHM!")
    }
}

/// Capability for reading other cells' numeric values during evaluation.
///
/// Empty cells read as zero. A referenced cell whose value is a plain
/// (non-numeric) string, or is itself an arithmetic error, yields
/// `ArithError`.
pub trait CellLookup {
    fn cell_value(&self, addr: Addr) -> Result<f64, ArithError>;
}

impl Expr {
    /// Evaluate against the given lookup.
    pub fn evaluate(&self, lookup: &dyn CellLookup) -> Result<f64, ArithError> {
        let n = match self {
            Expr::Number(n) => *n,
            Expr::CellRef(addr) => lookup.cell_value(*addr)?,
            Expr::UnaryOp { op, operand } => {
                let v = operand.evaluate(lookup)?;
                match op {
                    UnOp::Plus => v,
                    UnOp::Neg => -v,
                }
            }
            Expr::BinaryOp { op, left, right } => {
                let l = left.evaluate(lookup)?;
                let r = right.evaluate(lookup)?;
                match op {
                    Op::Add => l + r,
                    Op::Sub => l - r,
                    Op::Mul => l * r,
                    Op::Div => {
                        if r == 0.0 {
                            return Err(ArithError);
                        }
                        l / r
                    }
                }
            }
        };
        if n.is_finite() {
            Ok(n)
        } else {
            Err(ArithError)
        }
    }

    /// All cell positions this expression references, in first-encountered
    /// order. May contain duplicates; the caller deduplicates.
    pub fn referenced_cells(&self) -> Vec<Addr> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs(&self, refs: &mut Vec<Addr>) {
        match self {
            Expr::Number(_) => {}
            Expr::CellRef(addr) => refs.push(*addr),
            Expr::UnaryOp { operand, .. } => operand.collect_refs(refs),
            Expr::BinaryOp { left, right, .. } => {
                left.collect_refs(refs);
                right.collect_refs(refs);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::CellRef(_) => 3,
            Expr::UnaryOp { .. } => 2,
            Expr::BinaryOp { op: Op::Mul | Op::Div, .. } => 1,
            Expr::BinaryOp { op: Op::Add | Op::Sub, .. } => 0,
        }
    }
}

/// Canonical form: minimal parentheses, no whitespace.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", fmt_number(*n)),
            Expr::CellRef(addr) => write!(f, "{addr}"),
            Expr::UnaryOp { op, operand } => {
                let sign = match op {
                    UnOp::Plus => '+',
                    UnOp::Neg => '-',
                };
                if operand.precedence() < self.precedence() {
                    write!(f, "{sign}({operand})")
                } else {
                    write!(f, "{sign}{operand}")
                }
            }
            Expr::BinaryOp { op, left, right } => {
                let sym = match op {
                    Op::Add => '+',
                    Op::Sub => '-',
                    Op::Mul => '*',
                    Op::Div => '/',
                };
                if left.precedence() < self.precedence() {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, "{sym}")?;
                // Subtraction and division do not associate to the right:
                // 8-(4-2) keeps its parentheses.
                let needs_parens = right.precedence() < self.precedence()
                    || (right.precedence() == self.precedence() && matches!(op, Op::Sub | Op::Div));
                if needs_parens {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
        }
    }
}

/// Render a number the way cell values display: whole values without a
/// fractional part, everything else in the shortest f64 form.
pub(crate) fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
