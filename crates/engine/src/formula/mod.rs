//! Formula parsing and evaluation.
//!
//! The computation core consumes this module only through its contract:
//! `parse` produces an `Expr`; an `Expr` evaluates against a `CellLookup`,
//! reports the cells it references, and renders its canonical form via
//! `Display`.

pub mod eval;
pub mod parser;

pub use eval::{ArithError, CellLookup};
pub use parser::{parse, Expr, ParseError};
