//! Error kinds raised by sheet operations.
//!
//! All three kinds surface synchronously to the caller of the failing
//! operation, before any state change. Arithmetic errors are not here:
//! they are values (`CellValue::Error`), not failures.

use thiserror::Error;

use crate::addr::Addr;
use crate::formula::ParseError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SheetError {
    /// The address is the sentinel or lies outside the sheet bounds.
    #[error("invalid cell address ({}, {})", .0.row, .0.col)]
    InvalidAddress(Addr),

    /// The proposed formula would close a dependency cycle. The sheet is
    /// left exactly as it was before the call.
    #[error("formula would create a circular reference")]
    CircularReference,

    /// The formula source was rejected by the parser. No state change.
    #[error("malformed formula: {0}")]
    MalformedFormula(#[from] ParseError),
}
