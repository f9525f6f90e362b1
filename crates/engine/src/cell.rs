//! Cell payloads and value rules.
//!
//! A cell holds either literal text or a parsed formula; the empty cell is
//! represented by the absence of a map entry in the sheet and is never
//! stored. Dependency edges live in the sheet's graph, not here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::addr::Addr;
use crate::formula::eval::fmt_number;
use crate::formula::{ArithError, CellLookup, Expr};

/// The value a cell presents when read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    /// Arithmetic-error marker; stored and propagated like any other value.
    Error(ArithError),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", fmt_number(*n)),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

/// Tagged cell payload.
#[derive(Debug, Clone)]
pub enum CellContent {
    /// Raw input text, stored as entered (including a leading apostrophe).
    Text(String),
    Formula {
        expr: Expr,
        /// Referenced cells (children), deduplicated, first-encountered order.
        refs: Vec<Addr>,
    },
}

#[derive(Debug, Clone)]
pub struct Cell {
    content: CellContent,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: CellContent::Text(text.into()),
        }
    }

    pub fn formula(expr: Expr, refs: Vec<Addr>) -> Self {
        Self {
            content: CellContent::Formula { expr, refs },
        }
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.content, CellContent::Formula { .. })
    }

    /// The cells this cell's formula reads from. Empty for text cells.
    pub fn referenced_cells(&self) -> &[Addr] {
        match &self.content {
            CellContent::Text(_) => &[],
            CellContent::Formula { refs, .. } => refs,
        }
    }

    /// The cell's textual form: the original literal, or `=` followed by
    /// the canonical rendering of the parsed formula.
    pub fn display_text(&self) -> String {
        match &self.content {
            CellContent::Text(text) => text.clone(),
            CellContent::Formula { expr, .. } => format!("={expr}"),
        }
    }

    /// Compute this cell's value against current sheet contents.
    pub fn compute_value(&self, lookup: &dyn CellLookup) -> CellValue {
        match &self.content {
            CellContent::Text(text) => text_value(text),
            CellContent::Formula { expr, .. } => match expr.evaluate(lookup) {
                Ok(n) => CellValue::Number(n),
                Err(e) => CellValue::Error(e),
            },
        }
    }
}

/// Value interpretation of literal text.
///
/// Empty text is numeric zero. Otherwise a C-`atoi` leading-integer parse:
/// trailing non-numeric characters are ignored (`"5abc"` is 5). A parse of
/// zero with text other than `"0"` means non-numeric; an escaped literal
/// (leading apostrophe) has the apostrophe stripped and is always a string.
pub fn text_value(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Number(0.0);
    }
    let n = leading_int(text);
    if !(n == 0.0 && text != "0") {
        return CellValue::Number(n);
    }
    match text.strip_prefix('\'') {
        Some(rest) => CellValue::Text(rest.to_string()),
        None => CellValue::Text(text.to_string()),
    }
}

/// C `atoi`: skip leading whitespace, optional sign, then digits up to the
/// first non-digit character.
fn leading_int(text: &str) -> f64 {
    let s = text.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in s.bytes().take_while(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        value = -value;
    }
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parse;

    struct Zeros;

    impl CellLookup for Zeros {
        fn cell_value(&self, _addr: Addr) -> Result<f64, ArithError> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_text_value_empty_is_zero() {
        assert_eq!(text_value(""), CellValue::Number(0.0));
    }

    #[test]
    fn test_text_value_literal_zero() {
        assert_eq!(text_value("0"), CellValue::Number(0.0));
    }

    #[test]
    fn test_text_value_leading_integer() {
        assert_eq!(text_value("5abc"), CellValue::Number(5.0));
        assert_eq!(text_value("42"), CellValue::Number(42.0));
        assert_eq!(text_value("-3x"), CellValue::Number(-3.0));
        assert_eq!(text_value(" 7"), CellValue::Number(7.0));
    }

    #[test]
    fn test_text_value_non_numeric_is_string() {
        assert_eq!(text_value("abc"), CellValue::Text("abc".to_string()));
        // atoi yields 0 but the text is not "0"
        assert_eq!(text_value("0abc"), CellValue::Text("0abc".to_string()));
        assert_eq!(text_value("00"), CellValue::Text("00".to_string()));
    }

    #[test]
    fn test_text_value_escaped_literal() {
        assert_eq!(text_value("'5"), CellValue::Text("5".to_string()));
        assert_eq!(text_value("'hello"), CellValue::Text("hello".to_string()));
        // the apostrophe forces string interpretation even for numbers
        assert_eq!(text_value("'123"), CellValue::Text("123".to_string()));
    }

    #[test]
    fn test_display_text_keeps_apostrophe() {
        let cell = Cell::text("'5");
        assert_eq!(cell.display_text(), "'5");
        // value strips it
        assert_eq!(cell.compute_value(&Zeros), CellValue::Text("5".to_string()));
    }

    #[test]
    fn test_formula_display_text_is_canonical() {
        let expr = parse("(1+2)*3").unwrap();
        let refs = expr.referenced_cells();
        let cell = Cell::formula(expr, refs);
        assert_eq!(cell.display_text(), "=(1+2)*3");
    }

    #[test]
    fn test_formula_compute_value() {
        let expr = parse("2*3+1").unwrap();
        let cell = Cell::formula(expr, vec![]);
        assert_eq!(cell.compute_value(&Zeros), CellValue::Number(7.0));

        let expr = parse("1/0").unwrap();
        let cell = Cell::formula(expr, vec![]);
        assert_eq!(cell.compute_value(&Zeros), CellValue::Error(ArithError));
    }

    #[test]
    fn test_referenced_cells_empty_for_text() {
        assert!(Cell::text("hi").referenced_cells().is_empty());
        assert!(!Cell::text("hi").is_formula());
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Text("x".to_string()).to_string(), "x");
        assert_eq!(CellValue::Error(ArithError).to_string(), "#ARITHM!");
    }
}
