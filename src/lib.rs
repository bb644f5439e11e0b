//! Convert and simplify physical-quantity expressions.
//!
//! `unitpath` parses a compact infix notation (`5 fur/ftn`, `kg m/s^2`)
//! into quantities — a scalar paired with a sparse signed-exponent map over
//! opaque unit symbols — and searches a table of declared conversion facts
//! for an edge sequence that rewrites one unit shape into another, or into
//! an equivalent shape of lower symbolic complexity.
//!
//! The engine attaches no physical meaning to symbols: it converts between
//! whatever the fact table connects and carries unknown symbols through
//! untouched.
//!
//! ```
//! use unitpath::{default_table, parse_expression};
//!
//! let from = parse_expression("5 fur/ftn").unwrap();
//! let to = parse_expression("m/h").unwrap();
//! let out = default_table().convert(&from, &to).unwrap();
//! assert!((out.value() - 2.9935714285714285).abs() < 1e-9);
//! ```

mod convert;
mod error;
mod parser;
mod quantity;

pub use crate::convert::{
    Conversion, ConversionTable, DEFAULT_MAX_DEPTH, ScaleOp, default_table,
};
pub use crate::error::{Error, Result};
pub use crate::parser::parse_expression;
pub use crate::quantity::{Dimensions, Quantity};

/// Parse `expr` and express it in the unit shape of `target`, using the
/// built-in conversion table.
///
/// ```
/// use unitpath::convert;
///
/// let q = convert("1 m", "cm").unwrap();
/// assert_eq!(q.value(), 100.0);
/// assert_eq!(q.to_string(), "100 (cm)");
/// ```
pub fn convert(expr: &str, target: &str) -> Result<Quantity> {
    let from = parse_expression(expr)?;
    let to = parse_expression(target)?;
    default_table().convert(&from, &to)
}

/// Parse `expr` and rewrite it into an equivalent quantity of lower
/// symbolic complexity, using the built-in conversion table. Returns the
/// parsed quantity unchanged when nothing simpler is reachable.
///
/// ```
/// use unitpath::simplify;
///
/// let q = simplify("2 W/J").unwrap();
/// assert_eq!(q.to_string(), "2 (1 / s)");
/// ```
pub fn simplify(expr: &str) -> Result<Quantity> {
    let from = parse_expression(expr)?;
    Ok(default_table().simplify(&from))
}
