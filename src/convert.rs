//! Conversion engine: a table of declared conversion edges and a bounded
//! depth-first search over quantity-shape space.
//!
//! One declared fact `1 U = k V` expands into four edges: `U → V`, `V → U`,
//! and the reciprocal pair `1/U → 1/V`, `1/V → 1/U`. The reciprocal edges
//! let the search rewrite symbols that appear in denominators without first
//! inverting the whole quantity.

use core::fmt;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::parser::parse_expression;
use crate::quantity::{Dimensions, Quantity};

/// Default bound on search recursion depth. The visited set already keeps
/// the search finite; the bound is a guard for pathological edge tables.
pub const DEFAULT_MAX_DEPTH: usize = 20;

const DEFAULT_FACTS: &str = include_str!("../data/units.txt");

static DEFAULT_TABLE: Lazy<ConversionTable> =
    Lazy::new(|| ConversionTable::from_facts(DEFAULT_FACTS));

/// The built-in conversion table, loaded once from the facts shipped with
/// the crate.
pub fn default_table() -> &'static ConversionTable {
    &DEFAULT_TABLE
}

/// Scalar step applied when an edge is traversed. The captured factor is
/// stored rather than a closure so edges stay inspectable and comparable.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScaleOp {
    Mul(f64),
    Div(f64),
}

impl ScaleOp {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ScaleOp::Mul(k) => x * k,
            ScaleOp::Div(k) => x / k,
        }
    }
}

impl fmt::Display for ScaleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleOp::Mul(k) => write!(f, "* {k}"),
            ScaleOp::Div(k) => write!(f, "/ {k}"),
        }
    }
}

/// A directed conversion edge between two unit literals.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conversion {
    from: Quantity,
    to: Quantity,
    op: ScaleOp,
}

impl Conversion {
    pub fn from(&self) -> &Quantity {
        &self.from
    }

    pub fn to(&self) -> &Quantity {
        &self.to
    }

    pub fn op(&self) -> ScaleOp {
        self.op
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from.dims(), self.to.dims(), self.op)
    }
}

/// Expand one declared fact into its four edges, validating the sides and
/// the factor. Returns a plain reason so callers can attach line numbers.
fn expand_fact(
    from: Quantity,
    to: Quantity,
    factor: f64,
) -> std::result::Result<[Conversion; 4], String> {
    if !from.is_unit_literal() {
        return Err(format!("`{}` is not a unit literal", from));
    }
    if !to.is_unit_literal() {
        return Err(format!("`{}` is not a unit literal", to));
    }
    if !factor.is_finite() || factor <= 0.0 {
        // A zero or negative factor has no usable inverse edge.
        return Err(format!("factor `{factor}` is not a positive real"));
    }

    let inv_from = Quantity::from_dims(1.0, from.dims().scaled(-1));
    let inv_to = Quantity::from_dims(1.0, to.dims().scaled(-1));
    Ok([
        Conversion {
            from: from.clone(),
            to: to.clone(),
            op: ScaleOp::Mul(factor),
        },
        Conversion {
            from: to,
            to: from,
            op: ScaleOp::Div(factor),
        },
        Conversion {
            from: inv_from.clone(),
            to: inv_to.clone(),
            op: ScaleOp::Div(factor),
        },
        Conversion {
            from: inv_to,
            to: inv_from,
            op: ScaleOp::Mul(factor),
        },
    ])
}

/// Parse one fact-file line. `Ok(None)` means the line is skipped (comment
/// or fewer than three tokens); tokens past the third are ignored.
fn fact_from_line(line: &str) -> std::result::Result<Option<(Quantity, Quantity, f64)>, String> {
    if line.trim_start().starts_with('#') {
        return Ok(None);
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Ok(None);
    }

    let from = parse_expression(tokens[0])
        .map_err(|e| format!("bad source expression `{}`: {e}", tokens[0]))?;
    let to = parse_expression(tokens[1])
        .map_err(|e| format!("bad target expression `{}`: {e}", tokens[1]))?;
    let factor: f64 = tokens[2]
        .parse()
        .map_err(|_| format!("bad factor `{}`", tokens[2]))?;
    Ok(Some((from, to, factor)))
}

/// An immutable collection of conversion edges plus the path search over
/// them. Edge order is declaration order and is observable: the search
/// visits neighbours in that order.
#[derive(Debug)]
pub struct ConversionTable {
    convs: Vec<Conversion>,
    max_depth: usize,
    rejects: Vec<Error>,
}

impl Default for ConversionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionTable {
    pub fn new() -> Self {
        Self {
            convs: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            rejects: Vec::new(),
        }
    }

    /// Replace the search depth bound (default [`DEFAULT_MAX_DEPTH`]).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build a table from fact text, skipping malformed lines. Each skipped
    /// line is recorded and available through [`ConversionTable::rejects`],
    /// matching the file format's comment semantics.
    pub fn from_facts(text: &str) -> Self {
        let mut table = Self::new();
        table.ingest(text, false).expect("lenient ingest never fails");
        table
    }

    /// Build a table from fact text, failing on the first malformed line.
    pub fn from_facts_strict(text: &str) -> Result<Self> {
        let mut table = Self::new();
        table.ingest(text, true)?;
        Ok(table)
    }

    /// Read a fact file, skipping malformed lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_facts(&fs::read_to_string(path)?))
    }

    /// Read a fact file, failing on the first malformed line.
    pub fn load_strict(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_facts_strict(&fs::read_to_string(path)?)
    }

    fn ingest(&mut self, text: &str, strict: bool) -> Result<()> {
        for (idx, line) in text.lines().enumerate() {
            let outcome = fact_from_line(line)
                .and_then(|fact| match fact {
                    None => Ok(None),
                    Some((from, to, factor)) => expand_fact(from, to, factor).map(Some),
                });
            match outcome {
                Ok(Some(edges)) => self.convs.extend(edges),
                Ok(None) => {}
                Err(reason) => {
                    let err = Error::malformed_fact(idx + 1, reason);
                    if strict {
                        return Err(err);
                    }
                    self.rejects.push(err);
                }
            }
        }
        Ok(())
    }

    /// Declare one fact: `1 from = factor to`. Both sides must be unit
    /// literals and the factor a positive real.
    pub fn add_fact(&mut self, from: Quantity, to: Quantity, factor: f64) -> Result<()> {
        let edges =
            expand_fact(from, to, factor).map_err(|reason| Error::malformed_fact(0, reason))?;
        self.convs.extend(edges);
        Ok(())
    }

    /// Number of edges (four per declared fact).
    pub fn len(&self) -> usize {
        self.convs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.convs.is_empty()
    }

    /// Malformed-fact errors recorded by the lenient loaders.
    pub fn rejects(&self) -> &[Error] {
        &self.rejects
    }

    /// Edges whose sides dimension-match the given filters, in declaration
    /// order. `None` matches any shape.
    pub fn matching<'t>(
        &'t self,
        from: Option<&Dimensions>,
        to: Option<&Dimensions>,
    ) -> Vec<&'t Conversion> {
        self.convs
            .iter()
            .filter(|c| from.is_none_or(|d| c.from.dims() == d))
            .filter(|c| to.is_none_or(|d| c.to.dims() == d))
            .collect()
    }

    /// The shape reached by applying `edge` to `state`:
    /// `state · (edge.to / edge.from)` in dimension space.
    fn step(state: &Dimensions, edge: &Conversion) -> Dimensions {
        state
            .combined(edge.to.dims(), 1)
            .combined(edge.from.dims(), -1)
    }

    /// Find a sequence of edges transforming `from` into `to`, or `None`
    /// when the shapes are unreachable from each other.
    ///
    /// The search is depth-first and deterministic: neighbours are proposed
    /// per sub-unit shape of the current state (in dimension insertion
    /// order) and per edge (in declaration order). A visited set of shapes,
    /// seeded with the start, breaks the cycles the reciprocal edge pairs
    /// would otherwise introduce. An empty path means the shapes already
    /// match.
    pub fn find_path(&self, from: &Dimensions, to: &Dimensions) -> Option<Vec<&Conversion>> {
        let mut seen = HashSet::new();
        seen.insert(from.clone());
        self.search(from, to, &mut seen, self.max_depth)
    }

    fn search<'t>(
        &'t self,
        state: &Dimensions,
        goal: &Dimensions,
        seen: &mut HashSet<Dimensions>,
        depth: usize,
    ) -> Option<Vec<&'t Conversion>> {
        if state == goal {
            return Some(Vec::new());
        }
        // A direct edge is always a one-step path.
        if let Some(edge) = self.matching(Some(state), Some(goal)).into_iter().next() {
            return Some(vec![edge]);
        }
        if depth == 0 {
            return None;
        }

        for shape in state.subunits() {
            for edge in self.matching(Some(&shape), None) {
                let next = Self::step(state, edge);
                if seen.insert(next.clone()) {
                    if let Some(mut rest) = self.search(&next, goal, seen, depth - 1) {
                        rest.insert(0, edge);
                        return Some(rest);
                    }
                }
            }
        }
        None
    }

    /// Express `from` in the target's unit shape.
    ///
    /// When the shapes already match, the value is unchanged and the
    /// carrier shape is replaced by the target's. Otherwise the discovered
    /// path's scalar steps are folded over the value in order.
    ///
    /// ```
    /// use unitpath::{default_table, parse_expression};
    ///
    /// let from = parse_expression("2 m").unwrap();
    /// let to = parse_expression("cm").unwrap();
    /// let out = default_table().convert(&from, &to).unwrap();
    /// assert_eq!(out.value(), 200.0);
    /// ```
    pub fn convert(&self, from: &Quantity, to: &Quantity) -> Result<Quantity> {
        if from.dims() == to.dims() {
            return Ok(Quantity::from_dims(from.value(), to.dims().clone()));
        }
        let path = self
            .find_path(from.dims(), to.dims())
            .ok_or_else(|| Error::NoPath {
                from: from.dims().to_string(),
                to: to.dims().to_string(),
            })?;
        let value = path.iter().fold(from.value(), |x, edge| edge.op.apply(x));
        Ok(Quantity::from_dims(value, to.dims().clone()))
    }

    /// Rewrite `from` into an equivalent quantity of lower symbolic
    /// complexity, or return it unchanged when no simpler shape is
    /// reachable.
    ///
    /// The descent is greedy: the first strictly-simpler shape discovered
    /// on a branch wins, with ties broken by edge declaration order. The
    /// result is not guaranteed minimal.
    pub fn simplify(&self, from: &Quantity) -> Quantity {
        let original = from.dims();
        let mut seen = HashSet::new();
        seen.insert(original.clone());
        let target = self.descend(original, original.complexity(), &mut seen, self.max_depth);
        if &target == original {
            return from.clone();
        }
        let carrier = Quantity::from_dims(1.0, target);
        // A failed search degrades to the input unchanged.
        self.convert(from, &carrier).unwrap_or_else(|_| from.clone())
    }

    fn descend(
        &self,
        state: &Dimensions,
        original: u32,
        seen: &mut HashSet<Dimensions>,
        depth: usize,
    ) -> Dimensions {
        if depth == 0 {
            return state.clone();
        }
        for shape in state.subunits() {
            for edge in self.matching(Some(&shape), None) {
                let next = Self::step(state, edge);
                if seen.insert(next.clone()) {
                    let deeper = self.descend(&next, original, seen, depth - 1);
                    if deeper.complexity() < next.complexity() {
                        return deeper;
                    }
                    if next.complexity() < original {
                        return next;
                    }
                }
            }
        }
        state.clone()
    }
}
