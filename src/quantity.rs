//! The value-and-dimension algebra.
//!
//! A [`Quantity`] is a scalar paired with a sparse, canonical exponent map
//! over opaque unit symbols ([`Dimensions`]). No physical meaning is attached
//! to a symbol; `m` and `banana` are equally valid atoms. All operations
//! produce fresh values and keep the map canonical (no zero exponents).

use core::fmt;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::Mul;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Largest number of exponent atoms considered by [`Dimensions::subunits`].
/// The enumeration is a powerset over the atoms, so 16 atoms bound it at
/// 65,536 candidate shapes; atoms beyond the cap are ignored.
const MAX_SUBUNIT_ATOMS: usize = 16;

/// Sparse signed-integer exponent vector over unit symbols.
///
/// Canonical form: zero exponents are never stored. Equality is by key set
/// and exponents; key order is not observable through `==`. Iteration order
/// is first-insertion order and is deterministic — every operation builds
/// its result left-operand-first, which keeps search traversal stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimensions(IndexMap<String, i32>);

impl Dimensions {
    /// The empty (dimensionless) shape.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exponent of `symbol`, `0` when absent.
    pub fn exponent(&self, symbol: &str) -> i32 {
        self.0.get(symbol).copied().unwrap_or(0)
    }

    /// True when no symbol carries a non-zero exponent.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(symbol, exponent)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Sum of absolute exponents; the simplification objective.
    pub fn complexity(&self) -> u32 {
        self.0.values().map(|e| e.unsigned_abs()).sum()
    }

    /// Add `exp` to the entry for `symbol`, dropping it when the result is
    /// zero.
    fn bump(&mut self, symbol: &str, exp: i32) {
        if exp == 0 {
            return;
        }
        match self.0.get_mut(symbol) {
            Some(slot) => {
                *slot += exp;
                if *slot == 0 {
                    self.0.shift_remove(symbol);
                }
            }
            None => {
                self.0.insert(symbol.to_string(), exp);
            }
        }
    }

    /// Pointwise `self + sign·other`, zero entries dropped.
    pub(crate) fn combined(&self, other: &Dimensions, sign: i32) -> Dimensions {
        let mut out = self.clone();
        for (sym, exp) in other.iter() {
            out.bump(sym, sign * exp);
        }
        out
    }

    /// Every exponent multiplied by `n`; `n == 0` yields the empty shape.
    pub(crate) fn scaled(&self, n: i32) -> Dimensions {
        if n == 0 {
            return Dimensions::empty();
        }
        Dimensions(self.0.iter().map(|(k, &v)| (k.clone(), v * n)).collect())
    }

    /// Every non-empty unit shape derivable by choosing a non-empty subset
    /// of this map's exponent atoms, deduplicated, in a deterministic order.
    ///
    /// An exponent atom is `(symbol, +1)` repeated for each unit of a
    /// positive exponent, or `(symbol, -1)` for each unit of a negative one.
    /// For `m^2/s` the atoms are `[(m,+1), (m,+1), (s,-1)]` and the shapes
    /// are `m`, `m^2`, `1/s`, `m/s`, `m^2/s`. The atom list is capped at
    /// [`MAX_SUBUNIT_ATOMS`]; atoms past the cap are ignored.
    pub fn subunits(&self) -> Vec<Dimensions> {
        let mut atoms: SmallVec<[(&str, i32); 8]> = SmallVec::new();
        'fill: for (sym, exp) in self.iter() {
            let sign = if exp > 0 { 1 } else { -1 };
            for _ in 0..exp.unsigned_abs() {
                if atoms.len() == MAX_SUBUNIT_ATOMS {
                    break 'fill;
                }
                atoms.push((sym, sign));
            }
        }

        let mut seen = HashSet::new();
        let mut shapes = Vec::new();
        for mask in 1u32..(1u32 << atoms.len()) {
            let mut shape = Dimensions::empty();
            for (i, (sym, sign)) in atoms.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    shape.bump(sym, *sign);
                }
            }
            if seen.insert(shape.clone()) {
                shapes.push(shape);
            }
        }
        shapes
    }

    /// Entries sorted by symbol, for order-insensitive hashing.
    fn sorted_entries(&self) -> SmallVec<[(&str, i32); 8]> {
        let mut entries: SmallVec<[(&str, i32); 8]> = self.iter().collect();
        entries.sort_unstable_by_key(|&(sym, _)| sym);
        entries
    }

    fn fmt_group(f: &mut fmt::Formatter<'_>, entries: &[(&str, i32)]) -> fmt::Result {
        if entries.len() > 1 {
            write!(f, "(")?;
        }
        for (i, (sym, exp)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match exp.unsigned_abs() {
                1 => write!(f, "{sym}")?,
                e => write!(f, "{sym}^{e}")?,
            }
        }
        if entries.len() > 1 {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Equal maps hash equally regardless of insertion order.
impl Hash for Dimensions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (sym, exp) in self.sorted_entries() {
            sym.hash(state);
            exp.hash(state);
        }
    }
}

/// Renders the unit part without a value: `m / s`, `(m kg) / s^2`, `1`.
impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positives: Vec<(&str, i32)> = self.iter().filter(|&(_, e)| e > 0).collect();
        let negatives: Vec<(&str, i32)> = self.iter().filter(|&(_, e)| e < 0).collect();

        if positives.is_empty() {
            write!(f, "1")?;
        } else {
            Self::fmt_group(f, &positives)?;
        }
        if !negatives.is_empty() {
            write!(f, " / ")?;
            Self::fmt_group(f, &negatives)?;
        }
        Ok(())
    }
}

/// A scalar value paired with a canonical dimension map.
///
/// Quantities are immutable value types; every operation returns a fresh
/// quantity. A *unit literal* is a quantity whose value is exactly `1`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantity {
    value: f64,
    dims: Dimensions,
}

impl Quantity {
    /// Build from a value and an exponent list. Zero exponents are dropped
    /// immediately; repeated symbols accumulate.
    pub fn new<S, I>(value: f64, exps: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, i32)>,
    {
        let mut dims = Dimensions::empty();
        for (sym, exp) in exps {
            dims.bump(sym.as_ref(), exp);
        }
        Self { value, dims }
    }

    /// A dimensionless quantity.
    pub fn scalar(value: f64) -> Self {
        Self {
            value,
            dims: Dimensions::empty(),
        }
    }

    /// The unit literal for a single symbol: value `1`, exponent `+1`.
    pub fn unit(symbol: impl AsRef<str>) -> Self {
        Self::new(1.0, [(symbol, 1)])
    }

    pub(crate) fn from_dims(value: f64, dims: Dimensions) -> Self {
        Self { value, dims }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// True when the value is exactly `1`.
    pub fn is_unit_literal(&self) -> bool {
        self.value == 1.0
    }

    /// Product: values multiply, exponents add pointwise.
    pub fn mul(&self, other: &Quantity) -> Quantity {
        Quantity {
            value: self.value * other.value,
            dims: self.dims.combined(&other.dims, 1),
        }
    }

    /// Quotient: values divide, exponents subtract pointwise. Fails when
    /// `other` has value zero.
    pub fn div(&self, other: &Quantity) -> Result<Quantity> {
        if other.value == 0.0 {
            return Err(Error::DivisionByZero);
        }
        Ok(Quantity {
            value: self.value / other.value,
            dims: self.dims.combined(&other.dims, -1),
        })
    }

    /// Integer power. `n == 0` yields the dimensionless unit `1`.
    pub fn powi(&self, n: i32) -> Quantity {
        Quantity {
            value: self.value.powi(n),
            dims: self.dims.scaled(n),
        }
    }

    /// Sum of absolute exponents.
    pub fn complexity(&self) -> u32 {
        self.dims.complexity()
    }

    /// The sub-unit decompositions of this quantity's shape, as unit
    /// literals. See [`Dimensions::subunits`].
    pub fn subunits(&self) -> Vec<Quantity> {
        self.dims
            .subunits()
            .into_iter()
            .map(|dims| Quantity { value: 1.0, dims })
            .collect()
    }
}

impl Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        Quantity::mul(self, rhs)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::mul(&self, &rhs)
    }
}

/// `value (numerator / denominator)`, e.g. `3.6 (km / h)`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(dims: &Dimensions) -> u64 {
        use std::hash::DefaultHasher;
        let mut h = DefaultHasher::new();
        dims.hash(&mut h);
        h.finish()
    }

    #[test]
    fn zero_exponents_dropped_on_construction() {
        let q = Quantity::new(2.0, [("m", 1), ("s", 0)]);
        assert_eq!(q.dims().len(), 1);
        assert_eq!(q.dims().exponent("s"), 0);
    }

    #[test]
    fn repeated_symbols_accumulate() {
        let q = Quantity::new(1.0, [("m", 1), ("m", 1), ("m", -2)]);
        assert!(q.dims().is_empty());
    }

    #[test]
    fn mul_cancels_to_canonical() {
        let speed = Quantity::new(4.0, [("m", 1), ("s", -1)]);
        let time = Quantity::new(2.0, [("s", 1)]);
        let dist = Quantity::mul(&speed, &time);
        assert_eq!(dist, Quantity::new(8.0, [("m", 1)]));
        assert_eq!(dist.dims().exponent("s"), 0);
    }

    #[test]
    fn div_negates_exponents() {
        let a = Quantity::unit("m");
        let b = Quantity::new(2.0, [("s", 2)]);
        let q = a.div(&b).unwrap();
        assert_eq!(q, Quantity::new(0.5, [("m", 1), ("s", -2)]));
    }

    #[test]
    fn div_by_zero_value_fails() {
        let a = Quantity::unit("m");
        let b = Quantity::scalar(0.0);
        assert!(matches!(a.div(&b), Err(Error::DivisionByZero)));
    }

    #[test]
    fn powi_zero_is_dimensionless_one() {
        let q = Quantity::new(3.0, [("m", 2), ("s", -1)]).powi(0);
        assert_eq!(q, Quantity::scalar(1.0));
    }

    #[test]
    fn powi_scales_exponents() {
        let q = Quantity::new(2.0, [("m", 1), ("s", -1)]).powi(3);
        assert_eq!(q, Quantity::new(8.0, [("m", 3), ("s", -3)]));
    }

    #[test]
    fn complexity_sums_absolute_exponents() {
        let q = Quantity::new(1.0, [("m", 2), ("s", -1)]);
        assert_eq!(q.complexity(), 3);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = Quantity::new(1.0, [("m", 1), ("s", -1)]);
        let b = Quantity::new(1.0, [("s", -1), ("m", 1)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(a.dims()), hash_of(b.dims()));
    }

    #[test]
    fn subunits_of_area_per_time() {
        let q = Quantity::new(1.0, [("m", 2), ("s", -1)]);
        let shapes = q.dims().subunits();
        let expect = |pairs: &[(&str, i32)]| {
            Quantity::new(1.0, pairs.iter().copied())
                .dims()
                .clone()
        };
        assert_eq!(
            shapes,
            vec![
                expect(&[("m", 1)]),
                expect(&[("m", 2)]),
                expect(&[("s", -1)]),
                expect(&[("m", 1), ("s", -1)]),
                expect(&[("m", 2), ("s", -1)]),
            ]
        );
    }

    #[test]
    fn subunits_excludes_dimensionless() {
        assert!(Dimensions::empty().subunits().is_empty());
        assert!(Quantity::scalar(3.0).subunits().is_empty());
    }

    #[test]
    fn subunits_caps_the_atom_list() {
        // 18 atoms; the final two s atoms fall past the cap, so shapes are
        // m^a / s^b with a in 0..=9 and b in 0..=7, minus the empty one.
        let q = Quantity::new(1.0, [("m", 9), ("s", -9)]);
        let shapes = q.dims().subunits();
        assert!(shapes.len() <= (1 << 16) - 1);
        assert_eq!(shapes.len(), 10 * 8 - 1);
        assert!(shapes.iter().all(|s| s.complexity() <= 16));
    }

    #[test]
    fn quantity_subunits_are_unit_literals() {
        let q = Quantity::new(9.0, [("m", 1), ("s", -1)]);
        let subs = q.subunits();
        assert_eq!(subs.len(), 3);
        assert!(subs.iter().all(Quantity::is_unit_literal));
    }

    #[test]
    fn display_simple() {
        assert_eq!(Quantity::new(5.0, [("m", 1)]).to_string(), "5 (m)");
    }

    #[test]
    fn display_quotient() {
        let q = Quantity::new(3.6, [("km", 1), ("h", -1)]);
        assert_eq!(q.to_string(), "3.6 (km / h)");
    }

    #[test]
    fn display_groups_multiple_factors() {
        let q = Quantity::new(1.0, [("m", 1), ("kg", 1), ("s", -2)]);
        assert_eq!(q.to_string(), "1 ((m kg) / s^2)");
    }

    #[test]
    fn display_reciprocal_and_dimensionless() {
        assert_eq!(Quantity::new(5.0, [("s", -2)]).to_string(), "5 (1 / s^2)");
        assert_eq!(Quantity::scalar(2.5).to_string(), "2.5 (1)");
    }
}
