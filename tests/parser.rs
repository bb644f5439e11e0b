//! Parser equivalence oracles: each input must produce exactly the
//! tabulated value and dimension map, independent of whitespace and of
//! algebraically-equivalent grouping.

use unitpath::{Quantity, parse_expression};

fn check(input: &str, value: f64, dims: &[(&str, i32)]) {
    let parsed =
        parse_expression(input).unwrap_or_else(|e| panic!("`{input}` failed to parse: {e}"));
    let expected = Quantity::new(value, dims.iter().copied());
    assert_eq!(parsed, expected, "input `{input}`");
}

#[test]
fn bare_symbol() {
    check("a", 1.0, &[("a", 1)]);
}

#[test]
fn products_with_and_without_operators() {
    check("a * b", 1.0, &[("a", 1), ("b", 1)]);
    check("a* b", 1.0, &[("a", 1), ("b", 1)]);
    check("a*b", 1.0, &[("a", 1), ("b", 1)]);
    check("(a)*b", 1.0, &[("a", 1), ("b", 1)]);
    check("(a) * b", 1.0, &[("a", 1), ("b", 1)]);
}

#[test]
fn powers_bind_to_the_preceding_factor() {
    check("a b^2", 1.0, &[("a", 1), ("b", 2)]);
    check("a*b^2", 1.0, &[("a", 1), ("b", 2)]);
    check("a/b^2", 1.0, &[("a", 1), ("b", -2)]);
}

#[test]
fn division_applies_to_the_next_factor_only() {
    check("a/(b a)", 1.0, &[("b", -1)]);
    check("a/a a", 1.0, &[("a", 1)]);
    check("a/(a^2)", 1.0, &[("a", -1)]);
    check("a b/c c^2/b", 1.0, &[("a", 1), ("c", 1)]);
}

#[test]
fn numeric_coefficients() {
    check("a^2/(3b)", 1.0 / 3.0, &[("a", 2), ("b", -1)]);
    check("2.5 m", 2.5, &[("m", 1)]);
    check("2 3", 6.0, &[]);
}

#[test]
fn grouping_is_algebraically_transparent() {
    let plain = parse_expression("a b/c").unwrap();
    let grouped = parse_expression("((a) (b))/(c)").unwrap();
    assert_eq!(plain, grouped);
}

#[test]
fn unknown_symbols_carry_through() {
    check("florp/blag", 1.0, &[("florp", 1), ("blag", -1)]);
}
