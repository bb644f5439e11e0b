//! Algebraic laws of the quantity algebra, exercised through the parser so
//! the two stay in agreement.

use unitpath::{Quantity, parse_expression};

fn q(expr: &str) -> Quantity {
    parse_expression(expr).unwrap()
}

fn assert_canonical(quantity: &Quantity) {
    assert!(
        quantity.dims().iter().all(|(_, exp)| exp != 0),
        "zero exponent left in {quantity:?}"
    );
}

#[test]
fn multiplication_is_associative() {
    let (a, b, c) = (q("2 m"), q("3 s^2"), q("kg/m"));
    assert_eq!(a.mul(&b).mul(&c), a.mul(&b.mul(&c)));
}

#[test]
fn multiplication_is_commutative() {
    let (a, b) = (q("2 m/s"), q("5 kg"));
    assert_eq!(a.mul(&b), b.mul(&a));
}

#[test]
fn multiplying_by_the_inverse_cancels() {
    let a = q("4 m^2/s");
    let inverse = Quantity::scalar(1.0).div(&a).unwrap();
    let product = a.mul(&inverse);
    assert_eq!(product, Quantity::scalar(1.0));
    assert_canonical(&product);
}

#[test]
fn exponents_add_across_products_of_powers() {
    let a = q("2 m/s");
    assert_eq!(a.powi(2).mul(&a.powi(3)), a.powi(5));
    assert_eq!(a.powi(2).mul(&a.powi(-2)), a.powi(0));
}

#[test]
fn operations_preserve_canonical_form() {
    let (a, b) = (q("2 m s"), q("4 s m^2"));
    for result in [
        a.mul(&b),
        a.div(&b).unwrap(),
        a.powi(3),
        a.powi(0),
        b.div(&a).unwrap().mul(&a),
    ] {
        assert_canonical(&result);
    }
}

#[test]
fn equality_requires_value_and_dims() {
    assert_ne!(q("2 m"), q("3 m"));
    assert_ne!(q("2 m"), q("2 s"));
    assert_eq!(q("2 m"), q("2 m"));
}
