use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use storefront_api::{
    cart::Cart,
    invoice::{RatePolicy, build},
    models::Producto,
};

fn producto(id: i64, nombre: &str, precio: &str) -> Producto {
    Producto {
        id,
        nombre: nombre.to_string(),
        descripcion: None,
        precio: Decimal::from_str(precio).unwrap(),
        stock: 10,
        imagen: None,
        created_at: Utc::now(),
    }
}

#[test]
fn adding_the_same_product_twice_increments_quantity() {
    let mate = producto(1, "Mate", "1500.50");
    let yerba = producto(2, "Yerba", "4300");

    let mut cart = Cart::new();
    assert!(cart.is_empty());
    cart.add(&mate);
    cart.add(&yerba);
    cart.add(&mate);

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.lines()[0].cantidad, 2);
    assert_eq!(cart.total_quantity(), 3);
    assert_eq!(cart.total_price(), Some(Decimal::from_str("7301.00").unwrap()));
}

#[test]
fn quantity_changes_remove_lines_at_zero() {
    let mate = producto(1, "Mate", "100");
    let mut cart = Cart::new();
    cart.add(&mate);
    cart.change_quantity(1, 2);
    assert_eq!(cart.lines()[0].cantidad, 3);

    cart.remove_one(1);
    assert_eq!(cart.lines()[0].cantidad, 2);

    cart.change_quantity(1, -5);
    assert!(cart.is_empty());

    // Unknown ids are ignored.
    cart.change_quantity(99, 1);
    assert!(cart.is_empty());
}

#[test]
fn clear_empties_the_cart() {
    let mut cart = Cart::new();
    cart.add(&producto(1, "Mate", "100"));
    cart.clear();
    assert!(cart.is_empty());
    assert_eq!(cart.total_price(), Some(Decimal::ZERO));
}

#[test]
fn cart_draft_is_accepted_by_the_builder() {
    let mut cart = Cart::new();
    cart.add(&producto(1, "Mate", "1500.50"));
    cart.add(&producto(2, "Termo", "52999.99"));
    cart.add(&producto(1, "Mate", "1500.50"));

    let draft = cart.to_draft(Some(Decimal::from(1000)));
    let built = build(&draft, RatePolicy::Required, Utc::now()).unwrap();

    assert_eq!(Some(built.total_ars), cart.total_price());
    assert_eq!(built.lines.len(), 2);
    assert_eq!(built.lines[0].cantidad, 2);
    assert_eq!(built.total_usd, Some(Decimal::from_str("56.00").unwrap()));
}
