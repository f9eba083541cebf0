//! Shopping cart (carrito) snapshot.
//!
//! The storefront keeps the cart client-side; this is the same list-mutation
//! model as a value type, used to turn a cart into a checkout payload.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    dto::invoices::{DraftLine, InvoiceDraft},
    models::Producto,
    money::{checked_sum, line_subtotal, round_money},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub nombre: String,
    pub precio: Decimal,
    pub cantidad: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `producto`.
    pub fn add(&mut self, producto: &Producto) {
        match self.lines.iter_mut().find(|l| l.id == producto.id) {
            Some(line) => line.cantidad = line.cantidad.saturating_add(1),
            None => self.lines.push(CartLine {
                id: producto.id,
                nombre: producto.nombre.clone(),
                precio: producto.precio,
                cantidad: 1,
            }),
        }
    }

    /// Shift a line's quantity by `delta`; the line goes away at zero or below.
    pub fn change_quantity(&mut self, producto_id: i64, delta: i32) {
        if let Some(index) = self.lines.iter().position(|l| l.id == producto_id) {
            self.lines[index].cantidad = self.lines[index].cantidad.saturating_add(delta);
            if self.lines[index].cantidad <= 0 {
                self.lines.remove(index);
            }
        }
    }

    pub fn remove_one(&mut self, producto_id: i64) {
        self.change_quantity(producto_id, -1);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.cantidad)).sum()
    }

    /// `None` when the total overflows.
    pub fn total_price(&self) -> Option<Decimal> {
        let subtotals = self
            .lines
            .iter()
            .map(|l| line_subtotal(l.precio, l.cantidad))
            .collect::<Option<Vec<_>>>()?;
        checked_sum(subtotals).map(round_money)
    }

    /// Snapshot the cart into a checkout payload.
    pub fn to_draft(&self, tipo_cambio: Option<Decimal>) -> InvoiceDraft {
        let items = self
            .lines
            .iter()
            .map(|l| DraftLine {
                producto_id: Some(l.id),
                producto_nombre: Some(l.nombre.clone()),
                cantidad: Some(i64::from(l.cantidad)),
                precio_unit_ars: Some(l.precio),
                subtotal_ars: line_subtotal(l.precio, l.cantidad),
                ..DraftLine::default()
            })
            .collect();

        InvoiceDraft {
            tipo_cambio,
            total_ars: self.total_price(),
            items: Some(items),
            ..InvoiceDraft::default()
        }
    }
}
