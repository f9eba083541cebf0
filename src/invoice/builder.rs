//! Validation and total reconciliation for checkout payloads.
//!
//! The builder is the only place where invoice amounts are computed. Both
//! persistence paths store what it returns, so for every accepted invoice
//! `total_ars == Σ subtotal_ars` and `total_usd == round(total_ars / tipo_cambio)`,
//! with `tipo_cambio` already at its stored scale. Amounts that would not fit
//! their columns are rejected here rather than by the database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    dto::invoices::{DraftLine, InvoiceDraft},
    error::AppError,
    models::EstadoFactura,
    money::{approx_eq, checked_sum, line_subtotal, round_money, round_rate, to_usd},
};

pub const DEFAULT_PRODUCT_NAME: &str = "Producto";

/// Largest unit price a `NUMERIC(14, 2)` column holds.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);
/// Largest subtotal or total a `NUMERIC(18, 2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);
/// Largest rate a `NUMERIC(14, 4)` column holds.
pub const MAX_RATE: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 4);

/// Whether an exchange rate must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatePolicy {
    /// Relational checkout: no invoice without a rate.
    Required,
    /// Document-store checkout: USD figures become null without a rate.
    Optional,
}

#[derive(Debug, Error, PartialEq)]
pub enum InvoiceError {
    #[error("invalid payload: items is empty")]
    EmptyItems,
    #[error("invalid payload: tipo_cambio is required")]
    MissingRate,
    #[error("invalid payload: tipo_cambio must be greater than 0")]
    NonPositiveRate,
    #[error("item {index} must have a valid producto_id")]
    InvalidProductId { index: usize },
    #[error("item {index} must have cantidad greater than 0")]
    InvalidQuantity { index: usize },
    #[error("item {index} must have precio_unit_ars greater than or equal to 0")]
    InvalidPrice { index: usize },
    #[error("item {index}: subtotal_ars {given} does not match {expected}")]
    SubtotalMismatch {
        index: usize,
        given: Decimal,
        expected: Decimal,
    },
    #[error("total_ars {given} does not match the sum of item subtotals {expected}")]
    TotalMismatch { given: Decimal, expected: Decimal },
    #[error("total_usd {given} does not match {expected}")]
    UsdMismatch { given: Decimal, expected: Decimal },
    #[error("invalid fecha {0}")]
    InvalidDate(String),
    #[error("{field} is out of range")]
    AmountOutOfRange { field: String },
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClienteInfo {
    pub id: Option<i64>,
    pub nombre: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLine {
    pub producto_id: i64,
    pub producto_nombre: String,
    pub cantidad: i32,
    pub precio_unit_ars: Decimal,
    pub subtotal_ars: Decimal,
    pub precio_unit_usd: Option<Decimal>,
    pub subtotal_usd: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltInvoice {
    pub fecha: DateTime<Utc>,
    pub cliente: ClienteInfo,
    pub tipo_cambio: Option<Decimal>,
    pub total_ars: Decimal,
    pub total_usd: Option<Decimal>,
    pub estado: EstadoFactura,
    pub lines: Vec<BuiltLine>,
}

impl BuiltInvoice {
    /// Rate and USD total, for stores that cannot persist an unrated invoice.
    pub fn rated(&self) -> Result<(Decimal, Decimal), InvoiceError> {
        match (self.tipo_cambio, self.total_usd) {
            (Some(rate), Some(total_usd)) => Ok((rate, total_usd)),
            _ => Err(InvoiceError::MissingRate),
        }
    }
}

pub fn build(
    draft: &InvoiceDraft,
    policy: RatePolicy,
    now: DateTime<Utc>,
) -> Result<BuiltInvoice, InvoiceError> {
    let items = match draft.items.as_deref() {
        Some(items) if !items.is_empty() => items,
        _ => return Err(InvoiceError::EmptyItems),
    };

    // Every USD figure is derived from the rate as it will be stored.
    let tipo_cambio = match (draft.tipo_cambio.map(round_rate), policy) {
        (Some(rate), _) if rate <= Decimal::ZERO => return Err(InvoiceError::NonPositiveRate),
        (Some(rate), _) if rate > MAX_RATE => return Err(out_of_range("tipo_cambio")),
        (Some(rate), _) => Some(rate),
        (None, RatePolicy::Required) => return Err(InvoiceError::MissingRate),
        (None, RatePolicy::Optional) => None,
    };

    let lines = items
        .iter()
        .enumerate()
        .map(|(index, line)| build_line(index, line, tipo_cambio))
        .collect::<Result<Vec<_>, _>>()?;

    let total_ars = checked_sum(lines.iter().map(|l| l.subtotal_ars))
        .map(round_money)
        .filter(|total| *total <= MAX_AMOUNT)
        .ok_or_else(|| out_of_range("total_ars"))?;
    if let Some(given) = draft.total_ars.or(draft.total) {
        if !approx_eq(given, total_ars) {
            return Err(InvoiceError::TotalMismatch {
                given,
                expected: total_ars,
            });
        }
    }

    let total_usd = convert(total_ars, tipo_cambio, MAX_AMOUNT, || "total_usd".to_string())?;
    match (draft.total_usd, total_usd) {
        (Some(given), Some(expected)) if !approx_eq(given, expected) => {
            return Err(InvoiceError::UsdMismatch { given, expected });
        }
        (Some(_), None) => {
            tracing::debug!("total_usd ignored: no exchange rate");
        }
        _ => {}
    }

    let fecha = match draft.fecha.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| InvoiceError::InvalidDate(raw.to_string()))?,
        None => now,
    };

    Ok(BuiltInvoice {
        fecha,
        cliente: ClienteInfo {
            id: draft.cliente_id,
            nombre: non_blank(draft.cliente_nombre.as_deref()),
            email: non_blank(draft.cliente_email.as_deref()),
        },
        tipo_cambio,
        total_ars,
        total_usd,
        estado: EstadoFactura::Pagada,
        lines,
    })
}

fn build_line(
    index: usize,
    line: &DraftLine,
    tipo_cambio: Option<Decimal>,
) -> Result<BuiltLine, InvoiceError> {
    let producto_id = line
        .producto_id
        .ok_or(InvoiceError::InvalidProductId { index })?;
    let cantidad = line
        .cantidad
        .and_then(|c| i32::try_from(c).ok())
        .filter(|c| *c > 0)
        .ok_or(InvoiceError::InvalidQuantity { index })?;
    let precio_unit_ars = line
        .precio_unit_ars
        .filter(|p| *p >= Decimal::ZERO)
        .map(round_money)
        .ok_or(InvoiceError::InvalidPrice { index })?;
    if precio_unit_ars > MAX_UNIT_PRICE {
        return Err(out_of_range(format!("items[{index}].precio_unit_ars")));
    }

    let subtotal_ars = line_subtotal(precio_unit_ars, cantidad)
        .filter(|subtotal| *subtotal <= MAX_AMOUNT)
        .ok_or_else(|| out_of_range(format!("items[{index}].subtotal_ars")))?;
    if let Some(given) = line.subtotal_ars {
        if !approx_eq(given, subtotal_ars) {
            return Err(InvoiceError::SubtotalMismatch {
                index,
                given,
                expected: subtotal_ars,
            });
        }
    }

    Ok(BuiltLine {
        producto_id,
        producto_nombre: non_blank(line.producto_nombre.as_deref())
            .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
        cantidad,
        precio_unit_ars,
        subtotal_ars,
        precio_unit_usd: convert(precio_unit_ars, tipo_cambio, MAX_UNIT_PRICE, || {
            format!("items[{index}].precio_unit_usd")
        })?,
        subtotal_usd: convert(subtotal_ars, tipo_cambio, MAX_AMOUNT, || {
            format!("items[{index}].subtotal_usd")
        })?,
    })
}

/// USD figure for `ars`, `None` without a rate.
fn convert(
    ars: Decimal,
    tipo_cambio: Option<Decimal>,
    max: Decimal,
    field: impl FnOnce() -> String,
) -> Result<Option<Decimal>, InvoiceError> {
    let Some(rate) = tipo_cambio else {
        return Ok(None);
    };
    to_usd(ars, rate)
        .filter(|usd| *usd <= max)
        .map(Some)
        .ok_or_else(|| out_of_range(field()))
}

fn out_of_range(field: impl Into<String>) -> InvoiceError {
    InvoiceError::AmountOutOfRange {
        field: field.into(),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
