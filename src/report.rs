//! CSV rendering and sales statistics for invoice reports.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::FacturaDoc;

/// Prepended so spreadsheet tools detect UTF-8.
pub const BOM: &str = "\u{FEFF}";

pub const INVOICE_REPORT_HEADER: [&str; 4] = ["fecha", "cliente", "productos", "total"];

pub const DOCUMENT_REPORT_HEADER: [&str; 9] = [
    "ID",
    "Fecha",
    "Total_ARS",
    "Total_USD",
    "Tipo_Cambio",
    "Estado",
    "Cliente_Email",
    "Cliente_Nombre",
    "Detalle",
];

pub const UNNAMED_PRODUCT: &str = "Producto sin nombre";

/// Quote a CSV field when it contains a quote, comma, pipe or line break.
pub fn escape_field(value: &str) -> String {
    if value.contains(['"', ',', '|', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f.as_ref())).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

/// One row of the relational invoice report, aggregated by the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceReportRow {
    pub fecha: String,
    pub cliente: String,
    pub productos: Option<String>,
    pub total: Decimal,
}

pub fn render_invoice_report(rows: &[InvoiceReportRow]) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, &INVOICE_REPORT_HEADER);
    for row in rows {
        push_row(
            &mut out,
            &[
                row.fecha.clone(),
                row.cliente.clone(),
                row.productos.clone().unwrap_or_default(),
                money(row.total),
            ],
        );
    }
    out
}

pub fn render_document_report(facturas: &[FacturaDoc]) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, &DOCUMENT_REPORT_HEADER);
    for f in facturas {
        let fecha = DateTime::from_timestamp_millis(f.ts)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        push_row(
            &mut out,
            &[
                f.id.clone(),
                fecha,
                money(f.total_ars),
                f.total_usd.map(money).unwrap_or_default(),
                f.tipo_cambio.map(|r| r.normalize().to_string()).unwrap_or_default(),
                f.estado.to_string(),
                f.cliente_email.clone().unwrap_or_default(),
                f.cliente_nombre.clone().unwrap_or_default(),
                document_detail(f),
            ],
        );
    }
    out
}

/// `"{nombre} x{cantidad} @{unit} = {subtotal}"` per item, joined by `" | "`.
pub fn document_detail(factura: &FacturaDoc) -> String {
    factura
        .items
        .iter()
        .map(|it| {
            let nombre = it
                .producto_nombre
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("(sin nombre)");
            let subtotal = it
                .subtotal_ars
                .unwrap_or_else(|| it.precio_unitario * Decimal::from(it.cantidad));
            format!(
                "{nombre} x{} @{} = {}",
                it.cantidad,
                money(it.precio_unitario),
                money(subtotal)
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn report_filename(today: NaiveDate) -> String {
    format!("facturas-{}.csv", today.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Periodo {
    #[default]
    Dia,
    Semana,
    Mes,
}

impl Periodo {
    /// Grouping key: the day, the Sunday that starts the week, or `YYYY-MM`.
    pub fn key(&self, fecha: DateTime<Utc>) -> String {
        let day = fecha.date_naive();
        match self {
            Periodo::Dia => day.format("%Y-%m-%d").to_string(),
            Periodo::Semana => {
                let offset = i64::from(day.weekday().num_days_from_sunday());
                (day - Duration::days(offset)).format("%Y-%m-%d").to_string()
            }
            Periodo::Mes => format!("{}-{:02}", day.year(), day.month()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SoldLine {
    pub producto_nombre: Option<String>,
    pub cantidad: i32,
}

#[derive(Debug, Clone)]
pub struct SoldInvoice {
    pub fecha: DateTime<Utc>,
    pub lines: Vec<SoldLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeriodSales {
    pub periodo: String,
    pub ventas: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductUnits {
    pub producto: String,
    pub unidades: i64,
}

pub fn sales_by_period(invoices: &[SoldInvoice], periodo: Periodo) -> Vec<PeriodSales> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for invoice in invoices {
        *counts.entry(periodo.key(invoice.fecha)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(periodo, ventas)| PeriodSales { periodo, ventas })
        .collect()
}

pub fn top_products(invoices: &[SoldInvoice], limit: usize) -> Vec<ProductUnits> {
    let mut units: HashMap<String, i64> = HashMap::new();
    for line in invoices.iter().flat_map(|i| &i.lines) {
        if line.cantidad <= 0 {
            continue;
        }
        let name = line
            .producto_nombre
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_PRODUCT);
        *units.entry(name.to_string()).or_default() += i64::from(line.cantidad);
    }

    let mut ranked: Vec<ProductUnits> = units
        .into_iter()
        .map(|(producto, unidades)| ProductUnits { producto, unidades })
        .collect();
    ranked.sort_by(|a, b| b.unidades.cmp(&a.unidades).then_with(|| a.producto.cmp(&b.producto)));
    ranked.truncate(limit);
    ranked
}
