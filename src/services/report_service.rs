use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::reports::{SalesReport, TopProductsReport},
    entity::{
        factura_detalle::{Column as DetalleCol, Entity as FacturaDetalle},
        facturas::{Column as FacturaCol, Entity as Facturas},
    },
    error::AppResult,
    models::EstadoFactura,
    report::{
        InvoiceReportRow, Periodo, SoldInvoice, SoldLine, render_invoice_report, report_filename,
        sales_by_period, top_products,
    },
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_TOP_PRODUCTS: usize = 6;

const INVOICE_REPORT_SQL: &str = r#"
SELECT to_char(f.fecha AT TIME ZONE 'UTC', 'YYYY-MM-DD HH24:MI') AS fecha,
       TRIM(COALESCE(NULLIF(TRIM(f.cliente_nombre), ''), NULLIF(TRIM(f.cliente_email), ''), 'Invitado')) AS cliente,
       (SELECT string_agg(d.producto_nombre || ' x ' || d.cantidad, ' | ' ORDER BY d.id)
          FROM factura_detalle d
         WHERE d.factura_id = f.id) AS productos,
       f.total AS total
  FROM facturas f
 WHERE f.estado IS NULL OR f.estado = 'PAGADA'
 ORDER BY f.fecha DESC, f.id DESC
"#;

/// A rendered CSV body and the filename to attach it as.
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

pub async fn invoice_csv(state: &AppState) -> AppResult<CsvExport> {
    let rows = sqlx::query_as::<_, InvoiceReportRow>(INVOICE_REPORT_SQL)
        .fetch_all(&state.pool)
        .await?;

    tracing::debug!(rows = rows.len(), "invoice report rendered");
    Ok(CsvExport {
        filename: report_filename(Utc::now().date_naive()),
        body: render_invoice_report(&rows),
    })
}

/// Paid invoices with their lines, for the statistics endpoints.
async fn sold_invoices(state: &AppState) -> AppResult<Vec<SoldInvoice>> {
    let paid = Condition::any()
        .add(FacturaCol::Estado.eq(EstadoFactura::Pagada.as_str()))
        .add(FacturaCol::Estado.is_null());

    let rows = Facturas::find()
        .filter(paid)
        .order_by_asc(FacturaCol::Fecha)
        .order_by_asc(FacturaCol::Id)
        .find_with_related(FacturaDetalle)
        .order_by_asc(DetalleCol::Id)
        .all(&state.orm)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(factura, lines)| SoldInvoice {
            fecha: factura.fecha.with_timezone(&Utc),
            lines: lines
                .into_iter()
                .map(|line| SoldLine {
                    producto_nombre: Some(line.producto_nombre),
                    cantidad: line.cantidad,
                })
                .collect(),
        })
        .collect())
}

pub async fn sales(state: &AppState, periodo: Periodo) -> AppResult<ApiResponse<SalesReport>> {
    let invoices = sold_invoices(state).await?;
    let items = sales_by_period(&invoices, periodo);
    let total = items.len();
    Ok(ApiResponse::success(
        "Ok",
        SalesReport { items },
        Some(Meta::total(total)),
    ))
}

pub async fn products_top(
    state: &AppState,
    limit: Option<usize>,
) -> AppResult<ApiResponse<TopProductsReport>> {
    let invoices = sold_invoices(state).await?;
    let items = top_products(&invoices, limit.unwrap_or(DEFAULT_TOP_PRODUCTS));
    let total = items.len();
    Ok(ApiResponse::success(
        "Ok",
        TopProductsReport { items },
        Some(Meta::total(total)),
    ))
}
