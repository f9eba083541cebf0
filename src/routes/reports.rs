use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    dto::reports::{SalesQuery, SalesReport, TopProductsQuery, TopProductsReport},
    error::AppResult,
    response::ApiResponse,
    services::report_service::{self, CsvExport},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/facturas.csv", get(invoice_csv))
        .route("/ventas", get(sales))
        .route("/productos-top", get(top_products))
}

/// Attach a rendered report as a CSV download.
pub(crate) fn csv_attachment(export: CsvExport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/reportes/facturas.csv",
    responses(
        (status = 200, description = "Paid invoices as CSV", content_type = "text/csv", body = String)
    ),
    tag = "Reports"
)]
pub async fn invoice_csv(State(state): State<AppState>) -> AppResult<Response> {
    let export = report_service::invoice_csv(&state).await?;
    Ok(csv_attachment(export))
}

#[utoipa::path(
    get,
    path = "/reportes/ventas",
    params(("periodo" = Option<String>, Query, description = "dia | semana | mes, default dia")),
    responses(
        (status = 200, description = "Invoice count per period", body = ApiResponse<SalesReport>)
    ),
    tag = "Reports"
)]
pub async fn sales(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = report_service::sales(&state, query.periodo.unwrap_or_default()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reportes/productos-top",
    params(("limit" = Option<usize>, Query, description = "How many products, default 6")),
    responses(
        (status = 200, description = "Best selling products by units", body = ApiResponse<TopProductsReport>)
    ),
    tag = "Reports"
)]
pub async fn top_products(
    State(state): State<AppState>,
    Query(query): Query<TopProductsQuery>,
) -> AppResult<Json<ApiResponse<TopProductsReport>>> {
    let resp = report_service::products_top(&state, query.limit).await?;
    Ok(Json(resp))
}
