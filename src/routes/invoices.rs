use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::{
    dto::invoices::{InvoiceCreated, InvoiceDraft, InvoiceList, InvoiceWithLines, UpdateInvoiceStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Factura,
    response::ApiResponse,
    routes::params::InvoiceListQuery,
    services::invoice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice).get(list_invoices))
        .route("/{id}", get(get_invoice))
        .route("/{id}/estado", patch(update_invoice_status))
}

#[utoipa::path(
    post,
    path = "/facturas",
    request_body = InvoiceDraft,
    responses(
        (status = 201, description = "Invoice persisted with all of its lines", body = ApiResponse<InvoiceCreated>),
        (status = 400, description = "Invalid payload, missing rate or totals that do not add up"),
        (status = 500, description = "Persistence failed, nothing was written")
    ),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    payload: Result<Json<InvoiceDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<InvoiceCreated>>)> {
    let Json(draft) = payload?;
    let resp = invoice_service::create_invoice(&state, user.as_ref(), draft).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/facturas",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("estado" = Option<String>, Query, description = "PAGADA | ANULADA"),
        ("q" = Option<String>, Query, description = "Invoice id substring"),
        ("sort_order" = Option<String>, Query, description = "asc | desc by fecha"),
    ),
    responses(
        (status = 200, description = "List invoices", body = ApiResponse<InvoiceList>)
    ),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<ApiResponse<InvoiceList>>> {
    let resp = invoice_service::list_invoices(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/facturas/{id}",
    params(("id" = i64, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice with lines", body = ApiResponse<InvoiceWithLines>),
        (status = 404, description = "Invoice not found")
    ),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<InvoiceWithLines>>> {
    let resp = invoice_service::get_invoice(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/facturas/{id}/estado",
    params(("id" = i64, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Factura>),
        (status = 400, description = "Invoice already has that status"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn update_invoice_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateInvoiceStatusRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Factura>>> {
    let Json(payload) = payload?;
    let resp = invoice_service::set_status(&state, &user, id, payload.estado).await?;
    Ok(Json(resp))
}
