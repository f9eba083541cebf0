use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{delete, get, patch, post},
};
use chrono::{NaiveDate, Utc};

use crate::{
    dto::invoices::{
        DocumentInvoiceCreated, DocumentInvoiceList, IndexRebuild, InvoiceDraft,
        UpdateInvoiceStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{EstadoFactura, FacturaDoc},
    report::report_filename,
    response::{ApiResponse, Meta},
    routes::reports::csv_attachment,
    services::{document_invoice_service, report_service::CsvExport},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/facturas", post(create_invoice).get(list_invoices))
        .route("/facturas.csv", get(export_csv))
        .route("/facturas/por-fecha/{dia}", get(list_by_day))
        .route("/facturas/por-estado/{estado}", get(list_by_status))
        .route("/facturas/{id}/estado", patch(update_status))
        .route("/facturas/{id}", delete(delete_invoice))
        .route("/indices/rebuild", post(rebuild_indexes))
}

fn listing(items: Vec<FacturaDoc>) -> Json<ApiResponse<DocumentInvoiceList>> {
    let total = items.len();
    Json(ApiResponse::success(
        "Ok",
        DocumentInvoiceList { items },
        Some(Meta::total(total)),
    ))
}

#[utoipa::path(
    post,
    path = "/rtdb/facturas",
    request_body = InvoiceDraft,
    responses(
        (status = 201, description = "Record and indexes written in one update", body = ApiResponse<DocumentInvoiceCreated>),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Document invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    payload: Result<Json<InvoiceDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<DocumentInvoiceCreated>>)> {
    let Json(draft) = payload?;
    let factura = document_invoice_service::create(
        state.docs.as_ref(),
        state.rates.as_ref(),
        user.as_ref(),
        draft,
    )
    .await?;
    let data = DocumentInvoiceCreated {
        invoice_id: factura.id.clone(),
        factura,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Invoice created", data, Some(Meta::empty()))),
    ))
}

#[utoipa::path(
    get,
    path = "/rtdb/facturas",
    responses(
        (status = 200, description = "All invoices, newest first", body = ApiResponse<DocumentInvoiceList>)
    ),
    tag = "Document invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DocumentInvoiceList>>> {
    let items = document_invoice_service::list(state.docs.as_ref()).await?;
    Ok(listing(items))
}

#[utoipa::path(
    get,
    path = "/rtdb/facturas.csv",
    responses(
        (status = 200, description = "All invoices as CSV", content_type = "text/csv", body = String)
    ),
    tag = "Document invoices"
)]
pub async fn export_csv(State(state): State<AppState>) -> AppResult<Response> {
    let body = document_invoice_service::export_csv(state.docs.as_ref()).await?;
    Ok(csv_attachment(CsvExport {
        filename: report_filename(Utc::now().date_naive()),
        body,
    }))
}

#[utoipa::path(
    get,
    path = "/rtdb/facturas/por-fecha/{dia}",
    params(("dia" = String, Path, description = "Day as YYYY-MM-DD")),
    responses(
        (status = 200, description = "Invoices created that day", body = ApiResponse<DocumentInvoiceList>),
        (status = 400, description = "Malformed day")
    ),
    tag = "Document invoices"
)]
pub async fn list_by_day(
    State(state): State<AppState>,
    Path(dia): Path<String>,
) -> AppResult<Json<ApiResponse<DocumentInvoiceList>>> {
    let day = NaiveDate::parse_from_str(&dia, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("invalid day {dia:?}, expected YYYY-MM-DD")))?;
    let items = document_invoice_service::list_by_day(state.docs.as_ref(), day).await?;
    Ok(listing(items))
}

#[utoipa::path(
    get,
    path = "/rtdb/facturas/por-estado/{estado}",
    params(("estado" = String, Path, description = "PAGADA | ANULADA")),
    responses(
        (status = 200, description = "Invoices with that status", body = ApiResponse<DocumentInvoiceList>),
        (status = 400, description = "Unknown status")
    ),
    tag = "Document invoices"
)]
pub async fn list_by_status(
    State(state): State<AppState>,
    Path(estado): Path<String>,
) -> AppResult<Json<ApiResponse<DocumentInvoiceList>>> {
    let estado = estado.parse::<EstadoFactura>().map_err(AppError::BadRequest)?;
    let items = document_invoice_service::list_by_status(state.docs.as_ref(), estado).await?;
    Ok(listing(items))
}

#[utoipa::path(
    patch,
    path = "/rtdb/facturas/{id}/estado",
    params(("id" = String, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Status and status index updated", body = ApiResponse<FacturaDoc>),
        (status = 400, description = "Invoice already has that status"),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Document invoices"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInvoiceStatusRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<FacturaDoc>>> {
    ensure_admin(&user)?;
    let Json(payload) = payload?;
    let factura =
        document_invoice_service::set_status(state.docs.as_ref(), &id, payload.estado).await?;
    Ok(Json(ApiResponse::success(
        "Status updated",
        factura,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/rtdb/facturas/{id}",
    params(("id" = String, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Record and index entries removed"),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Document invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    document_invoice_service::delete(state.docs.as_ref(), &id).await?;
    tracing::info!(factura_id = %id, user_id = user.user_id, "document invoice deleted");
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/rtdb/indices/rebuild",
    responses(
        (status = 200, description = "Indexes recomputed from the records", body = ApiResponse<IndexRebuild>)
    ),
    security(("bearer_auth" = [])),
    tag = "Document invoices"
)]
pub async fn rebuild_indexes(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<IndexRebuild>>> {
    ensure_admin(&user)?;
    let result = document_invoice_service::rebuild_indexes(state.docs.as_ref()).await?;
    Ok(Json(ApiResponse::success(
        "Indexes rebuilt",
        result,
        Some(Meta::empty()),
    )))
}
