use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod auth;
pub mod doc;
pub mod exchange;
pub mod health;
pub mod invoices;
pub mod params;
pub mod products;
pub mod reports;
pub mod rtdb_invoices;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/productos", products::router())
        .merge(auth::router())
        .merge(exchange::router())
}

/// Every route plus docs and the JSON 404 fallback, bound to `state`.
pub fn create_app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest("/facturas", invoices::router())
        .nest("/reportes", reports::router())
        .nest("/rtdb", rtdb_invoices::router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
