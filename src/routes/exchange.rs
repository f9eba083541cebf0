use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::reports::Cotizacion,
    exchange::quote_or_none,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/cotizacion", get(cotizacion))
}

/// Current ARS per USD; `disponible` is false when the quote service failed.
#[utoipa::path(
    get,
    path = "/api/cotizacion",
    responses(
        (status = 200, description = "Exchange rate", body = ApiResponse<Cotizacion>)
    ),
    tag = "Exchange"
)]
pub async fn cotizacion(State(state): State<AppState>) -> Json<ApiResponse<Cotizacion>> {
    let tipo_cambio = quote_or_none(state.rates.as_ref()).await;
    let data = Cotizacion {
        disponible: tipo_cambio.is_some(),
        tipo_cambio,
    };
    Json(ApiResponse::success("Ok", data, Some(Meta::empty())))
}
