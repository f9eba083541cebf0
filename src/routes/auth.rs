use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Usuario,
    response::ApiResponse,
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/usuarios", post(register))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<Usuario>),
        (status = 400, description = "Invalid payload or email already registered"),
        (status = 403, description = "Only an admin may assign another role")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    actor: Option<AuthUser>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Usuario>>)> {
    let Json(payload) = payload?;
    let resp = register_user(&state.pool, actor.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let Json(payload) = payload?;
    let resp = login_user(&state.pool, payload).await?;
    Ok(Json(resp))
}
