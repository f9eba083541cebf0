use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use storefront_api::{
    docstore::MemoryStore,
    dto::auth::Claims,
    exchange::{FixedRate, RateProvider},
    routes::create_app_router,
    state::AppState,
};
use tower::ServiceExt;

const TEST_SECRET: &str = "http-routes-test-secret";

struct DownRate;

#[async_trait]
impl RateProvider for DownRate {
    async fn current_rate(&self) -> anyhow::Result<Decimal> {
        anyhow::bail!("quote service unreachable")
    }
}

/// Router over a pool that never connects; only handlers that fail before
/// touching the database, or that use the document store, are exercised.
fn app_with(rates: Arc<dyn RateProvider>) -> Router {
    // SAFETY: every test in this file sets the same value.
    unsafe { std::env::set_var("JWT_SECRET", TEST_SECRET) };
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool");
    let state = AppState::new(pool, Arc::new(MemoryStore::new()), rates);
    create_app_router(state)
}

fn app() -> Router {
    app_with(Arc::new(FixedRate(Decimal::from(1000))))
}

fn token(user_id: i64, rol: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: format!("user{user_id}@example.com"),
        rol: rol.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {jwt}")
}

fn json_request(method: &str, uri: &str, body: Value, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn checkout_body() -> Value {
    json!({
        "tipo_cambio": 1000,
        "total_ars": 2500,
        "items": [
            { "producto_id": 1, "producto_nombre": "Mate", "cantidad": 2, "precio_unit_ars": 1000 },
            { "producto_id": 2, "producto_nombre": "Yerba", "cantidad": 1, "precio_unit_ars": 500 }
        ]
    })
}

#[tokio::test]
async fn empty_invoice_is_rejected() {
    let app = app();
    let (status, body) = send_json(
        &app,
        json_request("POST", "/facturas", json!({ "tipo_cambio": 1000, "items": [] }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("items is empty"));
}

#[tokio::test]
async fn relational_invoice_requires_a_positive_rate() {
    let app = app();
    let mut body = checkout_body();
    body["tipo_cambio"] = json!(0);
    let (status, _) = send_json(&app, json_request("POST", "/facturas", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = checkout_body();
    body.as_object_mut().unwrap().remove("tipo_cambio");
    let (status, _) = send_json(&app, json_request("POST", "/facturas", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/facturas")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cotizacion_reports_availability() {
    let (status, body) = send_json(&app(), get("/api/cotizacion")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["disponible"], true);
    assert_eq!(body["data"]["tipo_cambio"], json!(1000.0));

    let down = app_with(Arc::new(DownRate));
    let (status, body) = send_json(&down, get("/api/cotizacion")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["disponible"], false);
    assert!(body["data"]["tipo_cambio"].is_null());
}

#[tokio::test]
async fn document_invoice_lifecycle() {
    let app = app();
    let (status, created) =
        send_json(&app, json_request("POST", "/rtdb/facturas", checkout_body(), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["invoice_id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["factura"]["totalARS"], json!(2500.0));
    assert_eq!(created["data"]["factura"]["totalUSD"], json!(2.5));

    let (status, listed) = send_json(&app, get("/rtdb/facturas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["meta"]["total"], 1);

    let (status, pagadas) = send_json(&app, get("/rtdb/facturas/por-estado/pagada")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pagadas["data"][0]["id"], id.as_str());

    let admin = token(1, "admin");
    let (status, updated) = send_json(
        &app,
        json_request(
            "PATCH",
            &format!("/rtdb/facturas/{id}/estado"),
            json!({ "estado": "ANULADA" }),
            Some(&admin),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["estado"], "ANULADA");

    let (_, anuladas) = send_json(&app, get("/rtdb/facturas/por-estado/ANULADA")).await;
    assert_eq!(anuladas["data"].as_array().unwrap().len(), 1);

    let (status, rebuilt) = send_json(
        &app,
        json_request("POST", "/rtdb/indices/rebuild", json!({}), Some(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rebuilt["data"]["added"], 0);
    assert_eq!(rebuilt["data"]["removed"], 0);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/rtdb/facturas/{id}"))
        .header(header::AUTHORIZATION, &admin)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send_json(&app, get("/rtdb/facturas")).await;
    assert!(listed["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn document_csv_is_an_attachment() {
    let app = app();
    send(&app, json_request("POST", "/rtdb/facturas", checkout_body(), None)).await;

    let response = app.clone().oneshot(get("/rtdb/facturas.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"facturas-"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with('\u{FEFF}'));
    assert!(text.contains("ID,Fecha,Total_ARS"));
}

#[tokio::test]
async fn index_path_parameters_are_validated() {
    let app = app();
    let (status, _) = send_json(&app, get("/rtdb/facturas/por-fecha/10-05-2024")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, get("/rtdb/facturas/por-estado/PENDIENTE")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, get("/rtdb/facturas/por-fecha/2024-05-10")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_routes_check_the_token() {
    let app = app();

    let (status, _) = send_json(
        &app,
        json_request("POST", "/rtdb/indices/rebuild", json!({}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        json_request("POST", "/rtdb/indices/rebuild", json!({}), Some("Bearer garbage")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = token(2, "usuario");
    let (status, _) = send_json(
        &app,
        json_request("POST", "/rtdb/indices/rebuild", json!({}), Some(&user)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let product = json!({ "nombre": "Mate", "precio": 1500 });
    let (status, _) =
        send_json(&app, json_request("POST", "/api/productos", product.clone(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send_json(&app, json_request("POST", "/api/productos", product, Some(&user))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() {
    let (status, body) = send_json(&app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
}

#[tokio::test]
async fn usd_mismatch_is_reported_before_persisting() {
    let app = app();
    let mut body = checkout_body();
    body["total_usd"] = json!(Decimal::from_str("9.99").unwrap());
    let (status, body) = send_json(&app, json_request("POST", "/facturas", body, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("total_usd"));
}

#[tokio::test]
async fn oversized_prices_are_a_bad_request() {
    let app = app();
    let mut body = checkout_body();
    body["total_ars"] = Value::Null;
    body["items"][0]["precio_unit_ars"] = json!("50000000000000000000000000000");

    for uri in ["/facturas", "/rtdb/facturas"] {
        let (status, response) =
            send_json(&app, json_request("POST", uri, body.clone(), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            response["message"]
                .as_str()
                .unwrap()
                .contains("items[0].precio_unit_ars is out of range")
        );
    }
}
