use std::sync::Arc;

use axum::extract::State;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use storefront_api::{
    docstore::MemoryStore, exchange::FixedRate, routes::health::health_check, state::AppState,
};

#[tokio::test]
async fn health_check_reports_the_document_store() {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    let state = AppState::new(
        pool,
        Arc::new(MemoryStore::new()),
        Arc::new(FixedRate(Decimal::from(1000))),
    );

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Storefront up");
    let body = serde_json::to_value(&response.0).unwrap();
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["docstore"], "memory");
}
