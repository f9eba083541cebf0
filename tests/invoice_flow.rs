use std::{str::FromStr, sync::Arc};

use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Statement};
use serde_json::json;
use storefront_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    docstore::MemoryStore,
    dto::{
        auth::{LoginRequest, RegisterRequest},
        invoices::InvoiceDraft,
        products::CreateProductRequest,
    },
    error::AppError,
    exchange::FixedRate,
    middleware::auth::AuthUser,
    models::EstadoFactura,
    money::to_usd,
    report::{BOM, Periodo},
    routes::params::InvoiceListQuery,
    services::{auth_service, invoice_service, product_service, report_service},
    state::AppState,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

fn admin() -> AuthUser {
    AuthUser {
        user_id: 1,
        email: "admin@example.com".into(),
        role: "admin".into(),
    }
}

// Single flow: the tables are truncated at the start, so the steps must not run concurrently.
#[tokio::test]
async fn invoice_persistence_reporting_and_auth_flow() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;

    checkout_persists_header_and_lines(&state).await?;
    failed_line_rolls_back_the_header(&state).await?;
    csv_and_stats_only_count_paid_invoices(&state).await?;
    products_require_valid_fields(&state).await?;
    registration_and_login(&state).await?;
    Ok(())
}

async fn checkout_persists_header_and_lines(state: &AppState) -> anyhow::Result<()> {
    let draft: InvoiceDraft = serde_json::from_value(json!({
        "tipo_cambio": 1000,
        "cliente_nombre": "Ana, \"la del kiosco\"",
        "total_ars": 2500,
        "items": [
            { "producto_id": 1, "producto_nombre": "Mate", "cantidad": 2, "precio_unit_ars": 1000 },
            { "producto_id": 2, "producto_nombre": "Yerba", "cantidad": 1, "precio_unit_ars": 500 }
        ]
    }))?;

    let created = invoice_service::create_invoice(state, None, draft)
        .await?
        .data
        .unwrap();
    assert_eq!(created.total_ars, dec("2500"));
    assert_eq!(created.total_usd, Some(dec("2.50")));

    let fetched = invoice_service::get_invoice(state, created.invoice_id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.factura.estado, EstadoFactura::Pagada);
    assert_eq!(fetched.factura.tipo_cambio, dec("1000"));
    assert_eq!(fetched.items.len(), 2);
    // subtotal_ars comes from the generated column.
    assert_eq!(fetched.items[0].subtotal_ars, dec("2000"));
    assert_eq!(fetched.items[0].subtotal_usd, dec("2.00"));
    let sum: Decimal = fetched.items.iter().map(|d| d.subtotal_ars).sum();
    assert_eq!(sum, fetched.factura.total_ars);

    let listed = invoice_service::list_invoices(
        state,
        InvoiceListQuery {
            q: Some(created.invoice_id.to_string()),
            ..InvoiceListQuery::default()
        },
    )
    .await?;
    assert!(
        listed
            .data
            .unwrap()
            .items
            .iter()
            .any(|f| f.id == created.invoice_id)
    );

    // A rate finer than the column is stored as used for the USD figures.
    let draft: InvoiceDraft = serde_json::from_value(json!({
        "tipo_cambio": "1234.56785",
        "items": [{ "producto_id": 1, "producto_nombre": "Mate", "cantidad": 3, "precio_unit_ars": "333333.33" }]
    }))?;
    let fine_rate = invoice_service::create_invoice(state, None, draft)
        .await?
        .data
        .unwrap();
    let stored = invoice_service::get_invoice(state, fine_rate.invoice_id)
        .await?
        .data
        .unwrap();
    assert_eq!(stored.factura.tipo_cambio, dec("1234.5679"));
    assert_eq!(
        stored.factura.total_usd,
        to_usd(stored.factura.total_ars, stored.factura.tipo_cambio)
    );
    assert_eq!(stored.factura.total_usd, fine_rate.total_usd);
    assert_eq!(
        Some(stored.items[0].subtotal_usd),
        to_usd(stored.items[0].subtotal_ars, stored.factura.tipo_cambio)
    );
    // Keep it out of the paid-invoice reports checked later.
    invoice_service::set_status(state, &admin(), fine_rate.invoice_id, EstadoFactura::Anulada)
        .await?;

    let missing = invoice_service::get_invoice(state, 999_999).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

async fn facturas_count(state: &AppState) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM facturas")
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

async fn failed_line_rolls_back_the_header(state: &AppState) -> anyhow::Result<()> {
    let before = facturas_count(state).await?;

    // PostgreSQL rejects NUL bytes in text, so the second line's insert fails
    // after the header and first line were written.
    let draft: InvoiceDraft = serde_json::from_value(json!({
        "tipo_cambio": 1000,
        "items": [
            { "producto_id": 1, "cantidad": 1, "precio_unit_ars": 10 },
            { "producto_id": 2, "producto_nombre": "Ye\u{0}rba", "cantidad": 1, "precio_unit_ars": 20 }
        ]
    }))?;
    let result = invoice_service::create_invoice(state, None, draft).await;
    assert!(matches!(result, Err(AppError::OrmError(_))));

    assert_eq!(facturas_count(state).await?, before);
    Ok(())
}

async fn csv_and_stats_only_count_paid_invoices(state: &AppState) -> anyhow::Result<()> {
    let draft: InvoiceDraft = serde_json::from_value(json!({
        "tipo_cambio": 500,
        "cliente_email": "bruno@example.com",
        "items": [{ "producto_id": 3, "producto_nombre": "Termo", "cantidad": 3, "precio_unit_ars": 100 }]
    }))?;
    let annulled = invoice_service::create_invoice(state, None, draft)
        .await?
        .data
        .unwrap();
    invoice_service::set_status(state, &admin(), annulled.invoice_id, EstadoFactura::Anulada)
        .await?;

    let again =
        invoice_service::set_status(state, &admin(), annulled.invoice_id, EstadoFactura::Anulada)
            .await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));

    let user = AuthUser {
        user_id: 2,
        email: "user@example.com".into(),
        role: "usuario".into(),
    };
    let forbidden =
        invoice_service::set_status(state, &user, annulled.invoice_id, EstadoFactura::Pagada).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let export = report_service::invoice_csv(state).await?;
    assert!(export.filename.starts_with("facturas-"));
    let body = export.body.strip_prefix(BOM).unwrap();
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "Ana, \"la del kiosco\"");
    assert_eq!(&rows[0][2], "Mate x 2 | Yerba x 1");
    assert_eq!(&rows[0][3], "2500.00");

    let sales = report_service::sales(state, Periodo::Mes).await?.data.unwrap();
    assert_eq!(sales.items.len(), 1);
    assert_eq!(sales.items[0].ventas, 1);

    let top = report_service::products_top(state, None).await?.data.unwrap();
    assert_eq!(top.items[0].producto, "Mate");
    assert_eq!(top.items[0].unidades, 2);
    assert!(top.items.iter().all(|p| p.producto != "Termo"));
    Ok(())
}

async fn products_require_valid_fields(state: &AppState) -> anyhow::Result<()> {
    let blank = product_service::create_product(
        state,
        &admin(),
        CreateProductRequest {
            nombre: "  ".into(),
            descripcion: None,
            precio: dec("10"),
            stock: 1,
            imagen: None,
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    let free = product_service::create_product(
        state,
        &admin(),
        CreateProductRequest {
            nombre: "Gratis".into(),
            descripcion: None,
            precio: Decimal::ZERO,
            stock: 1,
            imagen: None,
        },
    )
    .await;
    assert!(matches!(free, Err(AppError::BadRequest(_))));

    let created = product_service::create_product(
        state,
        &admin(),
        CreateProductRequest {
            nombre: "Mate".into(),
            descripcion: Some("Calabaza".into()),
            precio: dec("1500.50"),
            stock: 5,
            imagen: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.precio, dec("1500.50"));

    product_service::delete_product(state, &admin(), created.id).await?;
    let gone = product_service::get_product(state, created.id).await;
    assert!(matches!(gone, Err(AppError::NotFound)));
    Ok(())
}

async fn registration_and_login(state: &AppState) -> anyhow::Result<()> {
    // SAFETY: only this test binary reads the variable.
    unsafe { std::env::set_var("JWT_SECRET", "invoice-flow-secret") };

    let registered = auth_service::register_user(
        &state.pool,
        None,
        RegisterRequest {
            email: "Ana@Example.com".into(),
            password: "secreto".into(),
            nombre: Some("Ana".into()),
            rol: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.email, "ana@example.com");
    assert_eq!(registered.rol, "usuario");

    let duplicate = auth_service::register_user(
        &state.pool,
        None,
        RegisterRequest {
            email: "ana@example.com".into(),
            password: "secreto".into(),
            nombre: None,
            rol: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let escalation = auth_service::register_user(
        &state.pool,
        None,
        RegisterRequest {
            email: "root@example.com".into(),
            password: "secreto".into(),
            nombre: None,
            rol: Some("admin".into()),
        },
    )
    .await;
    assert!(matches!(escalation, Err(AppError::Forbidden)));

    let login = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: "ana@example.com".into(),
            password: "secreto".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.usuario.id, registered.id);

    let wrong = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: "ana@example.com".into(),
            password: "otra-clave".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE factura_detalle, facturas, audit_logs, productos, usuarios RESTART IDENTITY CASCADE",
    ))
    .await?;

    let pool = create_pool(database_url).await?;
    Ok(AppState::new(
        pool,
        Arc::new(MemoryStore::new()),
        Arc::new(FixedRate(dec("1000"))),
    ))
}
