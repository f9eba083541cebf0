use std::sync::Arc;

use rust_decimal::Decimal;
use storefront_api::{
    cart::Cart,
    config::AppConfig,
    db::create_pool,
    docstore::MemoryStore,
    exchange::FixedRate,
    models::Producto,
    services::{auth_service::hash_password, invoice_service},
    state::AppState,
};

/// Rate used for the demo invoice, so seeding never depends on the quote service.
const SEED_RATE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_admin(&pool, "admin@example.com", "admin123").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123").await?;
    let productos = seed_products(&pool).await?;

    let state = AppState::new(
        pool.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(FixedRate(SEED_RATE)),
    );
    seed_invoice(&state, &productos).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<i64> {
    ensure_user_with_role(pool, email, password, "admin").await
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<i64> {
    ensure_user_with_role(pool, email, password, "usuario").await
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    rol: &str,
) -> anyhow::Result<i64> {
    let password_hash = hash_password(password)?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO usuarios (email, password_hash, rol)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET rol = EXCLUDED.rol
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(rol)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (rol={rol})");
    Ok(id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Producto>> {
    let products = [
        ("Mate de calabaza", "Mate artesanal con virola de alpaca", "18500.00", 40),
        ("Bombilla de acero", "Bombilla pico de loro", "6200.50", 120),
        ("Yerba 1kg", "Yerba mate con palo", "4300.00", 200),
        ("Termo 1L", "Termo de acero inoxidable", "52999.99", 25),
    ];

    for (nombre, descripcion, precio, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO productos (nombre, descripcion, precio, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (nombre) DO NOTHING
            "#,
        )
        .bind(nombre)
        .bind(descripcion)
        .bind(precio.parse::<Decimal>()?)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    let rows: Vec<(i64, String, Option<String>, Decimal, i32, Option<String>, chrono::DateTime<chrono::Utc>)> =
        sqlx::query_as(
            "SELECT id, nombre, descripcion, precio, stock, imagen, created_at FROM productos ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

    println!("Seeded products");
    Ok(rows
        .into_iter()
        .map(|(id, nombre, descripcion, precio, stock, imagen, created_at)| Producto {
            id,
            nombre,
            descripcion,
            precio,
            stock,
            imagen,
            created_at,
        })
        .collect())
}

async fn seed_invoice(state: &AppState, productos: &[Producto]) -> anyhow::Result<()> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM facturas")
        .fetch_one(&state.pool)
        .await?;
    if count > 0 || productos.is_empty() {
        println!("Skipping demo invoice");
        return Ok(());
    }

    let mut cart = Cart::new();
    for producto in productos.iter().take(2) {
        cart.add(producto);
    }
    if let Some(first) = productos.first() {
        cart.change_quantity(first.id, 1);
    }

    let mut draft = cart.to_draft(Some(SEED_RATE));
    draft.cliente_nombre = Some("Cliente Demo".to_string());
    draft.cliente_email = Some("demo@example.com".to_string());

    let resp = invoice_service::create_invoice(state, None, draft).await?;
    if let Some(created) = resp.data {
        println!(
            "Seeded invoice {} ({} ARS)",
            created.invoice_id, created.total_ars
        );
    }
    Ok(())
}
