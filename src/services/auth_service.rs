use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;

use crate::{
    audit,
    db::DbPool,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USUARIO, jwt_secret},
    models::Usuario,
    response::{ApiResponse, Meta},
};

#[derive(sqlx::FromRow)]
struct UsuarioRow {
    id: i64,
    email: String,
    password_hash: String,
    nombre: Option<String>,
    rol: String,
    created_at: DateTime<Utc>,
}

impl From<UsuarioRow> for Usuario {
    fn from(row: UsuarioRow) -> Self {
        Usuario {
            id: row.id,
            email: row.email,
            nombre: row.nombre,
            rol: row.rol,
            created_at: row.created_at,
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub async fn register_user(
    pool: &DbPool,
    actor: Option<&AuthUser>,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Usuario>> {
    let RegisterRequest {
        email,
        password,
        nombre,
        rol,
    } = payload;

    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if password.len() < 6 {
        return Err(AppError::BadRequest(
            "Password must have at least 6 characters".into(),
        ));
    }

    let rol = rol
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| ROLE_USUARIO.to_string());
    if rol != ROLE_USUARIO && rol != ROLE_ADMIN {
        return Err(AppError::BadRequest(format!("Unknown role {rol}")));
    }
    if rol != ROLE_USUARIO && !actor.is_some_and(AuthUser::is_admin) {
        return Err(AppError::Forbidden);
    }

    let exist: Option<(i64,)> = sqlx::query_as("SELECT id FROM usuarios WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let usuario: Usuario = sqlx::query_as(
        r#"
        INSERT INTO usuarios (email, password_hash, nombre, rol)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, nombre, rol, created_at
        "#,
    )
    .bind(email.as_str())
    .bind(password_hash)
    .bind(nombre.filter(|n| !n.trim().is_empty()))
    .bind(rol.as_str())
    .fetch_one(pool)
    .await?;

    audit::record(
        pool,
        actor.map(|a| a.user_id).or(Some(usuario.id)),
        "user_register",
        "usuarios",
        serde_json::json!({ "user_id": usuario.id, "rol": usuario.rol }),
    )
    .await;

    Ok(ApiResponse::success("User created", usuario, None))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let row: Option<UsuarioRow> = sqlx::query_as::<_, UsuarioRow>(
        "SELECT id, email, password_hash, nombre, rol, created_at FROM usuarios WHERE email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
    };

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let secret = jwt_secret()?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: row.id.to_string(),
        email: row.email.clone(),
        rol: row.rol.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let usuario = Usuario::from(row);

    audit::record(
        pool,
        Some(usuario.id),
        "user_login",
        "usuarios",
        serde_json::json!({ "user_id": usuario.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            usuario,
        },
        Some(Meta::empty()),
    ))
}
