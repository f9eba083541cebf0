use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Usuario {
    pub id: i64,
    pub email: String,
    pub nombre: Option<String>,
    pub rol: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Producto {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub stock: i32,
    pub imagen: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoFactura {
    Pagada,
    Anulada,
}

impl EstadoFactura {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoFactura::Pagada => "PAGADA",
            EstadoFactura::Anulada => "ANULADA",
        }
    }
}

impl fmt::Display for EstadoFactura {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoFactura {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAGADA" => Ok(EstadoFactura::Pagada),
            "ANULADA" => Ok(EstadoFactura::Anulada),
            other => Err(format!("unknown invoice status {other}")),
        }
    }
}

/// Invoice header as stored in the relational backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Factura {
    pub id: i64,
    pub fecha: DateTime<Utc>,
    pub cliente_id: Option<i64>,
    pub cliente_nombre: Option<String>,
    pub cliente_email: Option<String>,
    pub total_ars: Decimal,
    pub total_usd: Option<Decimal>,
    pub tipo_cambio: Decimal,
    pub estado: EstadoFactura,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FacturaDetalle {
    pub id: i64,
    pub factura_id: i64,
    pub producto_id: i64,
    pub producto_nombre: String,
    pub cantidad: i32,
    pub precio_unit_ars: Decimal,
    pub subtotal_ars: Decimal,
    pub precio_unit_usd: Decimal,
    pub subtotal_usd: Decimal,
}

/// Invoice record as kept in the document store under `facturas/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FacturaDoc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub ts: i64,
    #[serde(rename = "fechaISO")]
    pub fecha_iso: String,
    #[serde(rename = "totalARS")]
    pub total_ars: Decimal,
    #[serde(rename = "totalUSD", default)]
    pub total_usd: Option<Decimal>,
    #[serde(default)]
    pub tipo_cambio: Option<Decimal>,
    #[serde(default = "default_estado")]
    pub estado: EstadoFactura,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub cliente_email: Option<String>,
    #[serde(default)]
    pub cliente_nombre: Option<String>,
    #[serde(default)]
    pub items: Vec<FacturaDocItem>,
}

fn default_estado() -> EstadoFactura {
    EstadoFactura::Pagada
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FacturaDocItem {
    pub producto_id: i64,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
    #[serde(default)]
    pub subtotal_ars: Option<Decimal>,
    #[serde(default)]
    pub precio_unit_usd: Option<Decimal>,
    #[serde(default)]
    pub subtotal_usd: Option<Decimal>,
}
