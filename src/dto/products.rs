use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Producto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub imagen: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub stock: Option<i32>,
    pub imagen: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Producto>)]
    pub items: Vec<Producto>,
}
