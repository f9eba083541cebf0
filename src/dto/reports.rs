use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::report::{PeriodSales, Periodo, ProductUnits};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalesQuery {
    pub periodo: Option<Periodo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopProductsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SalesReport {
    #[schema(value_type = Vec<PeriodSales>)]
    pub items: Vec<PeriodSales>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TopProductsReport {
    #[schema(value_type = Vec<ProductUnits>)]
    pub items: Vec<ProductUnits>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Cotizacion {
    pub tipo_cambio: Option<Decimal>,
    pub disponible: bool,
}
