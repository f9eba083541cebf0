use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::lenient,
    models::{EstadoFactura, Factura, FacturaDetalle, FacturaDoc},
};

/// Checkout payload as sent by the storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct InvoiceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub cliente_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente_nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tipo_cambio: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub total_ars: Option<Decimal>,
    /// Older clients send the ARS total as `total`.
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub total_usd: Option<Decimal>,
    #[serde(default)]
    pub items: Option<Vec<DraftLine>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DraftLine {
    #[serde(default, deserialize_with = "lenient::integer")]
    pub producto_id: Option<i64>,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub cantidad: Option<i64>,
    #[serde(default, alias = "precio_unitario", deserialize_with = "lenient::decimal")]
    pub precio_unit_ars: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub subtotal_ars: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub precio_unit_usd: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal", skip_serializing_if = "Option::is_none")]
    pub subtotal_usd: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceCreated {
    pub invoice_id: i64,
    pub total_ars: Decimal,
    pub total_usd: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceWithLines {
    pub factura: Factura,
    pub items: Vec<FacturaDetalle>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct InvoiceList {
    #[schema(value_type = Vec<Factura>)]
    pub items: Vec<Factura>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceStatusRequest {
    pub estado: EstadoFactura,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentInvoiceCreated {
    pub invoice_id: String,
    pub factura: FacturaDoc,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct DocumentInvoiceList {
    #[schema(value_type = Vec<FacturaDoc>)]
    pub items: Vec<FacturaDoc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IndexRebuild {
    pub added: usize,
    pub removed: usize,
}
