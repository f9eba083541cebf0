use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        invoices::{
            DocumentInvoiceCreated, DocumentInvoiceList, DraftLine, IndexRebuild, InvoiceCreated,
            InvoiceDraft, InvoiceList, InvoiceWithLines, UpdateInvoiceStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reports::{Cotizacion, SalesReport, TopProductsReport},
    },
    models::{EstadoFactura, Factura, FacturaDetalle, FacturaDoc, FacturaDocItem, Producto, Usuario},
    report::{PeriodSales, Periodo, ProductUnits},
    response::{ApiResponse, Meta},
    routes::{
        auth, exchange, health, invoices, params, products as product_routes, reports,
        rtdb_invoices,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        exchange::cotizacion,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        invoices::create_invoice,
        invoices::list_invoices,
        invoices::get_invoice,
        invoices::update_invoice_status,
        reports::invoice_csv,
        reports::sales,
        reports::top_products,
        rtdb_invoices::create_invoice,
        rtdb_invoices::list_invoices,
        rtdb_invoices::export_csv,
        rtdb_invoices::list_by_day,
        rtdb_invoices::list_by_status,
        rtdb_invoices::update_status,
        rtdb_invoices::delete_invoice,
        rtdb_invoices::rebuild_indexes
    ),
    components(
        schemas(
            Usuario,
            Producto,
            EstadoFactura,
            Factura,
            FacturaDetalle,
            FacturaDoc,
            FacturaDocItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            InvoiceDraft,
            DraftLine,
            InvoiceCreated,
            InvoiceList,
            InvoiceWithLines,
            UpdateInvoiceStatusRequest,
            DocumentInvoiceCreated,
            DocumentInvoiceList,
            IndexRebuild,
            Cotizacion,
            Periodo,
            PeriodSales,
            ProductUnits,
            SalesReport,
            TopProductsReport,
            params::Pagination,
            params::ProductQuery,
            params::InvoiceListQuery,
            Meta,
            ApiResponse<Producto>,
            ApiResponse<ProductList>,
            ApiResponse<InvoiceCreated>,
            ApiResponse<InvoiceList>,
            ApiResponse<InvoiceWithLines>,
            ApiResponse<DocumentInvoiceList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Exchange", description = "ARS/USD quote"),
        (name = "Products", description = "Product catalog"),
        (name = "Invoices", description = "Invoices in the relational store"),
        (name = "Reports", description = "CSV export and sales statistics"),
        (name = "Document invoices", description = "Invoices in the document store"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
