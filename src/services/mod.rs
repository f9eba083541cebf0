pub mod auth_service;
pub mod document_invoice_service;
pub mod invoice_service;
pub mod product_service;
pub mod report_service;
