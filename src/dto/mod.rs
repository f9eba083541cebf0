pub mod auth;
pub mod invoices;
pub mod lenient;
pub mod products;
pub mod reports;
