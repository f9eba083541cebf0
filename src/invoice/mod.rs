pub mod builder;

pub use builder::{DEFAULT_PRODUCT_NAME, BuiltInvoice, BuiltLine, ClienteInfo, InvoiceError, RatePolicy, build};
