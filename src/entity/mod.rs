pub mod factura_detalle;
pub mod facturas;
pub mod productos;
pub mod usuarios;

pub use factura_detalle::Entity as FacturaDetalle;
pub use facturas::Entity as Facturas;
pub use productos::Entity as Productos;
pub use usuarios::Entity as Usuarios;
