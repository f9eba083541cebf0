use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "factura_detalle")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub factura_id: i64,
    pub producto_id: i64,
    pub producto_nombre: String,
    pub cantidad: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub precio_unitario: Decimal,
    /// Generated by the database as `cantidad * precio_unitario`; never written.
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub subtotal_ars: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub precio_unit_usd: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub subtotal_usd: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::facturas::Entity",
        from = "Column::FacturaId",
        to = "super::facturas::Column::Id"
    )]
    Facturas,
}

impl Related<super::facturas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Facturas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
