use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "facturas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub fecha: DateTimeWithTimeZone,
    pub cliente_id: Option<i64>,
    pub cliente_nombre: Option<String>,
    pub cliente_email: Option<String>,
    /// ARS total.
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub total_usd: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((14, 4)))")]
    pub tipo_cambio: Decimal,
    pub estado: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::factura_detalle::Entity")]
    FacturaDetalle,
}

impl Related<super::factura_detalle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FacturaDetalle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
