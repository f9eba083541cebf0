use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Alias, Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::invoices::{InvoiceCreated, InvoiceDraft, InvoiceList, InvoiceWithLines},
    entity::{
        factura_detalle::{
            ActiveModel as DetalleActive, Column as DetalleCol, Entity as FacturaDetalle,
            Model as DetalleModel,
        },
        facturas::{ActiveModel as FacturaActive, Column as FacturaCol, Entity as Facturas, Model as FacturaModel},
    },
    error::{AppError, AppResult},
    invoice::{BuiltInvoice, ClienteInfo, RatePolicy, build},
    middleware::auth::{AuthUser, ensure_admin},
    models::{EstadoFactura, Factura, FacturaDetalle as Detalle},
    response::{ApiResponse, Meta},
    routes::params::{InvoiceListQuery, SortOrder},
    state::AppState,
};

/// Validate a checkout payload and persist header and lines in one transaction.
pub async fn create_invoice(
    state: &AppState,
    user: Option<&AuthUser>,
    draft: InvoiceDraft,
) -> AppResult<ApiResponse<InvoiceCreated>> {
    let mut built = build(&draft, RatePolicy::Required, Utc::now())?;
    apply_buyer(&mut built.cliente, user);
    let (tipo_cambio, total_usd) = built.rated()?;

    let txn = state.orm.begin().await?;
    let factura_id = match insert_rows(&txn, &built, tipo_cambio, total_usd).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(error = %err, "invoice insert failed, rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            return Err(err.into());
        }
    };
    txn.commit().await?;

    tracing::info!(
        factura_id,
        items = built.lines.len(),
        total_ars = %built.total_ars,
        "invoice created"
    );

    audit::record(
        &state.pool,
        user.map(|u| u.user_id),
        "invoice_create",
        "facturas",
        serde_json::json!({ "factura_id": factura_id, "total_ars": built.total_ars }),
    )
    .await;

    Ok(ApiResponse::success(
        "Invoice created",
        InvoiceCreated {
            invoice_id: factura_id,
            total_ars: built.total_ars,
            total_usd: Some(total_usd),
        },
        Some(Meta::empty()),
    ))
}

async fn insert_rows(
    txn: &DatabaseTransaction,
    built: &BuiltInvoice,
    tipo_cambio: Decimal,
    total_usd: Decimal,
) -> Result<i64, DbErr> {
    let factura = FacturaActive {
        id: NotSet,
        fecha: Set(built.fecha.into()),
        cliente_id: Set(built.cliente.id),
        cliente_nombre: Set(built.cliente.nombre.clone()),
        cliente_email: Set(built.cliente.email.clone()),
        total: Set(built.total_ars),
        total_usd: Set(Some(total_usd)),
        tipo_cambio: Set(tipo_cambio),
        estado: Set(built.estado.as_str().to_string()),
    }
    .insert(txn)
    .await?;

    for line in &built.lines {
        let (Some(precio_unit_usd), Some(subtotal_usd)) = (line.precio_unit_usd, line.subtotal_usd)
        else {
            return Err(DbErr::Custom(format!(
                "line for product {} has no USD figures",
                line.producto_id
            )));
        };

        // subtotal_ars stays NotSet: the column is generated.
        DetalleActive {
            id: NotSet,
            factura_id: Set(factura.id),
            producto_id: Set(line.producto_id),
            producto_nombre: Set(line.producto_nombre.clone()),
            cantidad: Set(line.cantidad),
            precio_unitario: Set(line.precio_unit_ars),
            subtotal_ars: NotSet,
            precio_unit_usd: Set(precio_unit_usd),
            subtotal_usd: Set(subtotal_usd),
        }
        .insert(txn)
        .await?;
    }

    Ok(factura.id)
}

/// An authenticated buyer replaces whatever identity the client sent.
pub(crate) fn apply_buyer(cliente: &mut ClienteInfo, user: Option<&AuthUser>) {
    if let Some(user) = user {
        cliente.id = Some(user.user_id);
        cliente.email = Some(user.email.clone());
        if cliente.nombre.is_none() {
            cliente.nombre = Some(user.email.clone());
        }
    }
}

pub async fn list_invoices(
    state: &AppState,
    query: InvoiceListQuery,
) -> AppResult<ApiResponse<InvoiceList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(estado) = query.estado {
        condition = condition.add(FacturaCol::Estado.eq(estado.as_str()));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Expr::expr(Expr::col(FacturaCol::Id).cast_as(Alias::new("text")))
                .like(format!("%{q}%")),
        );
    }

    let mut finder = Facturas::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(FacturaCol::Fecha),
        SortOrder::Desc => finder.order_by_desc(FacturaCol::Fecha),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(factura_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        InvoiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_invoice(state: &AppState, id: i64) -> AppResult<ApiResponse<InvoiceWithLines>> {
    let factura = match Facturas::find_by_id(id).one(&state.orm).await? {
        Some(f) => f,
        None => return Err(AppError::NotFound),
    };

    let items = FacturaDetalle::find()
        .filter(DetalleCol::FacturaId.eq(factura.id))
        .order_by_asc(DetalleCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(detalle_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        InvoiceWithLines {
            factura: factura_from_entity(factura),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn set_status(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    estado: EstadoFactura,
) -> AppResult<ApiResponse<Factura>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let factura = match Facturas::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
    {
        Some(f) => f,
        None => return Err(AppError::NotFound),
    };

    if factura.estado == estado.as_str() {
        return Err(AppError::BadRequest(format!("Invoice is already {estado}")));
    }

    let mut active: FacturaActive = factura.into();
    active.estado = Set(estado.as_str().to_string());
    let factura = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "invoice_status",
        "facturas",
        serde_json::json!({ "factura_id": id, "estado": estado.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Status updated",
        factura_from_entity(factura),
        Some(Meta::empty()),
    ))
}

fn factura_from_entity(model: FacturaModel) -> Factura {
    let estado = model.estado.parse::<EstadoFactura>().unwrap_or_else(|err: String| {
        tracing::warn!(factura_id = model.id, error = %err, "unexpected invoice status");
        EstadoFactura::Pagada
    });
    Factura {
        id: model.id,
        fecha: model.fecha.with_timezone(&Utc),
        cliente_id: model.cliente_id,
        cliente_nombre: model.cliente_nombre,
        cliente_email: model.cliente_email,
        total_ars: model.total,
        total_usd: model.total_usd,
        tipo_cambio: model.tipo_cambio,
        estado,
    }
}

fn detalle_from_entity(model: DetalleModel) -> Detalle {
    Detalle {
        id: model.id,
        factura_id: model.factura_id,
        producto_id: model.producto_id,
        producto_nombre: model.producto_nombre,
        cantidad: model.cantidad,
        precio_unit_ars: model.precio_unitario,
        subtotal_ars: model.subtotal_ars,
        precio_unit_usd: model.precio_unit_usd,
        subtotal_usd: model.subtotal_usd,
    }
}
