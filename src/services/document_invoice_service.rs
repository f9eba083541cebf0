//! Invoices kept in the realtime document store.
//!
//! Layout:
//! - `facturas/{id}`: the invoice record
//! - `facturasPorFecha/{YYYY-MM-DD}/{id}`: `true`
//! - `facturasPorEstado/{estado}/{id}`: `true`
//!
//! Every write that touches a record also touches its index pointers, in the
//! same multi-path update.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    docstore::{DocumentStore, PathUpdate},
    dto::invoices::{IndexRebuild, InvoiceDraft},
    error::{AppError, AppResult},
    exchange::{RateProvider, quote_or_none},
    invoice::{BuiltInvoice, RatePolicy, build},
    models::{EstadoFactura, FacturaDoc, FacturaDocItem},
    report::render_document_report,
    middleware::auth::AuthUser,
    services::invoice_service::apply_buyer,
};

pub const FACTURAS: &str = "facturas";
pub const POR_FECHA: &str = "facturasPorFecha";
pub const POR_ESTADO: &str = "facturasPorEstado";

const ID_SUFFIX_LEN: usize = 6;

/// `{millis}-{6 base36 chars}`.
pub fn new_invoice_id(now: DateTime<Utc>) -> String {
    let mut n = Uuid::new_v4().as_u128();
    let digits = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
    for _ in 0..ID_SUFFIX_LEN {
        suffix.push(digits[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("{}-{}", now.timestamp_millis(), suffix)
}

pub fn day_key(ts: i64) -> String {
    DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

fn record_path(id: &str) -> AppResult<String> {
    if id.is_empty() || id.contains(['/', '.', '#', '$', '[', ']']) {
        return Err(AppError::BadRequest(format!("invalid invoice id {id:?}")));
    }
    Ok(format!("{FACTURAS}/{id}"))
}

fn to_document(id: &str, built: &BuiltInvoice, user: Option<&AuthUser>, now: DateTime<Utc>) -> FacturaDoc {
    FacturaDoc {
        id: id.to_string(),
        ts: now.timestamp_millis(),
        fecha_iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_ars: built.total_ars,
        total_usd: built.total_usd,
        tipo_cambio: built.tipo_cambio,
        estado: built.estado,
        user_id: user.map(|u| u.user_id.to_string()),
        cliente_email: built.cliente.email.clone(),
        cliente_nombre: built.cliente.nombre.clone(),
        items: built
            .lines
            .iter()
            .map(|line| FacturaDocItem {
                producto_id: line.producto_id,
                producto_nombre: Some(line.producto_nombre.clone()),
                cantidad: line.cantidad,
                precio_unitario: line.precio_unit_ars,
                subtotal_ars: Some(line.subtotal_ars),
                precio_unit_usd: line.precio_unit_usd,
                subtotal_usd: line.subtotal_usd,
            })
            .collect(),
    }
}

fn record_value(doc: &FacturaDoc) -> AppResult<Value> {
    let mut stored = doc.clone();
    stored.id = String::new();
    serde_json::to_value(stored).map_err(|e| AppError::Internal(e.into()))
}

/// The record plus both index pointers.
pub fn creation_update(doc: &FacturaDoc) -> AppResult<PathUpdate> {
    let mut updates = PathUpdate::new();
    updates.insert(record_path(&doc.id)?, record_value(doc)?);
    updates.insert(format!("{POR_FECHA}/{}/{}", day_key(doc.ts), doc.id), json!(true));
    updates.insert(format!("{POR_ESTADO}/{}/{}", doc.estado, doc.id), json!(true));
    Ok(updates)
}

pub async fn create(
    store: &dyn DocumentStore,
    rates: &dyn RateProvider,
    user: Option<&AuthUser>,
    mut draft: InvoiceDraft,
) -> AppResult<FacturaDoc> {
    // The record timestamp is taken here, not from the client.
    draft.fecha = None;
    if draft.tipo_cambio.is_none() {
        draft.tipo_cambio = quote_or_none(rates).await;
        draft.total_usd = None;
    }

    let now = Utc::now();
    let mut built = build(&draft, RatePolicy::Optional, now)?;
    apply_buyer(&mut built.cliente, user);

    let id = new_invoice_id(now);
    let doc = to_document(&id, &built, user, now);
    store.update(creation_update(&doc)?).await?;

    tracing::info!(
        factura_id = %doc.id,
        items = doc.items.len(),
        total_ars = %doc.total_ars,
        rated = doc.tipo_cambio.is_some(),
        "document invoice created"
    );
    Ok(doc)
}

fn parse_record(id: &str, value: Value) -> Option<FacturaDoc> {
    match serde_json::from_value::<FacturaDoc>(value) {
        Ok(mut doc) => {
            doc.id = id.to_string();
            Some(doc)
        }
        Err(err) => {
            tracing::warn!(factura_id = id, error = %err, "skipping malformed invoice record");
            None
        }
    }
}

fn sort_newest_first(docs: &mut [FacturaDoc]) {
    docs.sort_by(|a, b| b.ts.cmp(&a.ts).then_with(|| a.id.cmp(&b.id)));
}

pub async fn get(store: &dyn DocumentStore, id: &str) -> AppResult<Option<FacturaDoc>> {
    let value = store.get(&record_path(id)?).await?;
    Ok(value.and_then(|v| parse_record(id, v)))
}

pub async fn list(store: &dyn DocumentStore) -> AppResult<Vec<FacturaDoc>> {
    let mut docs: Vec<FacturaDoc> = match store.get(FACTURAS).await? {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(id, value)| parse_record(&id, value))
            .collect(),
        _ => Vec::new(),
    };
    sort_newest_first(&mut docs);
    Ok(docs)
}

/// Resolve the ids under an index node, skipping pointers whose record is gone.
async fn resolve_index(store: &dyn DocumentStore, index_path: &str) -> AppResult<Vec<FacturaDoc>> {
    let ids: Vec<String> = match store.get(index_path).await? {
        Some(Value::Object(map)) => map.into_iter().map(|(id, _)| id).collect(),
        _ => Vec::new(),
    };

    let mut docs = Vec::with_capacity(ids.len());
    for id in ids {
        match get(store, &id).await? {
            Some(doc) => docs.push(doc),
            None => tracing::debug!(index = index_path, factura_id = %id, "stale index entry"),
        }
    }
    sort_newest_first(&mut docs);
    Ok(docs)
}

pub async fn list_by_day(store: &dyn DocumentStore, day: NaiveDate) -> AppResult<Vec<FacturaDoc>> {
    resolve_index(store, &format!("{POR_FECHA}/{}", day.format("%Y-%m-%d"))).await
}

pub async fn list_by_status(
    store: &dyn DocumentStore,
    estado: EstadoFactura,
) -> AppResult<Vec<FacturaDoc>> {
    resolve_index(store, &format!("{POR_ESTADO}/{estado}")).await
}

pub async fn set_status(
    store: &dyn DocumentStore,
    id: &str,
    estado: EstadoFactura,
) -> AppResult<FacturaDoc> {
    let mut doc = get(store, id).await?.ok_or(AppError::NotFound)?;
    if doc.estado == estado {
        return Err(AppError::BadRequest(format!("Invoice is already {estado}")));
    }

    let mut updates = PathUpdate::new();
    updates.insert(format!("{}/estado", record_path(id)?), json!(estado));
    updates.insert(format!("{POR_ESTADO}/{}/{id}", doc.estado), Value::Null);
    updates.insert(format!("{POR_ESTADO}/{estado}/{id}"), json!(true));
    store.update(updates).await?;

    tracing::info!(factura_id = id, from = %doc.estado, to = %estado, "document invoice status changed");
    doc.estado = estado;
    Ok(doc)
}

pub async fn delete(store: &dyn DocumentStore, id: &str) -> AppResult<()> {
    let doc = get(store, id).await?.ok_or(AppError::NotFound)?;

    let mut updates = PathUpdate::new();
    updates.insert(record_path(id)?, Value::Null);
    updates.insert(format!("{POR_FECHA}/{}/{id}", day_key(doc.ts)), Value::Null);
    updates.insert(format!("{POR_ESTADO}/{}/{id}", doc.estado), Value::Null);
    store.update(updates).await?;
    Ok(())
}

fn index_entries(value: Option<Value>) -> BTreeSet<(String, String)> {
    let mut entries = BTreeSet::new();
    if let Some(Value::Object(groups)) = value {
        for (group, ids) in groups {
            if let Value::Object(ids) = ids {
                for id in ids.keys() {
                    entries.insert((group.clone(), id.clone()));
                }
            }
        }
    }
    entries
}

fn index_value(entries: &BTreeSet<(String, String)>) -> Value {
    if entries.is_empty() {
        return Value::Null;
    }
    let mut groups: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
    for (group, id) in entries {
        groups
            .entry(group.as_str())
            .or_default()
            .insert(id.clone(), Value::Bool(true));
    }
    Value::Object(
        groups
            .into_iter()
            .map(|(group, ids)| (group.to_string(), Value::Object(ids)))
            .collect(),
    )
}

/// Recompute both secondary indexes from the primary records.
pub async fn rebuild_indexes(store: &dyn DocumentStore) -> AppResult<IndexRebuild> {
    let docs = list(store).await?;
    let wanted_fecha: BTreeSet<(String, String)> = docs
        .iter()
        .map(|d| (day_key(d.ts), d.id.clone()))
        .collect();
    let wanted_estado: BTreeSet<(String, String)> = docs
        .iter()
        .map(|d| (d.estado.to_string(), d.id.clone()))
        .collect();

    let current_fecha = index_entries(store.get(POR_FECHA).await?);
    let current_estado = index_entries(store.get(POR_ESTADO).await?);

    let added = wanted_fecha.difference(&current_fecha).count()
        + wanted_estado.difference(&current_estado).count();
    let removed = current_fecha.difference(&wanted_fecha).count()
        + current_estado.difference(&wanted_estado).count();

    if added == 0 && removed == 0 {
        return Ok(IndexRebuild { added, removed });
    }

    let mut updates = PathUpdate::new();
    updates.insert(POR_FECHA.to_string(), index_value(&wanted_fecha));
    updates.insert(POR_ESTADO.to_string(), index_value(&wanted_estado));
    store.update(updates).await?;

    tracing::info!(added, removed, "document invoice indexes rebuilt");
    Ok(IndexRebuild { added, removed })
}

pub async fn export_csv(store: &dyn DocumentStore) -> AppResult<String> {
    let docs = list(store).await?;
    Ok(render_document_report(&docs))
}
