use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn, orm_from_pool},
    docstore::DocumentStore,
    exchange::RateProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub docs: Arc<dyn DocumentStore>,
    pub rates: Arc<dyn RateProvider>,
}

impl AppState {
    pub fn new(pool: DbPool, docs: Arc<dyn DocumentStore>, rates: Arc<dyn RateProvider>) -> Self {
        let orm = orm_from_pool(pool.clone());
        Self {
            pool,
            orm,
            docs,
            rates,
        }
    }
}
