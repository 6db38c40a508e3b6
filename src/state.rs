//! Shared application state for all routes.

use crate::config::ResolvedModel;
use crate::service::CrudService;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CrudService>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, model: Arc<ResolvedModel>) -> Self {
        AppState {
            service: Arc::new(CrudService::new(store, model)),
        }
    }
}
