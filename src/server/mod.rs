pub mod dispatch;
pub mod request;
pub mod response;
pub mod router;

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::server::router::RouteTable;
use crate::storage::Storage;
use crate::sync::UserLocks;

/// Shared application state handed to the dispatcher: the route table,
/// storage and config collaborators, and the per-user lock registry.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub storage: Arc<dyn Storage>,
    pub config: Arc<AppConfig>,
    pub locks: UserLocks,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            routes: Arc::new(RouteTable::new()),
            storage,
            config: Arc::new(config),
            locks: UserLocks::new(),
        }
    }
}

/// Build the axum application. Every path funnels through the dispatcher,
/// which owns routing; axum only provides the transport and global layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch::dispatch)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
