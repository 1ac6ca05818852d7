//! HTTP surface of the campus market.

use std::sync::Arc;

use axum::Router;
use market_core::{config::MarketConfig, MarketCore, Services};
use tower_http::trace::TraceLayer;

pub mod cookies;
pub mod error;
pub mod flash;
pub mod routes;
pub mod session;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub config: Arc<MarketConfig>,
}

impl AppState {
    pub fn new(services: Services, config: MarketConfig) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }

    pub fn from_core(core: MarketCore) -> Self {
        Self::new(core.services, core.config)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::health_routes())
        .merge(routes::accounts::routes())
        .merge(routes::items::routes())
        .merge(routes::profile::routes())
        .merge(routes::requests::routes())
        .merge(routes::square::routes())
        .merge(routes::stock::routes())
        .merge(routes::messages::routes())
        .merge(routes::notifications::routes())
        .merge(routes::admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
