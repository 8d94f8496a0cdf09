pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod services;
pub mod tenant;

use std::sync::Arc;

use axum::Router;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::handlers::AppServices;

/// Shared state handed to every handler. The data-access handle is built
/// once at startup and passed down explicitly; there is no ambient global
/// connection anywhere.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let services = AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// All v1 resource routers, nested per entity.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/clients", handlers::clients::client_routes())
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/supplies", handlers::supplies::supply_routes())
        .nest(
            "/prescriptions",
            handlers::prescriptions::prescription_routes(),
        )
        .nest("/purchases", handlers::purchases::purchase_routes())
        .nest("/lab-orders", handlers::lab_orders::lab_order_routes())
}
