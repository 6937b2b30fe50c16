//! FarmConnect API library.
//!
//! Marketplace backend connecting Ghanaian farmers with buyers: catalog,
//! carts, orders, mobile-money payments, warehousing and farmer
//! verification, served over a versioned JSON API.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod request_id;
pub mod services;
pub mod validation;

use std::sync::Arc;

use axum::{Extension, Router};
use sea_orm::DatabaseConnection;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::services::AppServices;

pub use handlers::ApiResponse;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

/// Every route under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Accounts and sessions
        .nest("/auth", handlers::auth::auth_routes())
        // Catalog, with reviews mounted beside it
        .nest(
            "/products",
            handlers::products::product_routes().merge(handlers::reviews::review_routes()),
        )
        // Shopping
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/payments", handlers::payments::payment_routes())
        // Farmer-side: sales and verification
        .nest("/farmers", handlers::farmers::farmer_routes())
        // Warehousing
        .nest("/warehouses", handlers::warehouse::warehouse_routes())
        // Cross-cutting
        .nest(
            "/notifications",
            handlers::notifications::notification_routes(),
        )
        .nest("/admin", handlers::admin::admin_routes())
}

/// Assembles the complete application: health probes at the root, the
/// versioned API, interactive docs and the middleware stack.
///
/// CORS is left to the caller, which builds it from configuration.
pub fn app(state: AppState) -> Router {
    let auth_service = state.auth.clone();

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Auth middleware reads the service out of request extensions
        .layer(Extension(auth_service))
        .layer(axum::middleware::from_fn(
            request_id::request_id_middleware,
        ))
        .with_state(state)
}
