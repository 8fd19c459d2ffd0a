//! HTTP API Layer
//!
//! This crate provides the REST API for the tutor desk using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Billing reports, currencies and health
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Response shapes with currency symbols and report totals
//! - **Error Handling**: Consistent JSON error responses
//!
//! # Routes
//!
//! | Method | Path | Access |
//! |---|---|---|
//! | GET | `/health`, `/health/ready` | public |
//! | GET | `/api/v1/billing/summary?from&to[&tz]` | teacher, admin |
//! | GET | `/api/v1/students/:id/statement?from&to[&tz]` | teacher, admin, the student |
//! | GET | `/api/v1/currencies` | any signed-in user |
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(BillingService::new(store), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use axum::{
    Router,
    routing::get,
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use domain_billing::BillingService;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{billing, currencies, health};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub billing: BillingService,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `billing` - Billing service over the configured data store
/// * `config` - API configuration
pub fn create_router(billing: BillingService, config: ApiConfig) -> Router {
    let state = AppState { billing, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Protected API routes
    let api_routes = Router::new()
        .route("/billing/summary", get(billing::get_summary))
        .route("/students/:id/statement", get(billing::get_statement))
        .route("/currencies", get(currencies::list_currencies))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
