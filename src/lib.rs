//! Work-entry ledger service for a construction-materials supplier.
//!
//! Records deliveries per customer and derives weekly, daily and pending
//! balance reports over them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use slog::Logger;
use std::sync::Arc;

use crate::config::{AppConfig, AppConfigError};
use crate::repositories::WorkEntryStore;
use crate::services::Calendar;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn WorkEntryStore>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires the services around `store` using the business calendar and
    /// default origin from `config`.
    pub fn new(config: AppConfig, store: Arc<dyn WorkEntryStore>) -> Result<Self, AppConfigError> {
        let calendar = Calendar::new(config.business_offset()?);
        let services =
            handlers::AppServices::new(store.clone(), calendar, config.default_origin_site.clone());
        Ok(Self {
            config,
            store,
            services,
        })
    }
}

/// Versioned API routes, mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().nest(
        "/work-entries",
        handlers::work_entries::work_entry_routes().merge(handlers::reports::report_routes()),
    )
}

/// Full application router with request-id, access-log and trace layers.
/// CORS and compression are added by the binary.
pub fn app_router(state: AppState, access_log: Logger) -> Router {
    let logging_state = Arc::new(logging::LoggingState::new(access_log));

    Router::<AppState>::new()
        .route("/", get(|| async { "fcp-ledger up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn_with_state(
            logging_state,
            logging::logging_middleware,
        ))
        // Outermost so the access log and error bodies see the request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
