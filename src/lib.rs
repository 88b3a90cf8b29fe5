//! FarmSense API Library
//!
//! Farm, livestock and treatment records with per-farm access control,
//! monthly AMU/feed/yield charts and a generative-model bridge.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod notifications;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use http::HeaderValue;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    handlers::AppServices,
    notifications::Notifier,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ServiceError> {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let services = AppServices::new(db.clone(), notifier, &config)?;
        Ok(Self {
            db,
            config,
            auth,
            services,
        })
    }
}

/// Every `/api` route.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/farms", handlers::farms::farm_routes())
        .nest("/labourers", handlers::labourers::labourer_routes())
        .nest("/livestock", handlers::livestock::livestock_routes())
        .nest("/drugs", handlers::drugs::drug_routes())
        .nest("/feeds", handlers::feeds::feed_routes())
        .nest("/health-records", handlers::health_records::health_record_routes())
        .nest("/amu-records", handlers::amu_records::amu_record_routes())
        .nest("/feed-records", handlers::feed_records::feed_record_routes())
        .nest("/yield-records", handlers::yield_records::yield_record_routes())
        .nest("/users", handlers::users::user_routes())
        .merge(handlers::insights::insight_routes())
}

/// CORS from `cors_allowed_origins`, else permissive where allowed.
pub fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, ServiceError> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "no CORS origins configured, allowing any origin ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        Err(ServiceError::InternalError(
            "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
                .to_string(),
        ))
    }
}

/// Full application router with the HTTP middleware stack applied.
pub fn build_router(state: AppState) -> Result<Router, ServiceError> {
    let cors = cors_layer(&state.config)?;
    let timeout = state.config.request_timeout();

    Ok(Router::new()
        .route("/", get(|| async { "farmsense-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api", api_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        // x-request-id on every request and response
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state))
}
