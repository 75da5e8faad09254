//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (store, cache, scheduler, client)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use pdfrelay_conversion::ConversionConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

#[cfg(test)]
mod tests;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: ConversionConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(build_router(services))
}

/// Like [`build_app`], but with the status cache on a shared Redis
/// instance.
#[cfg(feature = "redis")]
pub async fn build_app_with_redis(
    config: ConversionConfig,
    redis_url: &str,
) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services_with_redis(config, redis_url).await?);
    Ok(build_router(services))
}

/// Assemble the router around an existing service set (tests inject their
/// own collaborators here).
pub fn build_router(services: Arc<services::AppServices>) -> Router {
    let app = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::viewer_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(app)
}
