//! # Server Configuration
//!
//! This module contains the server setup and configuration for the registry API.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::alias::AliasEngine;
use crate::config::AppConfig;
use crate::handlers::{self, identity_providers, identity_zones};
use crate::telemetry::trace_context_middleware;
use crate::zone_context::zone_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub engine: AliasEngine,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let engine = AliasEngine::new(db.clone(), config.root_zone_id.as_str());
        Self {
            db,
            config: Arc::new(config),
            engine,
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Provider routes run inside the zone resolved from the request headers
    let provider_routes = Router::new()
        .route(
            "/identity-providers",
            get(identity_providers::list_identity_providers)
                .post(identity_providers::create_identity_provider),
        )
        .route(
            "/identity-providers/{id}",
            get(identity_providers::get_identity_provider)
                .put(identity_providers::update_identity_provider)
                .delete(identity_providers::delete_identity_provider),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            zone_context_middleware,
        ));

    let zone_routes = Router::new()
        .route(
            "/identity-zones",
            get(identity_zones::list_identity_zones).post(identity_zones::create_identity_zone),
        )
        .route("/identity-zones/{id}", get(identity_zones::get_identity_zone));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(provider_routes)
        .merge(zone_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(trace_context_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::identity_providers::create_identity_provider,
        crate::handlers::identity_providers::list_identity_providers,
        crate::handlers::identity_providers::get_identity_provider,
        crate::handlers::identity_providers::update_identity_provider,
        crate::handlers::identity_providers::delete_identity_provider,
        crate::handlers::identity_zones::create_identity_zone,
        crate::handlers::identity_zones::list_identity_zones,
        crate::handlers::identity_zones::get_identity_zone,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::HealthStatus,
            crate::models::ProviderType,
            crate::error::ApiError,
            crate::handlers::identity_providers::IdentityProviderRequest,
            crate::handlers::identity_providers::IdentityProviderResponse,
            crate::handlers::identity_zones::CreateIdentityZoneRequest,
            crate::handlers::identity_zones::IdentityZoneResponse,
        )
    ),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "identity-providers", description = "Identity providers and cross-zone mirroring"),
        (name = "identity-zones", description = "Identity zone directory"),
    ),
    info(
        title = "IdP Registry API",
        description = "Identity provider registry with cross-zone alias mirroring",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_provider_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/identity-providers"));
        assert!(paths.iter().any(|p| p.as_str() == "/identity-providers/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/identity-zones/{id}"));
    }
}
