//! # Zone Context
//!
//! Resolves which identity zone a request operates on. Callers select a zone
//! with `X-Identity-Zone-Id` or `X-Identity-Zone-Subdomain`; without either
//! header the request runs in the root zone.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::error::{ApiError, not_found, validation_error};
use crate::repositories::IdentityZoneRepository;
use crate::server::AppState;

pub const ZONE_ID_HEADER: &str = "X-Identity-Zone-Id";
pub const ZONE_SUBDOMAIN_HEADER: &str = "X-Identity-Zone-Subdomain";

/// The zone a request has been resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneContext {
    pub zone_id: String,
}

/// Middleware that resolves the zone headers and stores a [`ZoneContext`].
///
/// Unknown zones are rejected with 404 before any handler runs.
pub async fn zone_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let zone_id = resolve_zone(&state, request.headers()).await?;
    tracing::debug!(zone_id = %zone_id, "Resolved identity zone");

    request.extensions_mut().insert(ZoneContext { zone_id });
    Ok(next.run(request).await)
}

async fn resolve_zone(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let zones = IdentityZoneRepository::new(&state.db);

    if let Some(zone_id) = header_text(headers, ZONE_ID_HEADER)? {
        if zones.exists(&zone_id).await? {
            return Ok(zone_id);
        }
        return Err(not_found(&format!("Identity zone '{}' not found", zone_id)));
    }

    if let Some(subdomain) = header_text(headers, ZONE_SUBDOMAIN_HEADER)? {
        return match zones.find_by_subdomain(&subdomain).await? {
            Some(zone) => Ok(zone.id),
            None => Err(not_found(&format!(
                "Identity zone with subdomain '{}' not found",
                subdomain
            ))),
        };
    }

    Ok(state.engine.root_zone_id().to_string())
}

fn header_text(headers: &HeaderMap, name: &'static str) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| {
        validation_error(
            "Invalid zone header",
            serde_json::json!({ name: "Header must be valid UTF-8" }),
        )
    })?;

    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// OpenAPI header parameters for zone selection
#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Header)]
pub struct ZoneHeaders {
    /// Zone id to operate on; defaults to the root zone
    #[serde(rename = "X-Identity-Zone-Id")]
    #[param(rename = "X-Identity-Zone-Id")]
    pub zone_id: Option<String>,
    /// Zone subdomain, used when no zone id header is sent
    #[serde(rename = "X-Identity-Zone-Subdomain")]
    #[param(rename = "X-Identity-Zone-Subdomain")]
    pub zone_subdomain: Option<String>,
}

impl<S> FromRequestParts<S> for ZoneContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ZoneContext>()
            .cloned()
            .ok_or_else(|| {
                validation_error(
                    "Zone context missing",
                    serde_json::json!({ ZONE_ID_HEADER: "Zone context not present" }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasEngine;
    use crate::config::AppConfig;
    use crate::repositories::NewIdentityZone;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let zones = IdentityZoneRepository::new(&db);
        for (id, subdomain) in [("uaa", "uaa"), ("tenant-a", "acme")] {
            zones
                .create(NewIdentityZone {
                    id: id.to_string(),
                    name: id.to_string(),
                    subdomain: subdomain.to_string(),
                })
                .await
                .unwrap();
        }

        AppState {
            engine: AliasEngine::new(db.clone(), "uaa"),
            config: Arc::new(AppConfig::default()),
            db,
        }
    }

    async fn run_middleware(request: Request<Body>) -> Response {
        async fn handler(zone: ZoneContext) -> String {
            zone.zone_id
        }

        let state = test_state().await;
        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                zone_context_middleware,
            ))
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn defaults_to_root_zone() {
        let response = run_middleware(Request::builder().uri("/test").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "uaa");
    }

    #[tokio::test]
    async fn selects_zone_by_id() {
        let request = Request::builder()
            .uri("/test")
            .header(ZONE_ID_HEADER, "tenant-a")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "tenant-a");
    }

    #[tokio::test]
    async fn selects_zone_by_subdomain() {
        let request = Request::builder()
            .uri("/test")
            .header(ZONE_SUBDOMAIN_HEADER, "ACME")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "tenant-a");
    }

    #[tokio::test]
    async fn unknown_zone_returns_404() {
        let request = Request::builder()
            .uri("/test")
            .header(ZONE_ID_HEADER, "nowhere")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_subdomain_returns_404() {
        let request = Request::builder()
            .uri("/test")
            .header(ZONE_SUBDOMAIN_HEADER, "nowhere")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
