//! # Identity Zone API Handlers
//!
//! A minimal zone directory: providers can only be placed in, or mirrored
//! into, zones registered here.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use utoipa::ToSchema;

use crate::config::is_valid_zone_id;
use crate::error::{ApiError, not_found, validation_error};
use crate::models::identity_zone;
use crate::repositories::{IdentityZoneRepository, NewIdentityZone};
use crate::server::AppState;

/// Request payload for registering a zone
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateIdentityZoneRequest {
    /// Zone identifier
    #[schema(example = "tenant-a")]
    pub id: String,
    /// Display name
    #[schema(example = "Tenant A")]
    pub name: String,
    /// Subdomain used for zone selection, stored lowercased
    #[schema(example = "tenant-a")]
    pub subdomain: String,
}

/// Identity zone as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityZoneResponse {
    #[schema(example = "tenant-a")]
    pub id: String,
    #[schema(example = "Tenant A")]
    pub name: String,
    #[schema(example = "tenant-a")]
    pub subdomain: String,
    #[schema(example = "2025-11-10T09:00:00Z")]
    pub created_at: String,
}

impl From<identity_zone::Model> for IdentityZoneResponse {
    fn from(model: identity_zone::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            subdomain: model.subdomain,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

fn into_new_zone(request: CreateIdentityZoneRequest) -> Result<NewIdentityZone, ApiError> {
    let mut errors = Map::new();

    let id = request.id.trim().to_string();
    if !is_valid_zone_id(&id) {
        errors.insert(
            "id".into(),
            json!("Zone id must be 1-255 letters, digits, '.', '_' or '-'"),
        );
    }

    let name = request.name.trim().to_string();
    if name.is_empty() || name.len() > 255 {
        errors.insert("name".into(), json!("Name must be 1-255 characters"));
    }

    let subdomain = request.subdomain.trim().to_string();
    if !is_valid_zone_id(&subdomain) {
        errors.insert(
            "subdomain".into(),
            json!("Subdomain must be 1-255 letters, digits, '.', '_' or '-'"),
        );
    }

    if !errors.is_empty() {
        return Err(validation_error("Validation failed", errors.into()));
    }

    Ok(NewIdentityZone {
        id,
        name,
        subdomain,
    })
}

/// Register a new identity zone
#[utoipa::path(
    post,
    path = "/identity-zones",
    request_body = CreateIdentityZoneRequest,
    responses(
        (status = 201, description = "Zone created", body = IdentityZoneResponse, headers(
            ("Location", description = "URL of the created zone")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Zone id or subdomain already taken", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "identity-zones"
)]
pub async fn create_identity_zone(
    State(state): State<AppState>,
    payload: Result<Json<CreateIdentityZoneRequest>, JsonRejection>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<IdentityZoneResponse>), ApiError> {
    let Json(request) = payload?;
    let new_zone = into_new_zone(request)?;

    let zone = IdentityZoneRepository::new(&state.db)
        .create(new_zone)
        .await?;
    tracing::info!(zone_id = %zone.id, "Identity zone created");

    let location = format!("/identity-zones/{}", zone.id);
    Ok((StatusCode::CREATED, [("Location", location)], Json(zone.into())))
}

/// List registered zones
#[utoipa::path(
    get,
    path = "/identity-zones",
    responses(
        (status = 200, description = "All zones", body = [IdentityZoneResponse])
    ),
    tag = "identity-zones"
)]
pub async fn list_identity_zones(
    State(state): State<AppState>,
) -> Result<Json<Vec<IdentityZoneResponse>>, ApiError> {
    let zones = IdentityZoneRepository::new(&state.db).list().await?;
    Ok(Json(zones.into_iter().map(Into::into).collect()))
}

/// Get a zone by id
#[utoipa::path(
    get,
    path = "/identity-zones/{id}",
    params(
        ("id" = String, Path, description = "Zone id")
    ),
    responses(
        (status = 200, description = "Zone", body = IdentityZoneResponse),
        (status = 404, description = "Zone not found", body = ApiError)
    ),
    tag = "identity-zones"
)]
pub async fn get_identity_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<IdentityZoneResponse>, ApiError> {
    IdentityZoneRepository::new(&state.db)
        .find_by_id(&zone_id)
        .await?
        .map(|zone| Json(zone.into()))
        .ok_or_else(|| not_found(&format!("Identity zone '{}' not found", zone_id)))
}
