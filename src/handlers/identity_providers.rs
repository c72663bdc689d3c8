//! # Identity Provider API Handlers
//!
//! CRUD endpoints for identity providers in the zone selected by the zone
//! context middleware. Writes go through the alias engine so mirrored pairs
//! stay consistent.

use std::sync::LazyLock;

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::alias::ProviderDraft;
use crate::error::{ApiError, validation_error};
use crate::models::{ProviderType, identity_provider};
use crate::server::AppState;
use crate::zone_context::{ZoneContext, ZoneHeaders};

const MAX_FIELD_LENGTH: usize = 255;

static ORIGIN_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+$").expect("ORIGIN_KEY_REGEX is a valid regex pattern")
});

/// Request payload for creating or updating an identity provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityProviderRequest {
    /// Key matching the provider to authentication flows, unique per zone
    #[schema(example = "corp-saml")]
    pub origin_key: String,
    /// Display name
    #[schema(example = "Corporate SAML")]
    pub name: String,
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Type-specific definition (JSON object, defaults to empty)
    #[schema(value_type = Object)]
    pub config: Option<Value>,
    /// Whether the provider is enabled (defaults to true)
    #[serde(default = "default_active")]
    pub active: bool,
    /// Id of the mirrored counterpart; only echoed back on updates
    pub alias_id: Option<String>,
    /// Zone to mirror into
    #[schema(example = "tenant-a")]
    pub alias_zid: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Identity provider as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityProviderResponse {
    #[schema(value_type = String, example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "uaa")]
    pub identity_zone_id: String,
    pub origin_key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[schema(value_type = Object)]
    pub config: Value,
    pub active: bool,
    #[schema(value_type = Option<String>)]
    pub alias_id: Option<Uuid>,
    pub alias_zid: Option<String>,
    #[schema(example = "2025-11-10T09:00:00Z")]
    pub created_at: String,
    #[schema(example = "2025-11-10T09:00:00Z")]
    pub updated_at: String,
}

impl From<identity_provider::Model> for IdentityProviderResponse {
    fn from(model: identity_provider::Model) -> Self {
        Self {
            id: model.id,
            identity_zone_id: model.identity_zone_id,
            origin_key: model.origin_key,
            name: model.name,
            provider_type: model.provider_type,
            config: model.config,
            active: model.active,
            alias_id: model.alias_id,
            alias_zid: model.alias_zid,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for provider listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListIdentityProvidersQuery {
    /// Only return enabled providers
    #[serde(default)]
    pub active_only: bool,
}

/// Checks the request body and turns it into an engine draft.
fn into_draft(request: IdentityProviderRequest) -> Result<ProviderDraft, ApiError> {
    let mut errors = Map::new();

    let origin_key = request.origin_key.trim().to_string();
    if origin_key.is_empty() {
        errors.insert("origin_key".into(), json!("Origin key is required"));
    } else if origin_key.len() > MAX_FIELD_LENGTH {
        errors.insert(
            "origin_key".into(),
            json!(format!("Origin key cannot exceed {} characters", MAX_FIELD_LENGTH)),
        );
    } else if !ORIGIN_KEY_REGEX.is_match(&origin_key) {
        errors.insert(
            "origin_key".into(),
            json!("Origin key may only contain letters, digits, '.', '_' and '-'"),
        );
    }

    let name = request.name.trim().to_string();
    if name.is_empty() {
        errors.insert("name".into(), json!("Name is required"));
    } else if name.len() > MAX_FIELD_LENGTH {
        errors.insert(
            "name".into(),
            json!(format!("Name cannot exceed {} characters", MAX_FIELD_LENGTH)),
        );
    }

    let config = match request.config {
        None | Some(Value::Null) => json!({}),
        Some(config @ Value::Object(_)) => config,
        Some(_) => {
            errors.insert("config".into(), json!("Config must be a JSON object"));
            Value::Null
        }
    };

    if !errors.is_empty() {
        return Err(validation_error("Validation failed", Value::Object(errors)));
    }

    Ok(ProviderDraft {
        origin_key,
        name,
        provider_type: request.provider_type,
        config,
        active: request.active,
        alias_id: request.alias_id,
        alias_zid: request.alias_zid,
    })
}

/// Create an identity provider, mirroring it when `alias_zid` is set
#[utoipa::path(
    post,
    path = "/identity-providers",
    params(ZoneHeaders),
    request_body = IdentityProviderRequest,
    responses(
        (status = 201, description = "Identity provider created", body = IdentityProviderResponse, headers(
            ("Location", description = "URL of the created provider")
        )),
        (status = 400, description = "Malformed request body", body = ApiError),
        (status = 404, description = "Zone not found", body = ApiError),
        (status = 409, description = "Origin key already in use in this or the mirror zone", body = ApiError),
        (status = 422, description = "Alias rule violated", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "identity-providers"
)]
pub async fn create_identity_provider(
    State(state): State<AppState>,
    zone: ZoneContext,
    payload: Result<Json<IdentityProviderRequest>, JsonRejection>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 1],
        Json<IdentityProviderResponse>,
    ),
    ApiError,
> {
    let Json(request) = payload?;
    let draft = into_draft(request)?;

    let created = state.engine.create_provider(&zone.zone_id, draft).await?;
    let location = format!("/identity-providers/{}", created.id);

    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(created.into()),
    ))
}

/// List identity providers in the zone
#[utoipa::path(
    get,
    path = "/identity-providers",
    params(ZoneHeaders, ListIdentityProvidersQuery),
    responses(
        (status = 200, description = "Identity providers in the zone", body = [IdentityProviderResponse]),
        (status = 404, description = "Zone not found", body = ApiError)
    ),
    tag = "identity-providers"
)]
pub async fn list_identity_providers(
    State(state): State<AppState>,
    zone: ZoneContext,
    Query(query): Query<ListIdentityProvidersQuery>,
) -> Result<Json<Vec<IdentityProviderResponse>>, ApiError> {
    let providers = state
        .engine
        .list_providers(&zone.zone_id, query.active_only)
        .await?;

    Ok(Json(providers.into_iter().map(Into::into).collect()))
}

/// Get an identity provider by id
#[utoipa::path(
    get,
    path = "/identity-providers/{id}",
    params(
        ZoneHeaders,
        ("id" = Uuid, Path, description = "Identity provider UUID")
    ),
    responses(
        (status = 200, description = "Identity provider", body = IdentityProviderResponse),
        (status = 404, description = "Provider or zone not found", body = ApiError)
    ),
    tag = "identity-providers"
)]
pub async fn get_identity_provider(
    State(state): State<AppState>,
    zone: ZoneContext,
    Path(id): Path<Uuid>,
) -> Result<Json<IdentityProviderResponse>, ApiError> {
    let provider = state.engine.get_provider(&zone.zone_id, id).await?;
    Ok(Json(provider.into()))
}

/// Update an identity provider and propagate shared fields to its mirror
#[utoipa::path(
    put,
    path = "/identity-providers/{id}",
    params(
        ZoneHeaders,
        ("id" = Uuid, Path, description = "Identity provider UUID")
    ),
    request_body = IdentityProviderRequest,
    responses(
        (status = 200, description = "Identity provider updated", body = IdentityProviderResponse),
        (status = 400, description = "Malformed request body", body = ApiError),
        (status = 404, description = "Provider or zone not found", body = ApiError),
        (status = 409, description = "Origin key already in use in this or the mirror zone", body = ApiError),
        (status = 422, description = "Alias rule violated", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "identity-providers"
)]
pub async fn update_identity_provider(
    State(state): State<AppState>,
    zone: ZoneContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<IdentityProviderRequest>, JsonRejection>,
) -> Result<Json<IdentityProviderResponse>, ApiError> {
    let Json(request) = payload?;
    let draft = into_draft(request)?;

    let updated = state
        .engine
        .update_provider(&zone.zone_id, id, draft)
        .await?;
    Ok(Json(updated.into()))
}

/// Delete an identity provider together with its mirror
///
/// Deleting a provider that is already gone answers 204.
#[utoipa::path(
    delete,
    path = "/identity-providers/{id}",
    params(
        ZoneHeaders,
        ("id" = Uuid, Path, description = "Identity provider UUID")
    ),
    responses(
        (status = 200, description = "Deleted identity provider", body = IdentityProviderResponse),
        (status = 204, description = "Provider already absent"),
        (status = 404, description = "Zone not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "identity-providers"
)]
pub async fn delete_identity_provider(
    State(state): State<AppState>,
    zone: ZoneContext,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let response = match state.engine.delete_provider(&zone.zone_id, id).await? {
        Some(deleted) => {
            (StatusCode::OK, Json(IdentityProviderResponse::from(deleted))).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
