//! Failure taxonomy of the alias engine.

use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::is_unique_violation;

/// The specific alias rule a request violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AliasRule {
    #[error("alias_id and alias_zid must either both be set or both be empty")]
    IncompletePairing,
    #[error("alias_id is assigned by the registry and cannot be supplied for an unmirrored provider")]
    AliasIdNotAssignable,
    #[error("alias_zid must not reference the provider's own zone")]
    SelfReference,
    #[error("mirroring is only allowed between the root zone and one other zone")]
    RootZoneRequired,
    #[error("identity providers of this type cannot be mirrored")]
    TypeNotMirrorable,
    #[error("alias_id and alias_zid cannot be changed once a provider is mirrored")]
    AliasImmutable,
    #[error("alias_zid references an unknown zone")]
    UnknownZone,
}

impl AliasRule {
    /// Stable machine-readable name, used in error details and metric labels.
    pub fn code(self) -> &'static str {
        match self {
            AliasRule::IncompletePairing => "incomplete_pairing",
            AliasRule::AliasIdNotAssignable => "alias_id_not_assignable",
            AliasRule::SelfReference => "self_reference",
            AliasRule::RootZoneRequired => "root_zone_required",
            AliasRule::TypeNotMirrorable => "type_not_mirrorable",
            AliasRule::AliasImmutable => "alias_immutable",
            AliasRule::UnknownZone => "unknown_zone",
        }
    }
}

/// Errors returned by [`AliasEngine`](super::AliasEngine) operations.
#[derive(Debug, Error)]
pub enum AliasError {
    #[error("alias validation failed: {0}")]
    Validation(#[from] AliasRule),
    #[error("an identity provider with origin key '{origin_key}' already exists in zone '{zone_id}'")]
    Conflict { zone_id: String, origin_key: String },
    #[error("identity provider {id} not found in zone '{zone_id}'")]
    NotFound { zone_id: String, id: Uuid },
    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: DbErr,
    },
}

impl AliasError {
    /// Maps a store failure to `Internal`, logging it once here.
    pub(crate) fn internal(context: &'static str) -> impl FnOnce(DbErr) -> AliasError {
        move |err| {
            error!(error = ?err, context, "identity provider store operation failed");
            AliasError::Internal {
                context,
                source: err,
            }
        }
    }

    /// Like [`AliasError::internal`], but a unique-index violation on
    /// `(zone_id, origin_key)` becomes a `Conflict`.
    pub(crate) fn on_write(
        context: &'static str,
        zone_id: &str,
        origin_key: &str,
    ) -> impl FnOnce(DbErr) -> AliasError {
        let zone_id = zone_id.to_string();
        let origin_key = origin_key.to_string();
        move |err| {
            if is_unique_violation(&err) {
                AliasError::Conflict {
                    zone_id,
                    origin_key,
                }
            } else {
                AliasError::internal(context)(err)
            }
        }
    }
}
