//! # Alias Engine
//!
//! Keeps mirrored identity provider pairs consistent. A provider in one zone
//! may have exactly one counterpart in another zone; one side of every pair
//! lives in the root zone. The engine validates alias fields, then performs the
//! local write and the counterpart write inside a single database transaction
//! so either both are visible or neither is.
//!
//! Dangling references (a counterpart removed behind the engine's back) are
//! tolerated on delete and repaired on the next update.

mod error;
pub mod synchronizer;
pub mod validator;

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::Value;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub use error::{AliasError, AliasRule};
pub use synchronizer::MirrorSynchronizer;
pub use validator::{ValidationContext, has_text, validate};

use crate::models::{
    ProviderType,
    identity_provider::{self, rezone_config},
};
use crate::repositories::{IdentityProviderRepository, IdentityZoneRepository};

/// Requested state of a provider on create or update.
///
/// `alias_id` stays a string because callers may send anything there, and
/// the validator has to reject it rather than fail to parse it.
#[derive(Debug, Clone)]
pub struct ProviderDraft {
    pub origin_key: String,
    pub name: String,
    pub provider_type: ProviderType,
    pub config: Value,
    pub active: bool,
    pub alias_id: Option<String>,
    pub alias_zid: Option<String>,
}

impl ProviderDraft {
    /// Target zone requested for mirroring, blank treated as absent.
    pub fn requested_alias_zone(&self) -> Option<&str> {
        has_text(self.alias_zid.as_deref())
    }
}

/// Entry point for provider writes that must respect alias invariants.
#[derive(Clone)]
pub struct AliasEngine {
    db: DatabaseConnection,
    root_zone_id: Arc<str>,
}

impl AliasEngine {
    pub fn new(db: DatabaseConnection, root_zone_id: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            root_zone_id: root_zone_id.into(),
        }
    }

    pub fn root_zone_id(&self) -> &str {
        &self.root_zone_id
    }

    /// Creates a provider in `zone_id`, and its mirror when `alias_zid` is set.
    #[instrument(skip(self, draft), fields(origin_key = %draft.origin_key))]
    pub async fn create_provider(
        &self,
        zone_id: &str,
        draft: ProviderDraft,
    ) -> Result<identity_provider::Model, AliasError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(AliasError::internal("begin create transaction"))?;

        self.check(&txn, zone_id, &draft, None).await?;

        let providers = IdentityProviderRepository::new(&txn);
        let now = Utc::now();
        let record = identity_provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            identity_zone_id: Set(zone_id.to_string()),
            origin_key: Set(draft.origin_key.clone()),
            provider_type: Set(draft.provider_type),
            name: Set(draft.name.clone()),
            config: Set(rezone_config(&draft.config, zone_id)),
            active: Set(draft.active),
            alias_id: Set(None),
            alias_zid: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let mut created = providers
            .create(record)
            .await
            .map_err(AliasError::on_write(
                "create provider",
                zone_id,
                &draft.origin_key,
            ))?;

        if let Some(target_zone) = draft.requested_alias_zone() {
            created = MirrorSynchronizer::new(&txn)
                .ensure_mirror(created, target_zone)
                .await?;
        }

        txn.commit()
            .await
            .map_err(AliasError::internal("commit create transaction"))?;

        info!(
            provider_id = %created.id,
            zone_id,
            mirrored = created.is_mirrored(),
            "Created identity provider"
        );
        Ok(created)
    }

    /// Updates a provider and keeps its mirror in step.
    ///
    /// An unmirrored provider becomes mirrored when `alias_zid` is set for the
    /// first time. A mirrored provider whose counterpart disappeared gets a
    /// fresh counterpart and a new `alias_id`.
    #[instrument(skip(self, draft), fields(origin_key = %draft.origin_key))]
    pub async fn update_provider(
        &self,
        zone_id: &str,
        id: Uuid,
        draft: ProviderDraft,
    ) -> Result<identity_provider::Model, AliasError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(AliasError::internal("begin update transaction"))?;

        let providers = IdentityProviderRepository::new(&txn);
        let existing = providers
            .find_by_id(zone_id, id)
            .await
            .map_err(AliasError::internal("load provider"))?
            .ok_or_else(|| AliasError::NotFound {
                zone_id: zone_id.to_string(),
                id,
            })?;

        self.check(&txn, zone_id, &draft, Some(&existing)).await?;

        let was_mirrored = existing.is_mirrored();
        let mut changes: identity_provider::ActiveModel = existing.into();
        changes.origin_key = Set(draft.origin_key.clone());
        changes.provider_type = Set(draft.provider_type);
        changes.name = Set(draft.name.clone());
        changes.config = Set(rezone_config(&draft.config, zone_id));
        changes.active = Set(draft.active);
        changes.updated_at = Set(Utc::now().into());

        let updated = providers
            .update(zone_id, changes)
            .await
            .map_err(AliasError::on_write(
                "update provider",
                zone_id,
                &draft.origin_key,
            ))?;

        let synchronizer = MirrorSynchronizer::new(&txn);
        let updated = match draft.requested_alias_zone() {
            _ if was_mirrored => synchronizer.propagate(updated).await?,
            Some(target_zone) => synchronizer.ensure_mirror(updated, target_zone).await?,
            None => updated,
        };

        txn.commit()
            .await
            .map_err(AliasError::internal("commit update transaction"))?;

        info!(
            provider_id = %updated.id,
            zone_id,
            mirrored = updated.is_mirrored(),
            "Updated identity provider"
        );
        Ok(updated)
    }

    /// Deletes a provider together with its counterpart, if one still exists.
    ///
    /// Returns the deleted record as it was before deletion, or `None` when
    /// the zone holds no such provider any more. Deleting twice is therefore
    /// not an error; only an unknown zone is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete_provider(
        &self,
        zone_id: &str,
        id: Uuid,
    ) -> Result<Option<identity_provider::Model>, AliasError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(AliasError::internal("begin delete transaction"))?;

        let providers = IdentityProviderRepository::new(&txn);
        let Some(existing) = providers
            .find_by_id(zone_id, id)
            .await
            .map_err(AliasError::internal("load provider"))?
        else {
            let zone_exists = IdentityZoneRepository::new(&txn)
                .exists(zone_id)
                .await
                .map_err(AliasError::internal("lookup zone"))?;
            if !zone_exists {
                return Err(AliasError::NotFound {
                    zone_id: zone_id.to_string(),
                    id,
                });
            }
            debug!(provider_id = %id, zone_id, "Provider already absent, nothing to delete");
            return Ok(None);
        };

        providers
            .delete_by_id(zone_id, id)
            .await
            .map_err(AliasError::internal("delete provider"))?;

        let mirror_removed = MirrorSynchronizer::new(&txn)
            .cascade_delete(&existing)
            .await?;

        txn.commit()
            .await
            .map_err(AliasError::internal("commit delete transaction"))?;

        info!(
            provider_id = %id,
            zone_id,
            mirror_removed,
            "Deleted identity provider"
        );
        Ok(Some(existing))
    }

    pub async fn get_provider(
        &self,
        zone_id: &str,
        id: Uuid,
    ) -> Result<identity_provider::Model, AliasError> {
        IdentityProviderRepository::new(&self.db)
            .find_by_id(zone_id, id)
            .await
            .map_err(AliasError::internal("load provider"))?
            .ok_or_else(|| AliasError::NotFound {
                zone_id: zone_id.to_string(),
                id,
            })
    }

    pub async fn list_providers(
        &self,
        zone_id: &str,
        active_only: bool,
    ) -> Result<Vec<identity_provider::Model>, AliasError> {
        IdentityProviderRepository::new(&self.db)
            .list_by_zone(zone_id, active_only)
            .await
            .map_err(AliasError::internal("list providers"))
    }

    /// Resolves the target zone and runs the validator.
    async fn check<C: ConnectionTrait>(
        &self,
        conn: &C,
        zone_id: &str,
        draft: &ProviderDraft,
        existing: Option<&identity_provider::Model>,
    ) -> Result<(), AliasError> {
        let target_zone_exists = match draft.requested_alias_zone() {
            Some(target_zone) => IdentityZoneRepository::new(conn)
                .exists(target_zone)
                .await
                .map_err(AliasError::internal("lookup alias zone"))?,
            None => false,
        };

        let ctx = ValidationContext {
            zone_id,
            root_zone_id: &self.root_zone_id,
            target_zone_exists,
        };

        validate(draft, existing, &ctx).map_err(|rule| {
            counter!("idp_alias_validation_rejected_total", "rule" => rule.code()).increment(1);
            info!(zone_id, rule = rule.code(), "Rejected alias request");
            AliasError::Validation(rule)
        })
    }
}
