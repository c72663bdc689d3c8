//! Mirror propagation between the two halves of an alias pair.
//!
//! Every method expects to run on an open transaction: the synchronizer issues
//! several writes per call and relies on the caller to commit or drop them
//! together.

use chrono::Utc;
use metrics::counter;
use sea_orm::{ConnectionTrait, Set};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AliasError;
use crate::models::identity_provider::{self, rezone_config};
use crate::repositories::IdentityProviderRepository;

pub struct MirrorSynchronizer<'a, C> {
    providers: IdentityProviderRepository<'a, C>,
}

impl<'a, C> MirrorSynchronizer<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self {
            providers: IdentityProviderRepository::new(conn),
        }
    }

    /// Creates the counterpart of `original` in `target_zone` and links both.
    ///
    /// A record in the target zone with the same origin key is only accepted
    /// when it already points back at `original`; anything else is a conflict.
    /// Returns `original` with its alias columns set to the mirror.
    pub async fn ensure_mirror(
        &self,
        original: identity_provider::Model,
        target_zone: &str,
    ) -> Result<identity_provider::Model, AliasError> {
        let occupant = self
            .providers
            .find_by_origin(target_zone, &original.origin_key)
            .await
            .map_err(AliasError::internal("lookup mirror origin"))?;

        let mirror = match occupant {
            Some(existing) if points_back_at(&existing, &original) => {
                info!(
                    provider_id = %original.id,
                    mirror_id = %existing.id,
                    target_zone,
                    "Re-linking orphaned mirror"
                );
                self.sync_shared_fields(existing, &original).await?
            }
            Some(existing) => {
                warn!(
                    provider_id = %original.id,
                    occupant_id = %existing.id,
                    target_zone,
                    origin_key = %original.origin_key,
                    "Origin key already taken in mirror zone"
                );
                return Err(AliasError::Conflict {
                    zone_id: target_zone.to_string(),
                    origin_key: original.origin_key,
                });
            }
            None => self.insert_mirror(&original, target_zone).await?,
        };

        let original_zone = original.identity_zone_id.clone();
        let mut linked: identity_provider::ActiveModel = original.into();
        linked.alias_id = Set(Some(mirror.id));
        linked.alias_zid = Set(Some(target_zone.to_string()));
        linked.updated_at = Set(Utc::now().into());

        self.providers
            .update(&original_zone, linked)
            .await
            .map_err(AliasError::internal("link provider to mirror"))
    }

    /// Pushes the shared fields of an already-mirrored `original` to its
    /// counterpart, recreating the counterpart when it has gone missing.
    pub async fn propagate(
        &self,
        original: identity_provider::Model,
    ) -> Result<identity_provider::Model, AliasError> {
        let Some((alias_zid, alias_id)) = original
            .alias_target()
            .map(|(zone, id)| (zone.to_string(), id))
        else {
            return Ok(original);
        };

        let mirror = self
            .providers
            .find_by_id(&alias_zid, alias_id)
            .await
            .map_err(AliasError::internal("lookup mirror"))?;

        match mirror {
            Some(mirror) => {
                self.sync_shared_fields(mirror, &original).await?;
                Ok(original)
            }
            None => {
                info!(
                    provider_id = %original.id,
                    stale_alias_id = %alias_id,
                    alias_zid = %alias_zid,
                    "Mirror missing, recreating it"
                );
                let healed = self.ensure_mirror(original, &alias_zid).await?;
                counter!("idp_mirror_self_healed_total").increment(1);
                Ok(healed)
            }
        }
    }

    /// Removes the counterpart of a deleted provider. A counterpart that is
    /// already gone counts as done.
    pub async fn cascade_delete(
        &self,
        deleted: &identity_provider::Model,
    ) -> Result<bool, AliasError> {
        let Some((alias_zid, alias_id)) = deleted.alias_target() else {
            return Ok(false);
        };

        let removed = self
            .providers
            .delete_by_id(alias_zid, alias_id)
            .await
            .map_err(AliasError::internal("delete mirror"))?;

        if removed == 0 {
            debug!(
                provider_id = %deleted.id,
                alias_id = %alias_id,
                alias_zid,
                "Mirror already absent, nothing to cascade"
            );
            return Ok(false);
        }

        counter!("idp_mirror_cascade_deleted_total").increment(1);
        info!(
            provider_id = %deleted.id,
            alias_id = %alias_id,
            alias_zid,
            "Deleted mirrored identity provider"
        );
        Ok(true)
    }

    async fn insert_mirror(
        &self,
        original: &identity_provider::Model,
        target_zone: &str,
    ) -> Result<identity_provider::Model, AliasError> {
        let now = Utc::now();
        let mirror = identity_provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            identity_zone_id: Set(target_zone.to_string()),
            origin_key: Set(original.origin_key.clone()),
            provider_type: Set(original.provider_type),
            name: Set(original.name.clone()),
            config: Set(rezone_config(&original.config, target_zone)),
            active: Set(original.active),
            alias_id: Set(Some(original.id)),
            alias_zid: Set(Some(original.identity_zone_id.clone())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let mirror = self
            .providers
            .create(mirror)
            .await
            .map_err(AliasError::on_write(
                "create mirror",
                target_zone,
                &original.origin_key,
            ))?;

        counter!(
            "idp_mirror_created_total",
            "provider_type" => original.provider_type.as_str()
        )
        .increment(1);
        info!(
            provider_id = %original.id,
            mirror_id = %mirror.id,
            target_zone,
            "Created mirrored identity provider"
        );

        Ok(mirror)
    }

    async fn sync_shared_fields(
        &self,
        mirror: identity_provider::Model,
        source: &identity_provider::Model,
    ) -> Result<identity_provider::Model, AliasError> {
        let zone_id = mirror.identity_zone_id.clone();
        let mut active: identity_provider::ActiveModel = mirror.into();
        active.origin_key = Set(source.origin_key.clone());
        active.provider_type = Set(source.provider_type);
        active.name = Set(source.name.clone());
        active.config = Set(rezone_config(&source.config, &zone_id));
        active.active = Set(source.active);
        active.alias_id = Set(Some(source.id));
        active.alias_zid = Set(Some(source.identity_zone_id.clone()));
        active.updated_at = Set(Utc::now().into());

        self.providers
            .update(&zone_id, active)
            .await
            .map_err(AliasError::on_write(
                "update mirror",
                &zone_id,
                &source.origin_key,
            ))
    }
}

fn points_back_at(candidate: &identity_provider::Model, original: &identity_provider::Model) -> bool {
    candidate.alias_id == Some(original.id)
        && candidate.alias_zid.as_deref() == Some(original.identity_zone_id.as_str())
}
