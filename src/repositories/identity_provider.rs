//! # Identity Provider Repository
//!
//! Zone-scoped data access for identity providers. The repository borrows any
//! SeaORM connection, so the same calls run against the pool or inside a
//! `DatabaseTransaction` when several writes must commit together.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::models::identity_provider::{self, Entity as IdentityProvider};

/// Repository for identity provider records
pub struct IdentityProviderRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C> IdentityProviderRepository<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Finds a provider by id within a zone
    pub async fn find_by_id(
        &self,
        zone_id: &str,
        id: Uuid,
    ) -> Result<Option<identity_provider::Model>, DbErr> {
        IdentityProvider::find_by_id(id)
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id))
            .one(self.conn)
            .await
    }

    /// Finds a provider by its unique `(zone, origin_key)` pair
    pub async fn find_by_origin(
        &self,
        zone_id: &str,
        origin_key: &str,
    ) -> Result<Option<identity_provider::Model>, DbErr> {
        IdentityProvider::find()
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id))
            .filter(identity_provider::Column::OriginKey.eq(origin_key))
            .one(self.conn)
            .await
    }

    /// Lists providers in a zone ordered by creation time then id
    pub async fn list_by_zone(
        &self,
        zone_id: &str,
        active_only: bool,
    ) -> Result<Vec<identity_provider::Model>, DbErr> {
        let mut query = IdentityProvider::find()
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id));

        if active_only {
            query = query.filter(identity_provider::Column::Active.eq(true));
        }

        query
            .order_by_asc(identity_provider::Column::CreatedAt)
            .order_by_asc(identity_provider::Column::Id)
            .all(self.conn)
            .await
    }

    /// Inserts a new provider. The id must be set by the caller.
    pub async fn create(
        &self,
        provider: identity_provider::ActiveModel,
    ) -> Result<identity_provider::Model, DbErr> {
        provider.insert(self.conn).await
    }

    /// Writes the changed columns of `provider`, scoped to `zone_id`.
    ///
    /// Fails with `DbErr::RecordNotUpdated` when the row is not in that zone.
    pub async fn update(
        &self,
        zone_id: &str,
        provider: identity_provider::ActiveModel,
    ) -> Result<identity_provider::Model, DbErr> {
        IdentityProvider::update(provider)
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id))
            .exec(self.conn)
            .await
    }

    /// Deletes a provider by id within a zone, returning the number of rows removed
    pub async fn delete_by_id(&self, zone_id: &str, id: Uuid) -> Result<u64, DbErr> {
        let result = IdentityProvider::delete_by_id(id)
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes a provider by origin key within a zone.
    ///
    /// Bypasses the alias engine entirely: the counterpart of a mirrored
    /// provider is left pointing at a row that no longer exists.
    pub async fn delete_by_origin(&self, zone_id: &str, origin_key: &str) -> Result<u64, DbErr> {
        let result = IdentityProvider::delete_many()
            .filter(identity_provider::Column::IdentityZoneId.eq(zone_id))
            .filter(identity_provider::Column::OriginKey.eq(origin_key))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
