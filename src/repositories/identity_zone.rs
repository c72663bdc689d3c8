//! # Identity Zone Repository
//!
//! Minimal zone directory: existence checks for the alias engine, subdomain
//! lookup for request routing, and plain create/list.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::models::identity_zone::{self, Entity as IdentityZone};

/// Input for creating a zone
#[derive(Debug, Clone)]
pub struct NewIdentityZone {
    pub id: String,
    pub name: String,
    pub subdomain: String,
}

/// Repository for identity zone records
pub struct IdentityZoneRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C> IdentityZoneRepository<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Returns true when a zone with this id exists
    pub async fn exists(&self, zone_id: &str) -> Result<bool, DbErr> {
        let count = IdentityZone::find()
            .filter(identity_zone::Column::Id.eq(zone_id))
            .count(self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn find_by_id(&self, zone_id: &str) -> Result<Option<identity_zone::Model>, DbErr> {
        IdentityZone::find_by_id(zone_id.to_string())
            .one(self.conn)
            .await
    }

    pub async fn find_by_subdomain(
        &self,
        subdomain: &str,
    ) -> Result<Option<identity_zone::Model>, DbErr> {
        IdentityZone::find()
            .filter(identity_zone::Column::Subdomain.eq(subdomain.to_lowercase()))
            .one(self.conn)
            .await
    }

    /// Lists zones ordered by id
    pub async fn list(&self) -> Result<Vec<identity_zone::Model>, DbErr> {
        IdentityZone::find()
            .order_by_asc(identity_zone::Column::Id)
            .all(self.conn)
            .await
    }

    /// Creates a zone; the subdomain is stored lowercased
    pub async fn create(&self, zone: NewIdentityZone) -> Result<identity_zone::Model, DbErr> {
        identity_zone::ActiveModel {
            id: Set(zone.id),
            name: Set(zone.name),
            subdomain: Set(zone.subdomain.to_lowercase()),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.conn)
        .await
    }
}
