//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations and a few registered zones for testing purposes.

use anyhow::Result;
use idp_registry::alias::{AliasEngine, ProviderDraft};
use idp_registry::models::{ProviderType, identity_zone};
use idp_registry::repositories::{IdentityZoneRepository, NewIdentityZone};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::json;

/// Root zone id used throughout the tests.
#[allow(dead_code)]
pub const ROOT_ZONE: &str = "uaa";
/// Custom zone every fixture database contains.
#[allow(dead_code)]
pub const CUSTOM_ZONE: &str = "tenant-a";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// # Returns
///
/// Returns a Result containing the database connection
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    // Create in-memory SQLite database
    let db = Database::connect("sqlite::memory:").await?;

    // Run all migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Registers a zone whose name and subdomain equal its id.
#[allow(dead_code)]
pub async fn create_zone(db: &DatabaseConnection, zone_id: &str) -> Result<identity_zone::Model> {
    let zone = IdentityZoneRepository::new(db)
        .create(NewIdentityZone {
            id: zone_id.to_string(),
            name: zone_id.to_string(),
            subdomain: zone_id.to_string(),
        })
        .await?;
    Ok(zone)
}

/// Database with the root zone and [`CUSTOM_ZONE`] registered, plus an engine on it.
#[allow(dead_code)]
pub async fn setup_engine() -> Result<(DatabaseConnection, AliasEngine)> {
    let db = setup_test_db().await?;
    create_zone(&db, ROOT_ZONE).await?;
    create_zone(&db, CUSTOM_ZONE).await?;

    let engine = AliasEngine::new(db.clone(), ROOT_ZONE);
    Ok((db, engine))
}

/// A SAML provider draft with the given origin key and no alias fields.
#[allow(dead_code)]
pub fn saml_draft(origin_key: &str) -> ProviderDraft {
    ProviderDraft {
        origin_key: origin_key.to_string(),
        name: format!("{origin_key} provider"),
        provider_type: ProviderType::Saml,
        config: json!({
            "metaDataLocation": "https://idp.example.com/metadata",
            "zoneId": ROOT_ZONE,
        }),
        active: true,
        alias_id: None,
        alias_zid: None,
    }
}

/// Same as [`saml_draft`] but requesting a mirror in `alias_zid`.
#[allow(dead_code)]
pub fn mirrored_draft(origin_key: &str, alias_zid: &str) -> ProviderDraft {
    ProviderDraft {
        alias_zid: Some(alias_zid.to_string()),
        ..saml_draft(origin_key)
    }
}
