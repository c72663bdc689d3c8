//! Root zone seeding
//!
//! Ensures the configured root zone exists so providers can be created in it
//! and mirrored out of it on a fresh database.

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::models::identity_zone;
use crate::repositories::{IdentityZoneRepository, NewIdentityZone};

/// Creates the root zone row if it is missing.
///
/// The zone's name and subdomain default to its id. Running this again is a
/// no-op, so it is safe on every startup.
pub async fn seed_root_zone(
    db: &DatabaseConnection,
    root_zone_id: &str,
) -> Result<identity_zone::Model> {
    let zones = IdentityZoneRepository::new(db);

    if let Some(existing) = zones
        .find_by_id(root_zone_id)
        .await
        .with_context(|| format!("Failed to look up root zone '{}'", root_zone_id))?
    {
        log::info!("Root zone '{}' already exists, skipping", root_zone_id);
        return Ok(existing);
    }

    log::info!("Creating root zone: {}", root_zone_id);
    let zone = zones
        .create(NewIdentityZone {
            id: root_zone_id.to_string(),
            name: root_zone_id.to_string(),
            subdomain: root_zone_id.to_string(),
        })
        .await
        .with_context(|| format!("Failed to create root zone '{}'", root_zone_id))?;

    log::info!("Root zone seeding completed successfully");
    Ok(zone)
}
