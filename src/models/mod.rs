//! # Data Models
//!
//! SeaORM entities for the registry plus small shared response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod identity_provider;
pub mod identity_zone;

pub use identity_provider::Entity as IdentityProvider;
pub use identity_provider::ProviderType;
pub use identity_zone::Entity as IdentityZone;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "idp-registry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// `ok` when the database answered, `unavailable` otherwise
    #[schema(example = "ok")]
    pub status: String,
}
