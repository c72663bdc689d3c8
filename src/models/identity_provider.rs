//! Identity provider entity model
//!
//! One row per IdP configuration in a zone. A mirrored provider carries the id
//! and zone of its counterpart in `alias_id`/`alias_zid`; both are null for an
//! unmirrored provider.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Config key holding the owning zone inside a provider definition.
pub const CONFIG_ZONE_KEY: &str = "zoneId";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "identity_providers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Zone that owns this record
    pub identity_zone_id: String,

    /// Unique within a zone; matches the provider to authentication flows
    pub origin_key: String,

    pub provider_type: ProviderType,

    pub name: String,

    /// Type-specific definition, opaque apart from the zone key
    #[sea_orm(column_type = "JsonBinary")]
    pub config: Json,

    pub active: bool,

    pub alias_id: Option<Uuid>,

    pub alias_zid: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

/// Provider type tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ProviderType {
    /// Built-in username/password store; never mirrored
    #[sea_orm(string_value = "uaa")]
    #[serde(rename = "uaa")]
    Uaa,

    #[sea_orm(string_value = "saml")]
    #[serde(rename = "saml")]
    Saml,

    #[sea_orm(string_value = "oidc1.0")]
    #[serde(rename = "oidc1.0")]
    Oidc,

    #[sea_orm(string_value = "oauth2.0")]
    #[serde(rename = "oauth2.0")]
    OAuth2,

    #[sea_orm(string_value = "ldap")]
    #[serde(rename = "ldap")]
    Ldap,
}

impl ProviderType {
    /// Types that may be mirrored into another zone.
    pub const MIRRORABLE: [ProviderType; 3] =
        [ProviderType::Saml, ProviderType::Oidc, ProviderType::OAuth2];

    pub fn is_mirrorable(self) -> bool {
        Self::MIRRORABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::Uaa => "uaa",
            ProviderType::Saml => "saml",
            ProviderType::Oidc => "oidc1.0",
            ProviderType::OAuth2 => "oauth2.0",
            ProviderType::Ldap => "ldap",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Model {
    /// True when both alias columns are set.
    pub fn is_mirrored(&self) -> bool {
        self.alias_id.is_some() && self.alias_zid.is_some()
    }

    /// The `(zone, id)` of the counterpart, if this record is mirrored.
    pub fn alias_target(&self) -> Option<(&str, Uuid)> {
        match (&self.alias_zid, self.alias_id) {
            (Some(zone_id), Some(id)) => Some((zone_id.as_str(), id)),
            _ => None,
        }
    }
}

/// Returns `config` with its zone key rewritten to `zone_id`.
///
/// Only definitions that already carry the key are touched; any other payload
/// is copied through untouched.
pub fn rezone_config(config: &Json, zone_id: &str) -> Json {
    let mut config = config.clone();
    if let Some(object) = config.as_object_mut()
        && object.contains_key(CONFIG_ZONE_KEY)
    {
        object.insert(
            CONFIG_ZONE_KEY.to_string(),
            Json::String(zone_id.to_string()),
        );
    }
    config
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::identity_zone::Entity",
        from = "Column::IdentityZoneId",
        to = "super::identity_zone::Column::Id"
    )]
    IdentityZone,
}

impl Related<super::identity_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdentityZone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rezone_rewrites_existing_zone_key_only() {
        let config = json!({"zoneId": "uaa", "metaDataLocation": "https://idp.example.com/md"});
        let rezoned = rezone_config(&config, "tenant-a");

        assert_eq!(rezoned["zoneId"], "tenant-a");
        assert_eq!(rezoned["metaDataLocation"], "https://idp.example.com/md");
    }

    #[test]
    fn rezone_leaves_payload_without_zone_key_alone() {
        let config = json!({"issuer": "https://login.example.com"});
        assert_eq!(rezone_config(&config, "tenant-a"), config);
        assert_eq!(rezone_config(&json!(null), "tenant-a"), json!(null));
    }

    #[test]
    fn only_federated_types_are_mirrorable() {
        assert!(ProviderType::Saml.is_mirrorable());
        assert!(ProviderType::Oidc.is_mirrorable());
        assert!(ProviderType::OAuth2.is_mirrorable());
        assert!(!ProviderType::Uaa.is_mirrorable());
        assert!(!ProviderType::Ldap.is_mirrorable());
    }

    #[test]
    fn provider_type_serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(ProviderType::Oidc).unwrap(), json!("oidc1.0"));
        assert_eq!(
            serde_json::from_value::<ProviderType>(json!("oauth2.0")).unwrap(),
            ProviderType::OAuth2
        );
        assert_eq!(ProviderType::Saml.to_string(), "saml");
    }
}
