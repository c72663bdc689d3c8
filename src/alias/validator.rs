//! Alias rule checks.
//!
//! Pure functions over a requested provider state and, for updates, the
//! persisted record. Zone existence is resolved by the caller beforehand so
//! nothing here touches the store.

use uuid::Uuid;

use super::{AliasRule, ProviderDraft};
use crate::models::identity_provider;

/// Facts about the request environment the rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Zone the provider lives in
    pub zone_id: &'a str,
    pub root_zone_id: &'a str,
    /// Whether the draft's `alias_zid` names a known zone
    pub target_zone_exists: bool,
}

/// Returns the trimmed value, treating blank strings as absent.
pub fn has_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Checks the alias fields of `draft` against every rule, first failure wins.
///
/// `existing` is the persisted record on update and `None` on create.
pub fn validate(
    draft: &ProviderDraft,
    existing: Option<&identity_provider::Model>,
    ctx: &ValidationContext<'_>,
) -> Result<(), AliasRule> {
    let alias_id = has_text(draft.alias_id.as_deref());
    let alias_zid = has_text(draft.alias_zid.as_deref());
    let persisted = existing.and_then(identity_provider::Model::alias_target);

    match (alias_id, alias_zid) {
        (Some(_), None) => return Err(AliasRule::IncompletePairing),
        // Callers request mirroring with alias_zid alone; the id is assigned
        // once the counterpart exists.
        (Some(_), Some(_)) if persisted.is_none() => {
            return Err(AliasRule::AliasIdNotAssignable);
        }
        _ => {}
    }

    if let Some(alias_zid) = alias_zid {
        if alias_zid == ctx.zone_id {
            return Err(AliasRule::SelfReference);
        }

        let local_is_root = ctx.zone_id == ctx.root_zone_id;
        let target_is_root = alias_zid == ctx.root_zone_id;
        if local_is_root == target_is_root {
            return Err(AliasRule::RootZoneRequired);
        }

        if !draft.provider_type.is_mirrorable() {
            return Err(AliasRule::TypeNotMirrorable);
        }
    }

    if let Some((persisted_zid, persisted_id)) = persisted {
        let same_zid = alias_zid == Some(persisted_zid);
        let same_id = alias_id.and_then(|value| Uuid::parse_str(value).ok()) == Some(persisted_id);
        if !(same_zid && same_id) {
            return Err(AliasRule::AliasImmutable);
        }
    }

    if alias_zid.is_some() && !ctx.target_zone_exists {
        return Err(AliasRule::UnknownZone);
    }

    Ok(())
}
