//! Platform version quirks for storage requests
//!
//! Storage permissions changed shape across platform versions: levels
//! below Q still require the legacy write permission, and levels above P
//! gate media location behind its own permission. Requests are normalized
//! here before a negotiation starts.

use assent_api::{ids, ApiLevel, PermissionGroup, PermissionKind};

/// Normalize a request's permission list for the platform version.
///
/// Only storage requests are affected. Operates on the request's owned
/// list; the "missing" guards make re-adjustment a no-op, so applying
/// this twice yields the same list as applying it once.
pub fn adjust(mut kind: PermissionKind, level: ApiLevel) -> PermissionKind {
    if kind.group != PermissionGroup::Storage {
        return kind;
    }

    if level < ApiLevel::Q && !contains(&kind, ids::WRITE_EXTERNAL_STORAGE) {
        tracing::debug!(%level, "appending legacy external-storage write permission");
        kind.permissions.push(ids::WRITE_EXTERNAL_STORAGE.to_string());
    }
    if level > ApiLevel::P && !contains(&kind, ids::ACCESS_MEDIA_LOCATION) {
        tracing::debug!(%level, "appending media-location permission");
        kind.permissions.push(ids::ACCESS_MEDIA_LOCATION.to_string());
    }
    kind
}

fn contains(kind: &PermissionKind, permission: &str) -> bool {
    kind.permissions.iter().any(|p| p == permission)
}
