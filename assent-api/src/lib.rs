//! assent-api: Shared types for the assent permission system
//!
//! This crate defines the model passed between a hosting application and
//! the negotiation runtime: the permission group catalog, per-request
//! permission kinds, and terminal results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known platform permission identifiers.
///
/// Only the identifiers referenced by the default group templates and the
/// storage version quirks live here; hosting applications pass any other
/// identifier as a plain string.
pub mod ids {
    pub const READ_PHONE_STATE: &str = "android.permission.READ_PHONE_STATE";
    pub const CALL_PHONE: &str = "android.permission.CALL_PHONE";
    pub const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
    pub const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
    pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";
    pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";
    pub const ACCESS_MEDIA_LOCATION: &str = "android.permission.ACCESS_MEDIA_LOCATION";
    pub const CAMERA: &str = "android.permission.CAMERA";
}

/// Platform API level, used by the storage quirk rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiLevel(pub u32);

impl ApiLevel {
    /// Last level with the legacy external-storage write model.
    pub const P: ApiLevel = ApiLevel(28);
    /// First level with scoped storage and separate media-location gating.
    pub const Q: ApiLevel = ApiLevel(29);
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog of permission groups the runtime knows how to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionGroup {
    /// Device identity lookup (only relevant below OS 10).
    PhoneState,
    /// Outgoing call placement.
    CallPhone,
    /// Fine and coarse position access.
    Location,
    /// External storage access.
    Storage,
    /// Camera capture.
    Camera,
}

impl PermissionGroup {
    /// Default permission template for this group.
    ///
    /// Templates are static and immutable; [`PermissionKind`] constructors
    /// copy them into a fresh owned list per request, so adjusting one
    /// request can never leak into another.
    pub fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            Self::PhoneState => &[ids::READ_PHONE_STATE],
            Self::CallPhone => &[ids::CALL_PHONE],
            Self::Location => &[ids::ACCESS_FINE_LOCATION, ids::ACCESS_COARSE_LOCATION],
            Self::Storage => &[ids::READ_EXTERNAL_STORAGE],
            Self::Camera => &[ids::CAMERA],
        }
    }
}

impl fmt::Display for PermissionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PhoneState => "phone-state",
            Self::CallPhone => "call-phone",
            Self::Location => "location",
            Self::Storage => "storage",
            Self::Camera => "camera",
        };
        f.write_str(name)
    }
}

/// One permission request: a catalog group plus the messages that shape
/// its negotiation flow.
///
/// The permission list is owned by the request. An empty list means there
/// is nothing to negotiate and the flow short-circuits to granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionKind {
    /// Catalog group this request belongs to.
    pub group: PermissionGroup,

    /// Permission identifiers to negotiate, in request order.
    pub permissions: Vec<String>,

    /// Shown before the system prompt when present.
    #[serde(default)]
    pub rationale_message: Option<String>,

    /// Enables the settings escalation step when present and non-empty.
    #[serde(default)]
    pub setting_message: Option<String>,
}

impl PermissionKind {
    /// Create a request for a group with its default permission template.
    pub fn new(group: PermissionGroup) -> Self {
        Self {
            group,
            permissions: group
                .default_permissions()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            rationale_message: None,
            setting_message: None,
        }
    }

    /// Device identity request.
    pub fn phone_state() -> Self {
        Self::new(PermissionGroup::PhoneState)
    }

    /// Outgoing call request.
    pub fn call_phone() -> Self {
        Self::new(PermissionGroup::CallPhone)
    }

    /// Position access request.
    pub fn location() -> Self {
        Self::new(PermissionGroup::Location)
    }

    /// External storage request.
    pub fn storage() -> Self {
        Self::new(PermissionGroup::Storage)
    }

    /// Camera capture request.
    pub fn camera() -> Self {
        Self::new(PermissionGroup::Camera)
    }

    /// Replace the permission list.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set the rationale message shown before the system prompt.
    pub fn with_rationale(mut self, message: impl Into<String>) -> Self {
        self.rationale_message = Some(message.into());
        self
    }

    /// Set the message offered with the settings escalation step.
    pub fn with_setting_message(mut self, message: impl Into<String>) -> Self {
        self.setting_message = Some(message.into());
        self
    }

    /// Drop the settings escalation step from this request.
    pub fn without_setting_message(mut self) -> Self {
        self.setting_message = None;
        self
    }

    /// Whether a denial may escalate to the settings screen.
    ///
    /// An absent or empty message disables the step.
    pub fn has_escalation(&self) -> bool {
        self.setting_message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Terminal outcome of one negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionResult {
    /// Every requested permission is granted.
    Granted(PermissionKind),
    /// One or more permissions remain denied.
    Denied {
        /// The request this outcome belongs to.
        kind: PermissionKind,
        /// Exactly the permissions still denied, in request order.
        denied: Vec<String>,
    },
}

impl PermissionResult {
    /// Whether the negotiation ended granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The request this outcome belongs to.
    pub fn kind(&self) -> &PermissionKind {
        match self {
            Self::Granted(kind) => kind,
            Self::Denied { kind, .. } => kind,
        }
    }

    /// Permissions still denied (empty for a granted outcome).
    pub fn denied_permissions(&self) -> &[String] {
        match self {
            Self::Granted(_) => &[],
            Self::Denied { denied, .. } => denied,
        }
    }
}
