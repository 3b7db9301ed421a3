//! Manager facade
//!
//! The entry point hosting applications embed: wires the grant checker,
//! the consent surface, and the platform version together, and exposes
//! the check / request / batch operations.

use std::sync::Arc;

use thiserror::Error;

use assent_api::{ApiLevel, PermissionKind};

use crate::batch::BatchSequence;
use crate::grant::GrantChecker;
use crate::negotiation::{Negotiation, NegotiationRequest};
use crate::quirk;
use crate::ui::ConsentUi;

/// Error type for manager construction
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("grant checker not configured")]
    MissingChecker,

    #[error("consent surface not configured")]
    MissingUi,

    #[error("platform API level not configured")]
    MissingApiLevel,
}

/// Orchestrates permission negotiations for a hosting application.
#[derive(Clone)]
pub struct PermissionManager {
    checker: Arc<dyn GrantChecker>,
    ui: Arc<dyn ConsentUi>,
    api_level: ApiLevel,
}

impl std::fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionManager")
            .field("api_level", &self.api_level)
            .finish_non_exhaustive()
    }
}

impl PermissionManager {
    /// Create a manager from shared collaborators.
    pub fn new(
        checker: Arc<dyn GrantChecker>,
        ui: Arc<dyn ConsentUi>,
        api_level: ApiLevel,
    ) -> Self {
        Self {
            checker,
            ui,
            api_level,
        }
    }

    /// Start building a manager.
    pub fn builder() -> PermissionManagerBuilder {
        PermissionManagerBuilder::new()
    }

    /// Check current grant status without running the request flow.
    ///
    /// Applies the same version quirks a request would, then returns
    /// whether every permission is already granted. Never touches the
    /// consent surface. An empty permission list counts as granted.
    pub fn check(&self, kind: &PermissionKind) -> bool {
        let adjusted = quirk::adjust(kind.clone(), self.api_level);
        adjusted
            .permissions
            .iter()
            .all(|p| self.checker.is_granted(p))
    }

    /// Run the full request flow for one kind.
    pub fn request(&self, kind: PermissionKind) -> Negotiation {
        let adjusted = quirk::adjust(kind, self.api_level);
        tracing::debug!(
            kind = %adjusted.group,
            permissions = ?adjusted.permissions,
            "starting negotiation"
        );
        Negotiation::spawn(
            self.checker.clone(),
            self.ui.clone(),
            NegotiationRequest::new(adjusted),
        )
    }

    /// Run negotiations for the given kinds strictly in input order.
    ///
    /// Settings escalation is suppressed for every batch item so a single
    /// flow never compounds multiple settings round-trips; a denial is
    /// final for that item and the sequence moves on.
    pub fn request_batch(&self, kinds: Vec<PermissionKind>) -> BatchSequence {
        let kinds = kinds
            .into_iter()
            .map(|kind| quirk::adjust(kind.without_setting_message(), self.api_level))
            .collect();
        BatchSequence::spawn(self.checker.clone(), self.ui.clone(), kinds)
    }

    /// Request the default catalog in one sequential flow.
    ///
    /// PhoneState is excluded: it is only relevant below OS 10 and is
    /// gated separately by the caller.
    pub fn request_all(&self) -> BatchSequence {
        self.request_batch(vec![
            PermissionKind::call_phone(),
            PermissionKind::location(),
            PermissionKind::storage(),
            PermissionKind::camera(),
        ])
    }
}

/// Builder for [`PermissionManager`]
pub struct PermissionManagerBuilder {
    checker: Option<Arc<dyn GrantChecker>>,
    ui: Option<Arc<dyn ConsentUi>>,
    api_level: Option<ApiLevel>,
}

impl PermissionManagerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            checker: None,
            ui: None,
            api_level: None,
        }
    }

    /// Set the grant checker.
    pub fn checker(mut self, checker: impl GrantChecker + 'static) -> Self {
        self.checker = Some(Arc::new(checker));
        self
    }

    /// Set the consent surface.
    pub fn ui(mut self, ui: impl ConsentUi + 'static) -> Self {
        self.ui = Some(Arc::new(ui));
        self
    }

    /// Set the platform API level.
    pub fn api_level(mut self, level: ApiLevel) -> Self {
        self.api_level = Some(level);
        self
    }

    /// Build the manager.
    pub fn build(self) -> Result<PermissionManager, BuildError> {
        Ok(PermissionManager {
            checker: self.checker.ok_or(BuildError::MissingChecker)?,
            ui: self.ui.ok_or(BuildError::MissingUi)?,
            api_level: self.api_level.ok_or(BuildError::MissingApiLevel)?,
        })
    }
}

impl Default for PermissionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
