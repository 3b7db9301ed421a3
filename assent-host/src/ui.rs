//! Consent surface handling for user interaction
//!
//! Provides the trait the negotiation state machine drives its dialogs
//! through. Hosting applications implement [`ConsentUi`] over their own
//! dialog framework; the handlers below cover headless and test use.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::grant::MemoryGrantStore;

/// Error type for consent surface operations
#[derive(Debug, Error)]
pub enum UiError {
    /// The hosting surface went away before the user answered.
    #[error("consent dialog cancelled by host")]
    Cancelled,

    /// No dialog surface is available to present the step on.
    #[error("no consent surface available")]
    Unavailable,
}

/// User's choice on the settings escalation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscalationChoice {
    /// Proceed to the platform settings screen.
    OpenSettings,
    /// Keep the denial.
    #[default]
    Decline,
}

/// Trait for presenting consent steps to the user
///
/// Each method presents exactly one dialog surface and resolves when the
/// user (or the OS) answers it. Returning an error tears the running
/// negotiation down without emitting a result.
///
/// # Example
///
/// ```rust
/// use assent_host::ui::{ConsentUi, EscalationChoice, UiError};
/// use async_trait::async_trait;
/// use std::collections::HashMap;
///
/// struct DialogUi;
///
/// #[async_trait]
/// impl ConsentUi for DialogUi {
///     async fn show_rationale(&self, _message: &str) -> Result<(), UiError> {
///         // Show an informational dialog, resolve on acknowledgement
///         Ok(())
///     }
///
///     async fn show_system_prompt(
///         &self,
///         permissions: &[String],
///     ) -> Result<HashMap<String, bool>, UiError> {
///         // Launch the OS permission prompt
///         Ok(permissions.iter().map(|p| (p.clone(), false)).collect())
///     }
///
///     async fn show_settings_escalation(
///         &self,
///         _message: &str,
///     ) -> Result<EscalationChoice, UiError> {
///         Ok(EscalationChoice::Decline)
///     }
///
///     async fn open_settings(&self) -> Result<(), UiError> {
///         // Resolve once the user returns from the settings screen
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ConsentUi: Send + Sync {
    /// Explain why the permissions are needed; resolves on acknowledgement.
    async fn show_rationale(&self, message: &str) -> Result<(), UiError>;

    /// Launch the OS permission prompt for the pending permissions.
    ///
    /// The returned map carries the user's per-permission answer.
    /// Permissions absent from the map are treated as denied.
    async fn show_system_prompt(
        &self,
        permissions: &[String],
    ) -> Result<HashMap<String, bool>, UiError>;

    /// Offer the settings redirect after a prompt denial.
    async fn show_settings_escalation(&self, message: &str) -> Result<EscalationChoice, UiError>;

    /// Open the platform settings screen; resolves once on return.
    async fn open_settings(&self) -> Result<(), UiError>;
}

#[async_trait]
impl<T: ConsentUi + ?Sized> ConsentUi for Arc<T> {
    async fn show_rationale(&self, message: &str) -> Result<(), UiError> {
        (**self).show_rationale(message).await
    }

    async fn show_system_prompt(
        &self,
        permissions: &[String],
    ) -> Result<HashMap<String, bool>, UiError> {
        (**self).show_system_prompt(permissions).await
    }

    async fn show_settings_escalation(&self, message: &str) -> Result<EscalationChoice, UiError> {
        (**self).show_settings_escalation(message).await
    }

    async fn open_settings(&self) -> Result<(), UiError> {
        (**self).open_settings().await
    }
}

// ============================================================================
// Auto Handler (headless approve/deny)
// ============================================================================

/// Consent surface that answers every step without user interaction
#[derive(Debug)]
pub struct AutoConsentUi {
    grant: bool,
}

impl AutoConsentUi {
    /// Create a surface that grants every prompt.
    pub fn grant_all() -> Self {
        Self { grant: true }
    }

    /// Create a surface that denies every prompt and declines escalation.
    pub fn deny_all() -> Self {
        Self { grant: false }
    }
}

#[async_trait]
impl ConsentUi for AutoConsentUi {
    async fn show_rationale(&self, _message: &str) -> Result<(), UiError> {
        Ok(())
    }

    async fn show_system_prompt(
        &self,
        permissions: &[String],
    ) -> Result<HashMap<String, bool>, UiError> {
        Ok(permissions.iter().map(|p| (p.clone(), self.grant)).collect())
    }

    async fn show_settings_escalation(&self, _message: &str) -> Result<EscalationChoice, UiError> {
        Ok(EscalationChoice::Decline)
    }

    async fn open_settings(&self) -> Result<(), UiError> {
        Ok(())
    }
}

// ============================================================================
// Scripted Handler (for testing)
// ============================================================================

/// A recorded consent surface call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    Rationale(String),
    SystemPrompt(Vec<String>),
    SettingsEscalation(String),
    OpenSettings,
}

/// Consent surface that replays scripted answers and records every call
///
/// Answers are queued per step kind and consumed in order. When a queue
/// runs dry the surface falls back to denying: the system prompt denies
/// every permission and the escalation dialog declines.
///
/// When a [`MemoryGrantStore`] is attached, granted prompt answers and
/// queued settings-screen grants are applied to it, mirroring how the OS
/// mutates grant state behind its dialogs.
#[derive(Debug, Default)]
pub struct ScriptedUi {
    prompt_answers: Mutex<VecDeque<HashMap<String, bool>>>,
    escalation_answers: Mutex<VecDeque<EscalationChoice>>,
    settings_grants: Mutex<VecDeque<Vec<String>>>,
    calls: Mutex<Vec<UiCall>>,
    store: Option<Arc<MemoryGrantStore>>,
}

impl ScriptedUi {
    /// Create a surface with no scripted answers (denies everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the grant store the surface mutates on granted answers.
    pub fn with_store(mut self, store: Arc<MemoryGrantStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Queue the per-permission answer map for the next system prompt.
    pub fn answer_prompt<I, S>(&self, answer: I)
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let map = answer
            .into_iter()
            .map(|(permission, granted)| (permission.into(), granted))
            .collect();
        self.prompt_answers.lock().unwrap().push_back(map);
    }

    /// Queue the user's choice for the next escalation dialog.
    pub fn answer_escalation(&self, choice: EscalationChoice) {
        self.escalation_answers.lock().unwrap().push_back(choice);
    }

    /// Queue permissions the user grants during the next settings visit.
    pub fn grant_in_settings<I, S>(&self, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings_grants
            .lock()
            .unwrap()
            .push_back(permissions.into_iter().map(Into::into).collect());
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Clear the call record.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: UiCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn apply_grants<'a>(&self, granted: impl Iterator<Item = &'a str>) {
        if let Some(store) = &self.store {
            for permission in granted {
                store.grant(permission);
            }
        }
    }
}

#[async_trait]
impl ConsentUi for ScriptedUi {
    async fn show_rationale(&self, message: &str) -> Result<(), UiError> {
        self.record(UiCall::Rationale(message.to_string()));
        Ok(())
    }

    async fn show_system_prompt(
        &self,
        permissions: &[String],
    ) -> Result<HashMap<String, bool>, UiError> {
        self.record(UiCall::SystemPrompt(permissions.to_vec()));

        let answer = self.prompt_answers.lock().unwrap().pop_front();
        let answer = answer.unwrap_or_else(|| {
            permissions.iter().map(|p| (p.clone(), false)).collect()
        });

        self.apply_grants(
            answer
                .iter()
                .filter(|(_, granted)| **granted)
                .map(|(p, _)| p.as_str()),
        );
        Ok(answer)
    }

    async fn show_settings_escalation(&self, message: &str) -> Result<EscalationChoice, UiError> {
        self.record(UiCall::SettingsEscalation(message.to_string()));
        let choice = self.escalation_answers.lock().unwrap().pop_front();
        Ok(choice.unwrap_or_default())
    }

    async fn open_settings(&self) -> Result<(), UiError> {
        self.record(UiCall::OpenSettings);
        if let Some(granted) = self.settings_grants.lock().unwrap().pop_front() {
            self.apply_grants(granted.iter().map(String::as_str));
        }
        Ok(())
    }
}
