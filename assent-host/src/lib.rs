//! assent-host: Permission negotiation runtime
//!
//! This crate drives OS permission consent flows for a hosting
//! application. The application supplies two narrow collaborators, a
//! [`GrantChecker`] over the platform's grant query and a [`ConsentUi`]
//! over its dialog surfaces. The runtime sequences the rationale, system
//! prompt, and settings escalation steps to a terminal granted/denied
//! outcome per request.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PermissionManager                        │
//! │  ┌─────────────┐ ┌──────────────┐ ┌───────────────────────┐ │
//! │  │ GrantChecker│ │  ConsentUi   │ │      ApiLevel         │ │
//! │  │             │ │              │ │                       │ │
//! │  │ - Memory    │ │ - Auto       │ │  storage quirks       │ │
//! │  │ - host impl │ │ - Scripted   │ │  (pre-Q / post-P)     │ │
//! │  │             │ │ - host impl  │ │                       │ │
//! │  └─────────────┘ └──────────────┘ └───────────────────────┘ │
//! │        check()        request()        request_all()        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use assent_host::{ApiLevel, PermissionKind, PermissionManager};
//! use assent_host::{AutoConsentUi, MemoryGrantStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = PermissionManager::new(
//!     Arc::new(MemoryGrantStore::new()),
//!     Arc::new(AutoConsentUi::grant_all()),
//!     ApiLevel::Q,
//! );
//!
//! let result = manager
//!     .request(PermissionKind::camera())
//!     .result()
//!     .await
//!     .expect("negotiation cancelled");
//! assert!(result.is_granted());
//! # }
//! ```

pub mod batch;
pub mod grant;
pub mod manager;
pub mod negotiation;
pub mod quirk;
pub mod ui;

pub use batch::{BatchItem, BatchSequence, BatchStream};
pub use grant::{GrantChecker, MemoryGrantStore};
pub use manager::{BuildError, PermissionManager, PermissionManagerBuilder};
pub use negotiation::{Negotiation, NegotiationRequest, ResultCallbacks, ResultStream};
pub use ui::{AutoConsentUi, ConsentUi, EscalationChoice, ScriptedUi, UiCall, UiError};

pub use assent_api::{ids, ApiLevel, PermissionGroup, PermissionKind, PermissionResult};
