//! Grant status querying
//!
//! The runtime never talks to the OS directly. Hosting applications
//! implement [`GrantChecker`] over the platform's permission query; the
//! in-memory store below backs tests and simulated flows.

use std::collections::HashSet;
use std::sync::RwLock;

/// Read-only view of the current grant state.
///
/// Implementations must be cheap to call: the state machine queries every
/// permission of a request at each evaluation point.
pub trait GrantChecker: Send + Sync {
    /// Whether the permission is currently granted.
    fn is_granted(&self, permission: &str) -> bool;
}

impl<T: GrantChecker + ?Sized> GrantChecker for std::sync::Arc<T> {
    fn is_granted(&self, permission: &str) -> bool {
        (**self).is_granted(permission)
    }
}

/// In-memory grant state for tests and simulations.
///
/// Interior-mutable so a simulated consent surface can apply grants the
/// way the real OS mutates grant state behind a prompt.
#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    granted: RwLock<HashSet<String>>,
}

impl MemoryGrantStore {
    /// Create an empty store (everything denied).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an initial set of granted permissions.
    pub fn with_granted<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: RwLock::new(permissions.into_iter().map(Into::into).collect()),
        }
    }

    /// Mark a permission as granted.
    pub fn grant(&self, permission: impl Into<String>) {
        self.granted.write().unwrap().insert(permission.into());
    }

    /// Mark a permission as denied again.
    pub fn revoke(&self, permission: &str) {
        self.granted.write().unwrap().remove(permission);
    }

    /// Number of granted permissions.
    pub fn granted_count(&self) -> usize {
        self.granted.read().unwrap().len()
    }
}

impl GrantChecker for MemoryGrantStore {
    fn is_granted(&self, permission: &str) -> bool {
        self.granted.read().unwrap().contains(permission)
    }
}
