//! Session-related types.
//!
//! Types stored in the session for authentication and reconciliation state.

use serde::{Deserialize, Serialize};

use threadline_core::UserId;

/// Session-stored user identity.
///
/// Set by the identity middleware from the upstream authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Opaque user ID issued by the authentication provider.
    pub id: UserId,
}

/// Tracks which identity this session last reconciled guest state for.
///
/// Reconciliation must run once per sign-in, not once per request. The gate
/// fires when the observed identity differs from the last one it saw and
/// resets when the visitor signs out, so the next sign-in fires again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityGate {
    last: Option<UserId>,
}

impl IdentityGate {
    /// A gate that has not seen any identity.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Record the current identity.
    ///
    /// Returns the user to reconcile for when the identity became present or
    /// changed, and `None` when it is absent or unchanged.
    pub fn observe(&mut self, current: Option<&UserId>) -> Option<UserId> {
        match current {
            None => {
                self.last = None;
                None
            }
            Some(user) if self.last.as_ref() == Some(user) => None,
            Some(user) => {
                self.last = Some(user.clone());
                Some(user.clone())
            }
        }
    }

    /// The identity most recently reconciled, if any.
    #[must_use]
    pub const fn last(&self) -> Option<&UserId> {
        self.last.as_ref()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the [`IdentityGate`](super::IdentityGate).
    pub const RECONCILED_USER: &str = "reconciled_user";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_identity_is_noop() {
        let mut gate = IdentityGate::new();
        assert_eq!(gate.observe(None), None);
        assert_eq!(gate.last(), None);
    }

    #[test]
    fn test_fires_once_per_sign_in() {
        let mut gate = IdentityGate::new();
        let user = UserId::new("u1");

        assert_eq!(gate.observe(Some(&user)), Some(user.clone()));
        assert_eq!(gate.observe(Some(&user)), None);
        assert_eq!(gate.observe(Some(&user)), None);
    }

    #[test]
    fn test_sign_out_rearms() {
        let mut gate = IdentityGate::new();
        let user = UserId::new("u1");

        gate.observe(Some(&user));
        gate.observe(None);
        assert_eq!(gate.observe(Some(&user)), Some(user));
    }

    #[test]
    fn test_switching_users_fires() {
        let mut gate = IdentityGate::new();
        gate.observe(Some(&UserId::new("u1")));
        assert_eq!(
            gate.observe(Some(&UserId::new("u2"))),
            Some(UserId::new("u2"))
        );
    }
}
