//! Session-backed guest storage.
//!
//! Guest bag and wishlist state lives in the visitor's server-side session,
//! keyed by the same names the browsing surface writes.

use tower_sessions::Session;

use super::{GuestStore, StoreError};

/// [`GuestStore`] over a tower-sessions [`Session`].
#[derive(Clone, Debug)]
pub struct SessionGuestStore {
    session: Session,
}

impl SessionGuestStore {
    /// Wrap the current request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl GuestStore for SessionGuestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.session.get::<String>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.session.remove::<String>(key).await?;
        Ok(())
    }
}
