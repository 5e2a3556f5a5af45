//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::PgDocumentStore;
use crate::events::EventBus;
use crate::middleware::{ReconcileClaims, ReconcileState};
use crate::services::SessionReconciler;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    documents: PgDocumentStore,
    events: EventBus,
    claims: ReconcileClaims,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let documents = PgDocumentStore::new(pool.clone());
        let events = EventBus::new(config.event_capacity);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                documents,
                events,
                claims: ReconcileClaims::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn documents(&self) -> &PgDocumentStore {
        &self.inner.documents
    }

    /// Get a reference to the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// A reconciler writing to the document store and announcing on the bus.
    #[must_use]
    pub fn reconciler(&self) -> SessionReconciler<PgDocumentStore> {
        SessionReconciler::new(self.inner.documents.clone(), self.inner.events.clone())
    }

    /// State for the reconciliation layer. Every clone shares the same
    /// per-session claims.
    #[must_use]
    pub fn reconcile_state(&self) -> ReconcileState<PgDocumentStore> {
        ReconcileState::new(self.reconciler(), self.inner.claims.clone())
    }
}
