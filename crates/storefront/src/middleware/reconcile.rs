//! Reconciliation trigger.
//!
//! Runs the [`SessionReconciler`] once per sign-in. After each request the
//! layer feeds the session's current user through the session's
//! [`IdentityGate`]; when the gate fires, guest state held in the same session
//! is merged into the account.
//!
//! Every request works on its own copy of the session record, loaded before
//! the handler and saved after the response. Requests that race through a
//! sign-in would each see an unfired gate, so the transition is claimed under
//! a per-session lock held in [`ReconcileClaims`]: the first request runs the
//! reconciler and records what it cleared, later ones adopt that result into
//! their own copy instead of running again.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::Session;
use tower_sessions::session::Id;

use threadline_core::{GUEST_BAG_KEY, GUEST_WISHLIST_KEY, UserId};

use crate::events::BAG_UPDATED;
use crate::middleware::auth::current_user;
use crate::models::{IdentityGate, session_keys};
use crate::services::{BagOutcome, ReconcileReport, SessionReconciler, WishlistOutcome};
use crate::store::{DocumentStore, GuestStore, SessionGuestStore};

/// HTMX client-side event trigger header.
pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Claims only need to outlive requests that were already in flight when
/// the sign-in was reconciled.
const CLAIM_IDLE: Duration = Duration::from_secs(600);
const CLAIM_CAPACITY: u64 = 10_000;

/// Mark `response` so HTMX clients refresh their bag count.
pub fn trigger_bag_updated(response: &mut Response) {
    response
        .headers_mut()
        .insert(HX_TRIGGER, HeaderValue::from_static(BAG_UPDATED));
}

/// A sign-in some request of this session has already reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Claim {
    user: UserId,
    bag_cleared: bool,
    wishlist_cleared: bool,
}

impl Claim {
    fn new(user: UserId, report: &ReconcileReport) -> Self {
        Self {
            user,
            bag_cleared: matches!(report.bag, BagOutcome::Migrated { cleared: true, .. }),
            wishlist_cleared: matches!(
                report.wishlist,
                WishlistOutcome::Settled { cleared: true, .. }
            ),
        }
    }

    /// Drop the guest keys the reconciling request cleared from this
    /// request's copy of the session, so saving it does not restore them.
    async fn adopt(&self, session: &Session) {
        let guest = SessionGuestStore::new(session.clone());
        let cleared = [
            (self.bag_cleared, GUEST_BAG_KEY),
            (self.wishlist_cleared, GUEST_WISHLIST_KEY),
        ];
        for key in cleared.into_iter().filter_map(|(done, key)| done.then_some(key)) {
            if let Err(e) = guest.remove(key).await {
                tracing::warn!(key, error = %e, "Failed to drop reconciled guest state");
            }
        }
    }
}

type ClaimSlot = Arc<Mutex<Option<Claim>>>;

/// Per-session reconciliation claims for this process.
#[derive(Clone)]
pub struct ReconcileClaims {
    slots: Cache<Id, ClaimSlot>,
}

impl Default for ReconcileClaims {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileClaims {
    #[must_use]
    pub fn new() -> Self {
        let slots = Cache::builder()
            .max_capacity(CLAIM_CAPACITY)
            .time_to_idle(CLAIM_IDLE)
            .build();
        Self { slots }
    }

    async fn slot(&self, session: Id) -> ClaimSlot {
        self.slots
            .get_with(session, async { Arc::new(Mutex::new(None)) })
            .await
    }
}

/// State for [`reconcile_middleware`].
#[derive(Clone)]
pub struct ReconcileState<D> {
    reconciler: SessionReconciler<D>,
    claims: ReconcileClaims,
}

impl<D> ReconcileState<D> {
    #[must_use]
    pub const fn new(reconciler: SessionReconciler<D>, claims: ReconcileClaims) -> Self {
        Self { reconciler, claims }
    }
}

/// Middleware that reconciles guest state when the signed-in user changes.
///
/// Must run inside the identity layer so the current user is up to date.
/// Reconciliation failures never fail the request; they are logged by the
/// reconciler.
pub async fn reconcile_middleware<D>(
    State(state): State<ReconcileState<D>>,
    session: Session,
    request: Request,
    next: Next,
) -> Response
where
    D: DocumentStore + Clone + 'static,
{
    let mut response = next.run(request).await;

    let user = current_user(&session).await.map(|u| u.id);
    let mut gate: IdentityGate = match session.get(session_keys::RECONCILED_USER).await {
        Ok(gate) => gate.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read identity gate; skipping reconciliation");
            return response;
        }
    };
    if gate.last() == user.as_ref() {
        return response;
    }

    // A session without an ID has never been stored, so no other request
    // can share it.
    let mut claim = match session.id() {
        Some(id) => Some(state.claims.slot(id).await.lock_owned().await),
        None => None,
    };

    let Some(user_id) = user else {
        gate.observe(None);
        if let Some(claim) = claim.as_mut() {
            **claim = None;
        }
        store_gate(&session, &gate).await;
        return response;
    };

    let adopted = claim
        .as_deref()
        .and_then(Option::as_ref)
        .filter(|done| done.user == user_id)
        .cloned();
    if let Some(done) = adopted {
        gate.observe(Some(&user_id));
        if store_gate(&session, &gate).await {
            done.adopt(&session).await;
        }
        tracing::debug!(user_id = %user_id, "Sign-in already reconciled by a concurrent request");
        return response;
    }

    let fired = gate.observe(Some(&user_id));
    if !store_gate(&session, &gate).await {
        return response;
    }

    if let Some(user_id) = fired {
        let guest = SessionGuestStore::new(session.clone());
        let report = state
            .reconciler
            .on_user_authenticated(&guest, &user_id)
            .await;
        if report.bag_migrated() {
            trigger_bag_updated(&mut response);
        }
        if let Some(claim) = claim.as_mut() {
            **claim = Some(Claim::new(user_id, &report));
        }
    }

    response
}

/// Persist `gate` into the session; `false` when that failed.
async fn store_gate(session: &Session, gate: &IdentityGate) -> bool {
    match session.insert(session_keys::RECONCILED_USER, gate).await {
        Ok(()) => true,
        Err(e) => {
            // Without a persisted gate the next request would reconcile again.
            tracing::error!(error = %e, "Failed to store identity gate; skipping reconciliation");
            false
        }
    }
}
