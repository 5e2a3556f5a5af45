//! Guest-to-account reconciliation.
//!
//! When a visitor signs in, whatever they collected as a guest is merged into
//! their account:
//!
//! - **Bag pass**: every guest bag item becomes a draft in
//!   `users/{user}/drafts`. All creates run concurrently and the pass succeeds
//!   only if every one succeeds. Only then is the guest bag cleared and
//!   `bagUpdated` emitted. On failure the guest bag is kept so the next
//!   sign-in retries the whole set; drafts already created by the failed
//!   attempt are not rolled back and may be duplicated by the retry.
//!   Elements that are not JSON objects cannot become drafts; they are logged,
//!   counted as skipped, and dropped along with the rest of the bag.
//!
//! - **Wishlist pass**: every guest wishlist ID is resolved against the
//!   catalog and snapshotted into `users/{user}/wishlist/{id}`. Items are
//!   independent: a missing design or a failed read/write skips that ID only.
//!   Elements that are not strings count as malformed items. Once every ID
//!   has settled the guest wishlist is cleared, whatever the per-item
//!   outcomes, so a failed item is dropped rather than retried.
//!
//! The two passes touch disjoint guest keys and disjoint sub-collections and
//! run concurrently. Nothing here returns an error: every failure is logged
//! where it happens and summarized in the returned [`ReconcileReport`].

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use threadline_core::{DesignId, DraftId, GUEST_BAG_KEY, GUEST_WISHLIST_KEY, UserId};

use crate::events::{EventBus, StorefrontEvent};
use crate::models::GuestBagItem;
use crate::services::drafts::DraftService;
use crate::services::guest::{GuestList, GuestStateError, read_list};
use crate::services::wishlist::{SaveOutcome, WishlistError, WishlistService};
use crate::store::{DocumentStore, GuestStore, StoreError};

/// Failures encountered during reconciliation.
///
/// These are logged, never returned to callers.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Guest state is missing its expected shape; treated as empty.
    #[error("guest state unreadable: {0}")]
    LocalStateParse(#[from] GuestStateError),

    /// A catalog lookup failed, or the design does not exist (`source` is `None`).
    #[error("failed to fetch design {design_id}")]
    ItemFetch {
        design_id: DesignId,
        #[source]
        source: Option<StoreError>,
    },

    /// A single document write failed.
    #[error("failed to write {target}")]
    ItemWrite {
        target: String,
        #[source]
        source: StoreError,
    },
}

impl From<WishlistError> for ReconcileError {
    fn from(err: WishlistError) -> Self {
        match err {
            WishlistError::Path(path) => Self::ItemWrite {
                target: "wishlist entry".to_owned(),
                source: StoreError::Path(path),
            },
            WishlistError::Fetch { design_id, source } => Self::ItemFetch {
                design_id,
                source: Some(source),
            },
            WishlistError::Write { design_id, source } => Self::ItemWrite {
                target: format!("wishlist entry {design_id}"),
                source,
            },
        }
    }
}

/// Result of the bag pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BagOutcome {
    /// Nothing to migrate: the guest bag was absent, empty, or unreadable.
    /// Guest state was not touched.
    Empty,
    /// Every well-formed item became a draft.
    Migrated {
        drafts: Vec<DraftId>,
        /// Elements dropped because they were not JSON objects.
        skipped: usize,
        /// Whether the guest bag was cleared afterwards.
        cleared: bool,
    },
    /// At least one draft could not be created; the guest bag was kept.
    Failed {
        attempted: usize,
        failed: usize,
        /// Drafts created before the pass was abandoned.
        created: Vec<DraftId>,
    },
}

/// Result of the wishlist pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WishlistOutcome {
    /// Nothing to migrate: the guest wishlist was absent, empty, or
    /// unreadable. Guest state was not touched.
    Empty,
    /// Every ID was attempted.
    Settled {
        saved: Vec<DesignId>,
        /// IDs with no catalog document.
        missing: Vec<DesignId>,
        /// IDs whose read or write failed.
        failed: Vec<DesignId>,
        /// Elements that were not design ID strings.
        malformed: usize,
        /// Whether the guest wishlist was cleared afterwards.
        cleared: bool,
    },
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub bag: BagOutcome,
    pub wishlist: WishlistOutcome,
}

impl ReconcileReport {
    /// Whether the bag pass created drafts (and `bagUpdated` was emitted).
    #[must_use]
    pub fn bag_migrated(&self) -> bool {
        matches!(&self.bag, BagOutcome::Migrated { drafts, .. } if !drafts.is_empty())
    }
}

/// Merges guest state into a signed-in user's account.
#[derive(Clone)]
pub struct SessionReconciler<D> {
    documents: D,
    events: EventBus,
}

impl<D: DocumentStore> SessionReconciler<D> {
    /// Create a reconciler writing to `documents` and announcing on `events`.
    #[must_use]
    pub const fn new(documents: D, events: EventBus) -> Self {
        Self { documents, events }
    }

    /// Run both passes for a user who just signed in.
    ///
    /// Call once per sign-in transition; see
    /// [`IdentityGate`](crate::models::IdentityGate).
    #[instrument(skip(self, guest), fields(user_id = %user))]
    pub async fn on_user_authenticated<G: GuestStore>(
        &self,
        guest: &G,
        user: &UserId,
    ) -> ReconcileReport {
        let (bag, wishlist) = tokio::join!(
            self.migrate_bag(guest, user),
            self.migrate_wishlist(guest, user)
        );

        info!(?bag, ?wishlist, "Guest session reconciled");
        ReconcileReport { bag, wishlist }
    }

    /// Move the guest bag into the user's drafts.
    #[instrument(skip(self, guest), fields(user_id = %user))]
    pub async fn migrate_bag<G: GuestStore>(&self, guest: &G, user: &UserId) -> BagOutcome {
        let list: GuestList<GuestBagItem> = match read_list(guest, GUEST_BAG_KEY).await {
            Ok(Some(list)) if !list.is_empty() => list,
            Ok(_) => return BagOutcome::Empty,
            Err(err) => {
                let err = ReconcileError::from(err);
                warn!(error = %err, "Skipping bag migration");
                return BagOutcome::Empty;
            }
        };

        let GuestList {
            items,
            malformed: skipped,
        } = list;
        if skipped > 0 {
            warn!(skipped, "Guest bag elements are not objects; dropping them");
        }

        let attempted = items.len();
        let drafts = DraftService::new(&self.documents);
        let results = join_all(
            items
                .into_iter()
                .map(|item| drafts.create(user, item.into_draft_fields())),
        )
        .await;

        let mut created = Vec::with_capacity(attempted);
        let mut failed = 0;
        for result in results {
            match result {
                Ok(id) => created.push(id),
                Err(source) => {
                    failed += 1;
                    let err = ReconcileError::ItemWrite {
                        target: "draft".to_owned(),
                        source,
                    };
                    error!(error = %err, cause = ?std::error::Error::source(&err), "Draft creation failed");
                }
            }
        }

        if failed > 0 {
            error!(
                attempted,
                failed,
                created = created.len(),
                "Bag migration failed; guest bag kept for retry"
            );
            return BagOutcome::Failed {
                attempted,
                failed,
                created,
            };
        }

        let cleared = match guest.remove(GUEST_BAG_KEY).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Bag migrated but guest bag could not be cleared");
                false
            }
        };

        if !created.is_empty() {
            self.events.emit(StorefrontEvent::BagUpdated {
                user_id: user.clone(),
            });
        }
        info!(migrated = created.len(), skipped, "Guest bag migrated");

        BagOutcome::Migrated {
            drafts: created,
            skipped,
            cleared,
        }
    }

    /// Snapshot guest wishlist designs into the user's wishlist.
    #[instrument(skip(self, guest), fields(user_id = %user))]
    pub async fn migrate_wishlist<G: GuestStore>(&self, guest: &G, user: &UserId) -> WishlistOutcome {
        let GuestList { items: ids, malformed } = match read_list(guest, GUEST_WISHLIST_KEY).await {
            Ok(Some(list)) if !list.is_empty() => list,
            Ok(_) => return WishlistOutcome::Empty,
            Err(err) => {
                let err = ReconcileError::from(err);
                warn!(error = %err, "Skipping wishlist migration");
                return WishlistOutcome::Empty;
            }
        };

        if malformed > 0 {
            warn!(malformed, "Guest wishlist elements are not design IDs; skipping them");
        }

        let service = WishlistService::new(&self.documents);
        let wishlist = &service;
        let results = join_all(ids.into_iter().map(|design| async move {
            let result = wishlist.save(user, &design).await;
            (design, result)
        }))
        .await;

        let mut saved = Vec::new();
        let mut missing = Vec::new();
        let mut failed = Vec::new();
        for (design, result) in results {
            match result {
                Ok(SaveOutcome::Saved(_)) => saved.push(design),
                Ok(SaveOutcome::DesignNotFound) => {
                    let err = ReconcileError::ItemFetch {
                        design_id: design.clone(),
                        source: None,
                    };
                    debug!(error = %err, "Design no longer in catalog; skipped");
                    missing.push(design);
                }
                Err(err) => {
                    let err = ReconcileError::from(err);
                    warn!(design_id = %design, error = %err, "Wishlist item skipped");
                    failed.push(design);
                }
            }
        }

        let cleared = match guest.remove(GUEST_WISHLIST_KEY).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Guest wishlist could not be cleared");
                false
            }
        };

        info!(
            saved = saved.len(),
            missing = missing.len(),
            failed = failed.len(),
            malformed,
            "Guest wishlist migrated"
        );

        WishlistOutcome::Settled {
            saved,
            missing,
            failed,
            malformed,
            cleared,
        }
    }
}
