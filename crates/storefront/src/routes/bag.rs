//! Bag route handlers.
//!
//! Guests collect drafts in the session; signed-in users save them straight
//! to their account. Both paths answer with the new count and an
//! `HX-Trigger: bagUpdated` header so the count badge refreshes.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::Fields;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, trigger_bag_updated};
use crate::models::GuestBagItem;
use crate::services::{DraftService, GuestBag};
use crate::state::AppState;
use crate::store::SessionGuestStore;

/// Bag count payload.
#[derive(Debug, Serialize)]
pub struct BagCount {
    pub count: usize,
}

/// Add a draft to the bag.
#[instrument(skip(state, session, user, draft))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(draft): Json<Fields>,
) -> Result<Response> {
    let count = match user {
        Some(user) => {
            let drafts = DraftService::new(state.documents());
            let fields = GuestBagItem::from(draft).into_draft_fields();
            drafts.create(&user.id, fields).await?;
            drafts.count(&user.id).await?
        }
        None => {
            let guest = SessionGuestStore::new(session);
            GuestBag::new(&guest).add(draft).await?
        }
    };

    add_breadcrumb("bag", "Draft added to bag", Some(&[("count", &count.to_string())]));

    let mut response = Json(BagCount { count }).into_response();
    trigger_bag_updated(&mut response);
    Ok(response)
}

/// Current bag count for the badge.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<BagCount>> {
    let count = match user {
        Some(user) => DraftService::new(state.documents()).count(&user.id).await?,
        None => {
            let guest = SessionGuestStore::new(session);
            GuestBag::new(&guest).count().await?
        }
    };

    Ok(Json(BagCount { count }))
}
