//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::{DesignId, Fields};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::{GuestWishlist, SaveOutcome, WishlistService};
use crate::state::AppState;
use crate::store::SessionGuestStore;

/// Wishlist contents: bare IDs for guests, catalog snapshots for users.
#[derive(Debug, Serialize)]
#[serde(tag = "owner", rename_all = "snake_case")]
pub enum WishlistView {
    Guest { design_ids: Vec<DesignId> },
    Account { items: Vec<Fields> },
}

/// Toggle result.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub design_id: DesignId,
    pub saved: bool,
}

/// Show the wishlist.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<WishlistView>> {
    let view = match user {
        Some(user) => {
            let entries = WishlistService::new(state.documents()).list(&user.id).await?;
            WishlistView::Account {
                items: entries.into_iter().map(|doc| doc.fields).collect(),
            }
        }
        None => {
            let guest = SessionGuestStore::new(session);
            WishlistView::Guest {
                design_ids: GuestWishlist::new(&guest).ids().await?,
            }
        }
    };

    Ok(Json(view))
}

/// Save or unsave a design.
#[instrument(skip(state, session, user))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(design_id): Path<DesignId>,
) -> Result<Json<ToggleResponse>> {
    let saved = match user {
        Some(user) => {
            let wishlist = WishlistService::new(state.documents());
            if wishlist.contains(&user.id, &design_id).await? {
                wishlist.remove(&user.id, &design_id).await?;
                false
            } else {
                match wishlist.save(&user.id, &design_id).await? {
                    SaveOutcome::Saved(_) => true,
                    SaveOutcome::DesignNotFound => {
                        return Err(AppError::NotFound(format!("design {design_id}")));
                    }
                }
            }
        }
        None => {
            let guest = SessionGuestStore::new(session);
            GuestWishlist::new(&guest).toggle(&design_id).await?
        }
    };

    Ok(Json(ToggleResponse { design_id, saved }))
}
