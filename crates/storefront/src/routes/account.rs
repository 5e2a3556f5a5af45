//! Account route handlers (require a signed-in user).

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use threadline_core::Fields;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::DraftService;
use crate::state::AppState;

/// A saved draft as returned to the client.
#[derive(Debug, Serialize)]
pub struct DraftView {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

/// List the user's saved drafts.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn drafts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<DraftView>>> {
    let drafts = DraftService::new(state.documents()).list(&user.id).await?;

    Ok(Json(
        drafts
            .into_iter()
            .map(|doc| DraftView {
                id: doc.id,
                fields: doc.fields,
            })
            .collect(),
    ))
}
