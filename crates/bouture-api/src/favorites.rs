use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use bouture_domain::{
    EntityKind,
    view::{ViewContext, project_user},
};
use bouture_types::api::Claims;

use crate::auth::AppState;
use crate::error::{ApiError, join_error, not_found};

/// POST /favorites/{ad_id} — marks the ad for the token bearer. Already a
/// favorite is fine; the operation is idempotent on both sides.
pub async fn add(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let body = toggle(state, claims.sub, ad_id, true).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// DELETE /favorites/{ad_id}
pub async fn remove(
    State(state): State<AppState>,
    Path(ad_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, claims.sub, ad_id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle(
    state: AppState,
    user_id: Uuid,
    ad_id: Uuid,
    favorite: bool,
) -> Result<serde_json::Value, ApiError> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_user_graph(user_id)?
            .ok_or_else(|| not_found(EntityKind::User, user_id))?;
        if !db.db.fetch_ad_into(&mut graph, ad_id)? {
            return Err(not_found(EntityKind::Ad, ad_id));
        }

        if favorite {
            graph.add_favorite(user_id, ad_id)?;
        } else {
            graph.remove_favorite(user_id, ad_id)?;
        }
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_user(&graph, user_id, ViewContext::UserFavoris)?)
    })
    .await
    .map_err(join_error)?
}
