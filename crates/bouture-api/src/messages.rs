use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use bouture_domain::{
    EntityKind, Message, lifecycle,
    validate::validate_message,
    view::{ViewContext, project_message},
};
use bouture_types::api::{Claims, MessageInput, StatusPatch};
use bouture_types::models::Status;

use crate::auth::AppState;
use crate::error::{ApiError, join_error, not_found};
use crate::middleware::actor;

/// GET /messages
pub async fn browse(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db.db.load_messages_graph()?;
        let mut ids: Vec<Uuid> = graph.messages.keys().copied().collect();
        ids.sort_by_key(|id| graph.messages[id].created_at);
        let mut out = Vec::new();
        for id in ids {
            out.push(project_message(&graph, id, ViewContext::MessagesBrowse)?);
        }
        Ok::<_, ApiError>(Value::Array(out))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// GET /messages/{id}
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_message_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Message, id))?;
        Ok::<_, ApiError>(project_message(&graph, id, ViewContext::MessagesRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /messages — authored by the token bearer, addressed to an ad.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<MessageInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_message(&input)?;
    let (Some(content), Some(ad_id)) = (input.content.clone(), input.ad) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_ad_graph(ad_id)?
            .ok_or_else(|| not_found(EntityKind::Ad, ad_id))?;
        if !db.db.fetch_user_into(&mut graph, claims.sub)? {
            return Err(not_found(EntityKind::User, claims.sub));
        }

        let message_id = graph.insert_message(Message::new(content));
        graph.add_message_to_ad(ad_id, message_id)?;
        graph.add_message_to_user(claims.sub, message_id)?;

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_message(&graph, message_id, ViewContext::MessagesRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(body)))
}

/// PATCH /messages/{id}/status — moderation happens by deactivation; rows
/// are never removed on their own.
pub async fn patch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<StatusPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = patch
        .status
        .ok_or_else(|| ApiError::BadRequest("status manquant".into()))?;
    let status = Status::try_from(raw).map_err(ApiError::BadRequest)?;
    let who = actor(&claims);

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_message_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Message, id))?;
        lifecycle::set_message_status(&mut graph, id, status, &who)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_message(&graph, id, ViewContext::MessagesRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}
