use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use bouture_domain::{
    Category, EntityKind, lifecycle,
    validate::validate_category,
    view::{ViewContext, project_category},
};
use bouture_types::api::{CategoryInput, Claims, StatusPatch};
use bouture_types::models::Status;

use crate::auth::AppState;
use crate::error::{ApiError, join_error, not_found};
use crate::middleware::actor;

/// GET /categories — public; feeds the navigation.
pub async fn browse(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db.db.load_categories_graph()?;
        let mut ids: Vec<Uuid> = graph.categories.keys().copied().collect();
        ids.sort_by_key(|id| graph.categories[id].name.clone());
        let mut out = Vec::new();
        for id in ids {
            out.push(project_category(&graph, id, ViewContext::CategoryBrowse)?);
        }
        Ok::<_, ApiError>(Value::Array(out))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// GET /categories/{id}
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_category_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Category, id))?;
        Ok::<_, ApiError>(project_category(&graph, id, ViewContext::CategoryRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /categories
pub async fn create(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_category(&input)?;
    let Some(name) = input.name else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = bouture_domain::EntityGraph::new();
        let id = graph.insert_category(Category::new(name));
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_category(&graph, id, ViewContext::CategoryRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(body)))
}

/// PUT /categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_category(&input)?;
    let Some(name) = input.name else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_category_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Category, id))?;
        let category = graph.category_mut(id)?;
        category.name = name;
        category.updated_at = Some(chrono::Utc::now());
        graph.mark_dirty(EntityKind::Category, id);
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_category(&graph, id, ViewContext::CategoryRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// PATCH /categories/{id}/status
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
            .load_category_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Category, id))?;
        lifecycle::set_category_status(&mut graph, id, status, &who)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_category(&graph, id, ViewContext::CategoryRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}
