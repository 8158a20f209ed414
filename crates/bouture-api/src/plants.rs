use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use bouture_domain::{
    EntityKind, Plant, lifecycle,
    validate::validate_plant,
    view::{ViewContext, project_plant},
};
use bouture_types::api::{Claims, PlantInput, StatusPatch};
use bouture_types::models::Status;

use crate::auth::AppState;
use crate::error::{ApiError, join_error, not_found};
use crate::middleware::actor;
use crate::uploads::first_image;

/// GET /plants — public; the plant encyclopedia.
pub async fn browse(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db.db.load_plants_graph()?;
        let mut ids: Vec<Uuid> = graph.plants.keys().copied().collect();
        ids.sort_by_key(|id| graph.plants[id].name.clone());
        let mut out = Vec::new();
        for id in ids {
            out.push(project_plant(&graph, id, ViewContext::PlantsBrowse)?);
        }
        Ok::<_, ApiError>(Value::Array(out))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// GET /plants/{id} — detail sheet with the ads currently offering it.
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_plant_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Plant, id))?;
        Ok::<_, ApiError>(project_plant(&graph, id, ViewContext::PlantsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /plants
pub async fn create(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(input): Json<PlantInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_plant(&input)?;
    let (Some(name), Some(category_id)) = (input.name.clone(), input.category) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = bouture_domain::EntityGraph::new();
        if !db.db.fetch_category_into(&mut graph, category_id)? {
            return Err(not_found(EntityKind::Category, category_id));
        }

        let mut plant = Plant::new(name);
        plant.variety = input.variety;
        plant.difficulty = input.difficulty;
        plant.description = input.description;
        let plant_id = graph.insert_plant(plant);
        graph.add_plant_to_category(category_id, plant_id)?;

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_plant(&graph, plant_id, ViewContext::PlantsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(body)))
}

/// PUT /plants/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    Json(input): Json<PlantInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_plant(&input)?;
    let (Some(name), Some(category_id)) = (input.name.clone(), input.category) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_plant_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Plant, id))?;
        if !db.db.fetch_category_into(&mut graph, category_id)? {
            return Err(not_found(EntityKind::Category, category_id));
        }
        graph.add_plant_to_category(category_id, id)?;

        let plant = graph.plant_mut(id)?;
        plant.name = name;
        plant.variety = input.variety;
        plant.difficulty = input.difficulty;
        plant.description = input.description;
        plant.updated_at = Some(chrono::Utc::now());
        graph.mark_dirty(EntityKind::Plant, id);

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_plant(&graph, id, ViewContext::PlantsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// PATCH /plants/{id}/status
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
            .load_plant_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Plant, id))?;
        lifecycle::set_plant_status(&mut graph, id, status, &who)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_plant(&graph, id, ViewContext::PlantsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /plants/{id}/image
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = first_image(multipart).await?;

    let db = state.clone();
    let existing = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_plant_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Plant, id))?;
        Ok::<_, ApiError>(graph.plant(id)?.image.clone())
    })
    .await
    .map_err(join_error)??;

    let name = state.images.resolve(existing, upload).await?;

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_plant_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Plant, id))?;
        graph.plant_mut(id)?.image = name;
        graph.mark_dirty(EntityKind::Plant, id);
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_plant(&graph, id, ViewContext::PlantsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}
