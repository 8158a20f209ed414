use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

use bouture_domain::{
    Action, Ad, EntityKind, Resource, ensure, lifecycle,
    validate::validate_ad,
    view::{ViewContext, project_ad},
};
use bouture_types::api::{AdInput, Claims, DeleteQuery, StatusPatch};
use bouture_types::models::AdStatus;

use crate::auth::AppState;
use crate::error::{ApiError, join_error, not_found};
use crate::middleware::actor;
use crate::uploads::first_image;

/// GET /ads — public; active ads only, newest first.
pub async fn browse(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db.db.load_browse_graph()?;
        let mut out = Vec::new();
        for ad in graph.browse_ads() {
            out.push(project_ad(&graph, ad.id, ViewContext::AdsBrowse)?);
        }
        Ok::<_, ApiError>(Value::Array(out))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// GET /ads/{id} — public; full detail with messages and favorites.
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        Ok::<_, ApiError>(project_ad(&graph, id, ViewContext::AdsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /ads — the ad is owned by the token bearer, never by a body field.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<AdInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_ad(&input)?;
    let (Some(title), Some(quantity), Some(category_id), Some(growth_id)) = (
        input.title.clone(),
        input.quantity,
        input.category,
        input.growth,
    ) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph =
            db.db
                .load_ad_context(category_id, growth_id, claims.sub, input.plant)?;

        let mut ad = Ad::new();
        ad.title = title;
        ad.city = input.city;
        ad.coordinates = input.coordinates;
        ad.quantity = quantity;
        ad.description = input.description;
        let ad_id = graph.insert_ad(ad);

        graph.add_ad_to_category(category_id, ad_id)?;
        graph.add_ad_to_growth(growth_id, ad_id)?;
        graph.add_ad_to_user(claims.sub, ad_id)?;
        if let Some(plant_id) = input.plant {
            graph.set_ad_plant(ad_id, plant_id)?;
        }

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_ad(&graph, ad_id, ViewContext::AdsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(body)))
}

/// PUT /ads/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<AdInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_ad(&input)?;
    let (Some(title), Some(quantity), Some(category_id), Some(growth_id)) = (
        input.title.clone(),
        input.quantity,
        input.category,
        input.growth,
    ) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };
    let who = actor(&claims);

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        ensure(&who, Action::Edit, &Resource::Ad(id))?;

        relink(&db.db, &mut graph, id, category_id, growth_id, input.plant)?;

        let ad = graph.ad_mut(id)?;
        ad.title = title;
        ad.city = input.city;
        ad.coordinates = input.coordinates;
        ad.quantity = quantity;
        ad.description = input.description;
        ad.updated_at = Some(chrono::Utc::now());
        graph.mark_dirty(EntityKind::Ad, id);

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_ad(&graph, id, ViewContext::AdsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// Point the ad at its (possibly new) category, growth stage and plant.
/// The paired graph operations detach the previous owners themselves.
fn relink(
    db: &bouture_db::Database,
    graph: &mut bouture_domain::EntityGraph,
    ad_id: Uuid,
    category_id: Uuid,
    growth_id: Uuid,
    plant_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if !db.fetch_category_into(graph, category_id)? {
        return Err(not_found(EntityKind::Category, category_id));
    }
    if !db.fetch_growth_into(graph, growth_id)? {
        return Err(not_found(EntityKind::Growth, growth_id));
    }
    graph.add_ad_to_category(category_id, ad_id)?;
    graph.add_ad_to_growth(growth_id, ad_id)?;
    match plant_id {
        Some(plant_id) => {
            if !db.fetch_plant_into(graph, plant_id)? {
                return Err(not_found(EntityKind::Plant, plant_id));
            }
            graph.set_ad_plant(ad_id, plant_id)?;
        }
        None => {
            if graph.ad(ad_id)?.plant.is_some() {
                graph.clear_ad_plant(ad_id)?;
            }
        }
    }
    Ok(())
}

/// DELETE /ads/{id}?cascade=true — the only physical delete in the system.
/// Without the cascade flag an ad that still has messages is refused.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);

    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        ensure(&who, Action::Delete, &Resource::Ad(id))?;
        graph.remove_ad(id, query.cascade)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(())
    })
    .await
    .map_err(join_error)??;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /ads/{id}/status — the soft-delete lever; any of the three states
/// can be set from any other.
pub async fn patch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<StatusPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = patch
        .status
        .ok_or_else(|| ApiError::BadRequest("status manquant".into()))?;
    let status = AdStatus::try_from(raw).map_err(ApiError::BadRequest)?;
    let who = actor(&claims);

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        lifecycle::set_ad_status(&mut graph, id, status, &who)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_ad(&graph, id, ViewContext::AdsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /ads/{id}/image — multipart upload; replaces the reference, keeps
/// the old file on disk.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let upload = first_image(multipart).await?;

    let db = state.clone();
    let existing = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        ensure(&who, Action::Edit, &Resource::Ad(id))?;
        Ok::<_, ApiError>(graph.ad(id)?.image.clone())
    })
    .await
    .map_err(join_error)??;

    let name = state.images.resolve(existing, upload).await?;

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_ad_graph(id)?
            .ok_or_else(|| not_found(EntityKind::Ad, id))?;
        graph.ad_mut(id)?.image = name;
        graph.mark_dirty(EntityKind::Ad, id);
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_ad(&graph, id, ViewContext::AdsRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}
