use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use uuid::Uuid;

use bouture_domain::{
    Action, EntityKind, Resource, User, ensure, lifecycle,
    validate::validate_user,
    view::{ViewContext, project_user},
};
use bouture_types::api::{Claims, StatusPatch, UserInput};
use bouture_types::models::Status;

use crate::auth::{AppState, create_token, hash_password};
use crate::error::{ApiError, join_error, not_found};
use crate::middleware::actor;
use crate::uploads::first_image;

/// GET /users
pub async fn browse(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let graph = db.db.load_users_graph()?;
        let mut ids: Vec<Uuid> = graph.users.keys().copied().collect();
        ids.sort();
        let mut out = Vec::new();
        for id in ids {
            out.push(project_user(&graph, id, ViewContext::UserBrowse)?);
        }
        Ok::<_, ApiError>(Value::Array(out))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// GET /users/current — the token bearer's own profile.
pub async fn current(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    read_projection(state, claims.sub).await.map(Json)
}

/// GET /users/{id} — profiles are private; only the owner passes the gate.
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    ensure(&actor(&claims), Action::Read, &Resource::User(id))?;
    read_projection(state, id).await.map(Json)
}

async fn read_projection(state: AppState, id: Uuid) -> Result<Value, ApiError> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_user_graph(id)?
            .ok_or_else(|| not_found(EntityKind::User, id))?;
        Ok::<_, ApiError>(project_user(&graph, id, ViewContext::UserRead)?)
    })
    .await
    .map_err(join_error)?
}

/// POST /users — public registration. Answers with the new profile and a
/// ready-to-use token.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_user(&input, true)?;
    let (Some(email), Some(password), Some(pseudo)) = (
        input.email.clone(),
        input.password.clone(),
        input.pseudo.clone(),
    ) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };

    let db = state.clone();
    let taken = {
        let email = email.clone();
        tokio::task::spawn_blocking(move || db.db.email_taken(&email))
            .await
            .map_err(join_error)??
    };
    if taken {
        return Err(ApiError::Conflict("Cet email est déjà utilisé".into()));
    }

    let password_hash = hash_password(&password)?;

    let mut user = User::new();
    user.email = email;
    user.password_hash = password_hash;
    user.pseudo = pseudo.clone();
    user.address = input.address;
    user.postal_code = input.postal_code;
    user.city = input.city;
    user.coordinates = input.coordinates;
    let user_id = user.id;
    let roles = user.roles();

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = bouture_domain::EntityGraph::new();
        graph.insert_user(user);
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_user(&graph, user_id, ViewContext::UserRead)?)
    })
    .await
    .map_err(join_error)??;

    let token = create_token(&state.jwt_secret, user_id, &pseudo, roles)
        .map_err(ApiError::Internal)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": body, "token": token })),
    ))
}

/// PUT /users/{id} — owner only. The password is rehashed only when the
/// body carries a new one.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(input): Json<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure(&actor(&claims), Action::Edit, &Resource::User(id))?;
    validate_user(&input, false)?;
    let (Some(email), Some(pseudo)) = (input.email.clone(), input.pseudo.clone()) else {
        return Err(ApiError::BadRequest("champs manquants".into()));
    };
    let new_hash = input
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_user_graph(id)?
            .ok_or_else(|| not_found(EntityKind::User, id))?;

        let current_email = graph.user(id)?.email.clone();
        if email != current_email && db.db.email_taken(&email)? {
            return Err(ApiError::Conflict("Cet email est déjà utilisé".into()));
        }

        let user = graph.user_mut(id)?;
        user.email = email;
        user.pseudo = pseudo;
        user.address = input.address;
        user.postal_code = input.postal_code;
        user.city = input.city;
        user.coordinates = input.coordinates;
        if let Some(hash) = new_hash {
            user.password_hash = hash;
        }
        user.updated_at = Some(chrono::Utc::now());
        graph.mark_dirty(EntityKind::User, id);

        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_user(&graph, id, ViewContext::UserRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// PATCH /users/{id}/status — account deactivation and reactivation. The
/// gate treats this as the delete action: owner, or an admin whose role
/// list is exactly the admin role.
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
            .load_user_graph(id)?
            .ok_or_else(|| not_found(EntityKind::User, id))?;
        lifecycle::set_user_status(&mut graph, id, status, &who)?;
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_user(&graph, id, ViewContext::UserRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}

/// POST /users/{id}/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    ensure(&actor(&claims), Action::Edit, &Resource::User(id))?;
    let upload = first_image(multipart).await?;

    let db = state.clone();
    let existing = tokio::task::spawn_blocking(move || {
        let graph = db
            .db
            .load_user_graph(id)?
            .ok_or_else(|| not_found(EntityKind::User, id))?;
        Ok::<_, ApiError>(graph.user(id)?.avatar.clone())
    })
    .await
    .map_err(join_error)??;

    let name = state.images.resolve(existing, upload).await?;

    let db = state.clone();
    let body = tokio::task::spawn_blocking(move || {
        let mut graph = db
            .db
            .load_user_graph(id)?
            .ok_or_else(|| not_found(EntityKind::User, id))?;
        graph.user_mut(id)?.avatar = name;
        graph.mark_dirty(EntityKind::User, id);
        db.db.apply(&mut graph)?;
        Ok::<_, ApiError>(project_user(&graph, id, ViewContext::UserRead)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(body))
}
