use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Coordinates, Role};

// -- JWT Claims --

/// JWT claims shared between the auth handlers (token issue) and the REST
/// middleware (token check). Canonical definition lives here in
/// bouture-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub pseudo: String,
    pub roles: Vec<Role>,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub pseudo: String,
    pub token: String,
}

// -- Write bodies --
//
// Every field is optional at the serde level so validation can report all
// missing fields at once instead of failing on the first deserialize error.

#[derive(Debug, Default, Deserialize)]
pub struct AdInput {
    pub title: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub quantity: Option<i64>,
    pub description: Option<String>,
    pub category: Option<Uuid>,
    pub growth: Option<Uuid>,
    pub plant: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub pseudo: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    #[serde(default)]
    pub coordinates: Coordinates,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageInput {
    pub content: Option<String>,
    pub ad: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlantInput {
    pub name: Option<String>,
    pub variety: Option<String>,
    pub difficulty: Option<i64>,
    pub description: Option<String>,
    pub category: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
}

/// Body of the status-only PATCH endpoints.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusPatch {
    pub status: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub cascade: bool,
}
