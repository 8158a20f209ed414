//! Database row types — these map directly to SQLite rows, distinct from
//! the domain entities so the storage shape can drift without touching the
//! graph. `into_entity` leaves every inverse collection empty; mirrors are
//! replayed by the loaders through the graph's own link operations.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use bouture_domain::{Ad, Category, Growth, Message, Plant, User};
use bouture_types::models::{AdStatus, Role, Status};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub pseudo: String,
    pub address: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub avatar: Option<String>,
    pub roles: String,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct GrowthRow {
    pub id: String,
    pub name: String,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct PlantRow {
    pub id: String,
    pub name: String,
    pub variety: Option<String>,
    pub difficulty: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub category_id: String,
}

pub struct AdRow {
    pub id: String,
    pub title: String,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub quantity: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub category_id: String,
    pub users_id: String,
    pub growths_id: String,
    pub plants_id: Option<String>,
}

pub struct MessageRow {
    pub id: String,
    pub content: String,
    pub status: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub ads_id: String,
    pub users_id: String,
}

pub fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse().with_context(|| format!("corrupt uuid '{s}'"))
}

/// SQLite seeds rows with `datetime('now')` while the application writes
/// RFC 3339; accept both.
pub fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{s}'"))
}

fn parse_status(v: i64) -> Result<Status> {
    Status::try_from(v as u8).map_err(anyhow::Error::msg)
}

impl UserRow {
    pub fn into_entity(self) -> Result<User> {
        let roles: Vec<Role> =
            serde_json::from_str(&self.roles).with_context(|| "corrupt roles column")?;
        Ok(User {
            id: parse_uuid(&self.id)?,
            email: self.email,
            password_hash: self.password,
            pseudo: self.pseudo,
            address: self.address,
            postal_code: self.postal_code,
            city: self.city,
            coordinates: [self.lat, self.lng],
            avatar: self.avatar,
            roles,
            status: parse_status(self.status)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            ads: Default::default(),
            messages: Default::default(),
            favorites: Default::default(),
        })
    }
}

impl CategoryRow {
    pub fn into_entity(self) -> Result<Category> {
        Ok(Category {
            id: parse_uuid(&self.id)?,
            name: self.name,
            status: parse_status(self.status)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            ads: Default::default(),
            plants: Default::default(),
        })
    }
}

impl GrowthRow {
    pub fn into_entity(self) -> Result<Growth> {
        Ok(Growth {
            id: parse_uuid(&self.id)?,
            name: self.name,
            status: parse_status(self.status)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            ads: Default::default(),
        })
    }
}

impl PlantRow {
    pub fn into_entity(self) -> Result<Plant> {
        Ok(Plant {
            id: parse_uuid(&self.id)?,
            name: self.name,
            variety: self.variety,
            difficulty: self.difficulty,
            description: self.description,
            image: self.image,
            status: parse_status(self.status)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            category: None,
            ads: Default::default(),
        })
    }
}

impl AdRow {
    pub fn into_entity(self) -> Result<Ad> {
        Ok(Ad {
            id: parse_uuid(&self.id)?,
            title: self.title,
            city: self.city,
            coordinates: [self.lat, self.lng],
            quantity: self.quantity,
            description: self.description,
            image: self.image,
            status: AdStatus::try_from(self.status as u8).map_err(anyhow::Error::msg)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            category: None,
            growth: None,
            user: None,
            plant: None,
            messages: Default::default(),
            favorited_by: Default::default(),
        })
    }
}

impl MessageRow {
    pub fn into_entity(self) -> Result<Message> {
        Ok(Message {
            id: parse_uuid(&self.id)?,
            content: self.content,
            status: parse_status(self.status)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_ts).transpose()?,
            ad: None,
            user: None,
        })
    }
}
