//! In-memory entity records. Relationship fields hold ids, not object
//! pointers: owning sides as `Option<Uuid>`, inverse sides as ordered id
//! sets. Both sides are maintained exclusively by [`crate::graph`] — direct
//! writes to relationship fields bypass mirroring and are a bug.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use bouture_types::models::{AdStatus, Coordinates, Role, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Category,
    Growth,
    Plant,
    Ad,
    Message,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Category => "category",
            EntityKind::Growth => "growth",
            EntityKind::Plant => "plant",
            EntityKind::Ad => "ad",
            EntityKind::Message => "message",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 hash, never a plaintext password and never projected.
    pub password_hash: String,
    pub pseudo: String,
    pub address: Option<String>,
    pub postal_code: Option<i64>,
    pub city: Option<String>,
    pub coordinates: Coordinates,
    pub avatar: Option<String>,
    pub roles: Vec<Role>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub ads: BTreeSet<Uuid>,
    pub messages: BTreeSet<Uuid>,
    pub favorites: BTreeSet<Uuid>,
}

impl User {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            password_hash: String::new(),
            pseudo: String::new(),
            address: None,
            postal_code: None,
            city: None,
            coordinates: [None, None],
            avatar: None,
            roles: vec![Role::User],
            status: Status::Active,
            created_at: Utc::now(),
            updated_at: None,
            ads: BTreeSet::new(),
            messages: BTreeSet::new(),
            favorites: BTreeSet::new(),
        }
    }

    /// Every account carries at least the base role, whatever is stored.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles = self.roles.clone();
        if !roles.contains(&Role::User) {
            roles.push(Role::User);
        }
        roles
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub ads: BTreeSet<Uuid>,
    pub plants: BTreeSet<Uuid>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: Status::Active,
            created_at: Utc::now(),
            updated_at: None,
            ads: BTreeSet::new(),
            plants: BTreeSet::new(),
        }
    }
}

/// Growth-stage taxonomy (seed, cutting, rooted plant...). Reference data,
/// seeded by the migrations; no write API of its own.
#[derive(Debug, Clone)]
pub struct Growth {
    pub id: Uuid,
    pub name: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub ads: BTreeSet<Uuid>,
}

impl Growth {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: Status::Active,
            created_at: Utc::now(),
            updated_at: None,
            ads: BTreeSet::new(),
        }
    }
}

/// Plant reference sheet an ad may link to.
#[derive(Debug, Clone)]
pub struct Plant {
    pub id: Uuid,
    pub name: String,
    pub variety: Option<String>,
    /// 0 (easy) to 5 (expert).
    pub difficulty: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Owning ref, required at persist time.
    pub category: Option<Uuid>,
    pub ads: BTreeSet<Uuid>,
}

impl Plant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            variety: None,
            difficulty: None,
            description: None,
            image: None,
            status: Status::Active,
            created_at: Utc::now(),
            updated_at: None,
            category: None,
            ads: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ad {
    pub id: Uuid,
    pub title: String,
    pub city: Option<String>,
    pub coordinates: Coordinates,
    pub quantity: i64,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Owning refs. `category`, `growth` and `user` are required at persist
    /// time; `plant` is an optional link to a reference sheet. They are
    /// `Option` here because mirror maintenance transiently clears them.
    pub category: Option<Uuid>,
    pub growth: Option<Uuid>,
    pub user: Option<Uuid>,
    pub plant: Option<Uuid>,
    pub messages: BTreeSet<Uuid>,
    pub favorited_by: BTreeSet<Uuid>,
}

impl Ad {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            city: None,
            coordinates: [None, None],
            quantity: 0,
            description: None,
            image: None,
            status: AdStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
            category: None,
            growth: None,
            user: None,
            plant: None,
            messages: BTreeSet::new(),
            favorited_by: BTreeSet::new(),
        }
    }
}

impl Default for Ad {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Owning refs, both required at persist time.
    pub ad: Option<Uuid>,
    pub user: Option<Uuid>,
}

impl Message {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            status: Status::Active,
            created_at: Utc::now(),
            updated_at: None,
            ad: None,
            user: None,
        }
    }
}
