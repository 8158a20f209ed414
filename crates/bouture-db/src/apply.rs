//! Write side: flushes a graph's pending change set in one transaction.
//!
//! Upserts use `ON CONFLICT(id) DO UPDATE` rather than `INSERT OR REPLACE`;
//! REPLACE deletes the conflicting row first, which would fire the
//! `ads_user` cascade and silently drop favorites on every ad edit.

use anyhow::{Context, Result, bail};
use rusqlite::{Transaction, params};
use tracing::debug;
use uuid::Uuid;

use bouture_domain::{Change, EntityGraph, EntityKind};

use crate::Database;

impl Database {
    /// Persist every pending change on `graph`, in the order recorded.
    /// The change log is drained even when nothing is pending.
    pub fn apply(&self, graph: &mut EntityGraph) -> Result<()> {
        let changes = graph.take_changes();
        if changes.is_empty() {
            return Ok(());
        }
        debug!(count = changes.len(), "flushing change set");

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for change in &changes {
                match change {
                    Change::Upsert(kind, id) => upsert(&tx, graph, *kind, *id)?,
                    Change::Delete(kind, id) => {
                        tx.execute(
                            &format!("DELETE FROM {} WHERE id = ?1", table_for(*kind)),
                            [id.to_string()],
                        )?;
                    }
                    Change::Favorite { user, ad } => {
                        tx.execute(
                            "INSERT OR IGNORE INTO ads_user (ads_id, users_id) VALUES (?1, ?2)",
                            params![ad.to_string(), user.to_string()],
                        )?;
                    }
                    Change::Unfavorite { user, ad } => {
                        tx.execute(
                            "DELETE FROM ads_user WHERE ads_id = ?1 AND users_id = ?2",
                            params![ad.to_string(), user.to_string()],
                        )?;
                    }
                }
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "user",
        EntityKind::Category => "category",
        EntityKind::Growth => "growth",
        EntityKind::Plant => "plants",
        EntityKind::Ad => "ads",
        EntityKind::Message => "messages",
    }
}

/// An upsert for an entity no longer in the graph is skipped; a later
/// delete in the same change set already superseded it.
fn upsert(tx: &Transaction<'_>, graph: &EntityGraph, kind: EntityKind, id: Uuid) -> Result<()> {
    match kind {
        EntityKind::User => {
            let Some(user) = graph.users.get(&id) else {
                return Ok(());
            };
            let roles = serde_json::to_string(&user.roles).context("serializing roles")?;
            tx.execute(
                "INSERT INTO user (id, email, password, pseudo, address, postal_code, city,
                                   lat, lng, avatar, roles, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(id) DO UPDATE SET
                     email = excluded.email, password = excluded.password,
                     pseudo = excluded.pseudo, address = excluded.address,
                     postal_code = excluded.postal_code, city = excluded.city,
                     lat = excluded.lat, lng = excluded.lng, avatar = excluded.avatar,
                     roles = excluded.roles, status = excluded.status,
                     updated_at = excluded.updated_at",
                params![
                    user.id.to_string(),
                    user.email,
                    user.password_hash,
                    user.pseudo,
                    user.address,
                    user.postal_code,
                    user.city,
                    user.coordinates[0],
                    user.coordinates[1],
                    user.avatar,
                    roles,
                    user.status.as_int(),
                    user.created_at.to_rfc3339(),
                    user.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }
        EntityKind::Category => {
            let Some(category) = graph.categories.get(&id) else {
                return Ok(());
            };
            tx.execute(
                "INSERT INTO category (id, name, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name, status = excluded.status,
                     updated_at = excluded.updated_at",
                params![
                    category.id.to_string(),
                    category.name,
                    category.status.as_int(),
                    category.created_at.to_rfc3339(),
                    category.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }
        EntityKind::Growth => {
            let Some(growth) = graph.growths.get(&id) else {
                return Ok(());
            };
            tx.execute(
                "INSERT INTO growth (id, name, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name, status = excluded.status,
                     updated_at = excluded.updated_at",
                params![
                    growth.id.to_string(),
                    growth.name,
                    growth.status.as_int(),
                    growth.created_at.to_rfc3339(),
                    growth.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }
        EntityKind::Plant => {
            let Some(plant) = graph.plants.get(&id) else {
                return Ok(());
            };
            let Some(category) = plant.category else {
                bail!("plant {} has no category at flush time", plant.id);
            };
            tx.execute(
                "INSERT INTO plants (id, name, variety, difficulty, description, image,
                                     status, created_at, updated_at, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name, variety = excluded.variety,
                     difficulty = excluded.difficulty, description = excluded.description,
                     image = excluded.image, status = excluded.status,
                     updated_at = excluded.updated_at, category_id = excluded.category_id",
                params![
                    plant.id.to_string(),
                    plant.name,
                    plant.variety,
                    plant.difficulty,
                    plant.description,
                    plant.image,
                    plant.status.as_int(),
                    plant.created_at.to_rfc3339(),
                    plant.updated_at.map(|t| t.to_rfc3339()),
                    category.to_string(),
                ],
            )?;
        }
        EntityKind::Ad => {
            let Some(ad) = graph.ads.get(&id) else {
                return Ok(());
            };
            let (Some(category), Some(growth), Some(user)) = (ad.category, ad.growth, ad.user)
            else {
                bail!("ad {} is missing required links at flush time", ad.id);
            };
            tx.execute(
                "INSERT INTO ads (id, title, city, lat, lng, quantity, description, image,
                                  status, created_at, updated_at,
                                  category_id, users_id, growths_id, plants_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title, city = excluded.city,
                     lat = excluded.lat, lng = excluded.lng,
                     quantity = excluded.quantity, description = excluded.description,
                     image = excluded.image, status = excluded.status,
                     updated_at = excluded.updated_at,
                     category_id = excluded.category_id, users_id = excluded.users_id,
                     growths_id = excluded.growths_id, plants_id = excluded.plants_id",
                params![
                    ad.id.to_string(),
                    ad.title,
                    ad.city,
                    ad.coordinates[0],
                    ad.coordinates[1],
                    ad.quantity,
                    ad.description,
                    ad.image,
                    ad.status.as_int(),
                    ad.created_at.to_rfc3339(),
                    ad.updated_at.map(|t| t.to_rfc3339()),
                    category.to_string(),
                    user.to_string(),
                    growth.to_string(),
                    ad.plant.map(|p| p.to_string()),
                ],
            )?;
        }
        EntityKind::Message => {
            let Some(message) = graph.messages.get(&id) else {
                return Ok(());
            };
            let (Some(ad), Some(user)) = (message.ad, message.user) else {
                bail!("message {} is missing required links at flush time", message.id);
            };
            tx.execute(
                "INSERT INTO messages (id, content, status, created_at, updated_at, ads_id, users_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     content = excluded.content, status = excluded.status,
                     updated_at = excluded.updated_at,
                     ads_id = excluded.ads_id, users_id = excluded.users_id",
                params![
                    message.id.to_string(),
                    message.content,
                    message.status.as_int(),
                    message.created_at.to_rfc3339(),
                    message.updated_at.map(|t| t.to_rfc3339()),
                    ad.to_string(),
                    user.to_string(),
                ],
            )?;
        }
    }
    Ok(())
}
