//! Read side: row queries plus hydration into an [`EntityGraph`]. Loaders
//! attach rows silently, replay the relationship links through the graph's
//! own paired operations (so mirrors come out consistent by construction),
//! and clear the change log before handing the graph back.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use bouture_domain::{EntityGraph, User};

use crate::Database;
use crate::models::{AdRow, CategoryRow, GrowthRow, MessageRow, PlantRow, UserRow, parse_uuid};

impl Database {
    // -- Users --

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            query_user_by_email(conn, email)?
                .map(UserRow::into_entity)
                .transpose()
        })
    }

    pub fn email_taken(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let taken = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(taken)
        })
    }

    /// All users with their ads (shallow), for the `user_browse` context.
    pub fn load_users_graph(&self) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            for row in query_users(conn)? {
                graph.attach_user(row.into_entity()?);
            }
            let user_ids: Vec<Uuid> = graph.users.keys().copied().collect();
            for user_id in user_ids {
                for ad_row in query_ads_for_user(conn, &user_id.to_string())? {
                    hydrate_ad(conn, &mut graph, ad_row, false)?;
                }
            }
            graph.clear_changes();
            Ok(graph)
        })
    }

    /// One user with ads and favorites, for `user_read` / `user_favoris`.
    pub fn load_user_graph(&self, id: Uuid) -> Result<Option<EntityGraph>> {
        self.with_conn(|conn| {
            let Some(user_row) = query_user(conn, &id.to_string())? else {
                return Ok(None);
            };
            let mut graph = EntityGraph::new();
            graph.attach_user(user_row.into_entity()?);
            for ad_row in query_ads_for_user(conn, &id.to_string())? {
                hydrate_ad(conn, &mut graph, ad_row, false)?;
            }
            for ad_id in query_favorite_ads_for_user(conn, &id.to_string())? {
                if !graph.ads.contains_key(&ad_id)
                    && let Some(ad_row) = query_ad(conn, &ad_id.to_string())?
                {
                    hydrate_ad(conn, &mut graph, ad_row, false)?;
                }
                graph.add_favorite(id, ad_id)?;
            }
            graph.clear_changes();
            Ok(Some(graph))
        })
    }

    /// Load one user record (no relations) into `graph`, e.g. before
    /// linking a new entity to it. No-op when already present or absent.
    pub fn fetch_user_into(&self, graph: &mut EntityGraph, id: Uuid) -> Result<bool> {
        if graph.users.contains_key(&id) {
            return Ok(true);
        }
        self.with_conn(|conn| {
            match query_user(conn, &id.to_string())? {
                Some(row) => {
                    graph.attach_user(row.into_entity()?);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    // -- Ads --

    /// Browse working set: active ads with their one-hop relations.
    pub fn load_browse_graph(&self) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            for ad_row in query_active_ads(conn)? {
                hydrate_ad(conn, &mut graph, ad_row, false)?;
            }
            graph.clear_changes();
            Ok(graph)
        })
    }

    /// One ad with relations, messages and favorites.
    pub fn load_ad_graph(&self, id: Uuid) -> Result<Option<EntityGraph>> {
        self.with_conn(|conn| {
            let Some(ad_row) = query_ad(conn, &id.to_string())? else {
                return Ok(None);
            };
            let mut graph = EntityGraph::new();
            hydrate_ad(conn, &mut graph, ad_row, true)?;
            graph.clear_changes();
            Ok(Some(graph))
        })
    }

    /// Referenced records needed to create an ad. Missing ids are simply
    /// absent from the graph; the link operations report `NotFound`.
    pub fn load_ad_context(
        &self,
        category_id: Uuid,
        growth_id: Uuid,
        user_id: Uuid,
        plant_id: Option<Uuid>,
    ) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            if let Some(row) = query_category(conn, &category_id.to_string())? {
                graph.attach_category(row.into_entity()?);
            }
            if let Some(row) = query_growth(conn, &growth_id.to_string())? {
                graph.attach_growth(row.into_entity()?);
            }
            if let Some(row) = query_user(conn, &user_id.to_string())? {
                graph.attach_user(row.into_entity()?);
            }
            if let Some(plant_id) = plant_id
                && let Some(row) = query_plant(conn, &plant_id.to_string())?
            {
                graph.attach_plant(row.into_entity()?);
            }
            Ok(graph)
        })
    }

    /// Load one ad with its one-hop relations into `graph`. Replaying the
    /// links drops any pending changes, so call this before mutating.
    pub fn fetch_ad_into(&self, graph: &mut EntityGraph, id: Uuid) -> Result<bool> {
        if graph.ads.contains_key(&id) {
            return Ok(true);
        }
        self.with_conn(|conn| {
            match query_ad(conn, &id.to_string())? {
                Some(row) => {
                    hydrate_ad(conn, graph, row, false)?;
                    graph.clear_changes();
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    pub fn fetch_category_into(&self, graph: &mut EntityGraph, id: Uuid) -> Result<bool> {
        if graph.categories.contains_key(&id) {
            return Ok(true);
        }
        self.with_conn(|conn| {
            match query_category(conn, &id.to_string())? {
                Some(row) => {
                    graph.attach_category(row.into_entity()?);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    pub fn fetch_growth_into(&self, graph: &mut EntityGraph, id: Uuid) -> Result<bool> {
        if graph.growths.contains_key(&id) {
            return Ok(true);
        }
        self.with_conn(|conn| {
            match query_growth(conn, &id.to_string())? {
                Some(row) => {
                    graph.attach_growth(row.into_entity()?);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    pub fn fetch_plant_into(&self, graph: &mut EntityGraph, id: Uuid) -> Result<bool> {
        if graph.plants.contains_key(&id) {
            return Ok(true);
        }
        self.with_conn(|conn| {
            match query_plant(conn, &id.to_string())? {
                Some(row) => {
                    graph.attach_plant(row.into_entity()?);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    // -- Categories --

    pub fn load_categories_graph(&self) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            for row in query_categories(conn)? {
                graph.attach_category(row.into_entity()?);
            }
            Ok(graph)
        })
    }

    pub fn load_category_graph(&self, id: Uuid) -> Result<Option<EntityGraph>> {
        self.with_conn(|conn| {
            let Some(row) = query_category(conn, &id.to_string())? else {
                return Ok(None);
            };
            let mut graph = EntityGraph::new();
            graph.attach_category(row.into_entity()?);
            Ok(Some(graph))
        })
    }

    // -- Plants --

    pub fn load_plants_graph(&self) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            for row in query_plants(conn)? {
                hydrate_plant(conn, &mut graph, row)?;
            }
            graph.clear_changes();
            Ok(graph)
        })
    }

    pub fn load_plant_graph(&self, id: Uuid) -> Result<Option<EntityGraph>> {
        self.with_conn(|conn| {
            let Some(row) = query_plant(conn, &id.to_string())? else {
                return Ok(None);
            };
            let mut graph = EntityGraph::new();
            let plant_id = hydrate_plant(conn, &mut graph, row)?;
            for ad_row in query_ads_for_plant(conn, &plant_id.to_string())? {
                hydrate_ad(conn, &mut graph, ad_row, false)?;
            }
            graph.clear_changes();
            Ok(Some(graph))
        })
    }

    // -- Messages --

    pub fn load_messages_graph(&self) -> Result<EntityGraph> {
        self.with_conn(|conn| {
            let mut graph = EntityGraph::new();
            for row in query_messages(conn)? {
                hydrate_message(conn, &mut graph, row)?;
            }
            graph.clear_changes();
            Ok(graph)
        })
    }

    pub fn load_message_graph(&self, id: Uuid) -> Result<Option<EntityGraph>> {
        self.with_conn(|conn| {
            let Some(row) = query_message(conn, &id.to_string())? else {
                return Ok(None);
            };
            let mut graph = EntityGraph::new();
            hydrate_message(conn, &mut graph, row)?;
            graph.clear_changes();
            Ok(Some(graph))
        })
    }
}

// -- Hydration --

/// Attach an ad row plus whatever one-hop records it references, then
/// replay the links. `deep` also pulls messages and favorites.
fn hydrate_ad(conn: &Connection, graph: &mut EntityGraph, row: AdRow, deep: bool) -> Result<Uuid> {
    let category_id = parse_uuid(&row.category_id)?;
    let growth_id = parse_uuid(&row.growths_id)?;
    let user_id = parse_uuid(&row.users_id)?;
    let plant_id = row.plants_id.as_deref().map(parse_uuid).transpose()?;
    let row_id = row.id.clone();

    if !graph.categories.contains_key(&category_id)
        && let Some(cat) = query_category(conn, &row.category_id)?
    {
        graph.attach_category(cat.into_entity()?);
    }
    if !graph.growths.contains_key(&growth_id)
        && let Some(growth) = query_growth(conn, &row.growths_id)?
    {
        graph.attach_growth(growth.into_entity()?);
    }
    if !graph.users.contains_key(&user_id)
        && let Some(user) = query_user(conn, &row.users_id)?
    {
        graph.attach_user(user.into_entity()?);
    }
    if let Some(plant_id) = plant_id
        && !graph.plants.contains_key(&plant_id)
        && let Some(plant) = query_plant(conn, &plant_id.to_string())?
    {
        graph.attach_plant(plant.into_entity()?);
    }

    let ad_id = graph.attach_ad(row.into_entity()?);
    graph.add_ad_to_category(category_id, ad_id)?;
    graph.add_ad_to_growth(growth_id, ad_id)?;
    graph.add_ad_to_user(user_id, ad_id)?;
    if let Some(plant_id) = plant_id {
        graph.set_ad_plant(ad_id, plant_id)?;
    }

    if deep {
        for message_row in query_messages_for_ad(conn, &row_id)? {
            hydrate_message_into_ad(conn, graph, message_row, ad_id)?;
        }
        for fan_id in query_fans_for_ad(conn, &row_id)? {
            if !graph.users.contains_key(&fan_id)
                && let Some(user) = query_user(conn, &fan_id.to_string())?
            {
                graph.attach_user(user.into_entity()?);
            }
            graph.add_favorite(fan_id, ad_id)?;
        }
    }

    Ok(ad_id)
}

fn hydrate_plant(conn: &Connection, graph: &mut EntityGraph, row: PlantRow) -> Result<Uuid> {
    let category_id = parse_uuid(&row.category_id)?;
    if !graph.categories.contains_key(&category_id)
        && let Some(cat) = query_category(conn, &row.category_id)?
    {
        graph.attach_category(cat.into_entity()?);
    }
    let plant_id = graph.attach_plant(row.into_entity()?);
    graph.add_plant_to_category(category_id, plant_id)?;
    Ok(plant_id)
}

fn hydrate_message(conn: &Connection, graph: &mut EntityGraph, row: MessageRow) -> Result<Uuid> {
    let ad_uuid = parse_uuid(&row.ads_id)?;
    if !graph.ads.contains_key(&ad_uuid)
        && let Some(ad_row) = query_ad(conn, &row.ads_id)?
    {
        hydrate_ad(conn, graph, ad_row, false)?;
    }
    hydrate_message_into_ad(conn, graph, row, ad_uuid)
}

fn hydrate_message_into_ad(
    conn: &Connection,
    graph: &mut EntityGraph,
    row: MessageRow,
    ad_id: Uuid,
) -> Result<Uuid> {
    let author_id = parse_uuid(&row.users_id)?;
    if !graph.users.contains_key(&author_id)
        && let Some(user) = query_user(conn, &row.users_id)?
    {
        graph.attach_user(user.into_entity()?);
    }
    let message_id = graph.attach_message(row.into_entity()?);
    graph.add_message_to_ad(ad_id, message_id)?;
    graph.add_message_to_user(author_id, message_id)?;
    Ok(message_id)
}

// -- Row queries --

const USER_COLS: &str =
    "id, email, password, pseudo, address, postal_code, city, lat, lng, avatar, roles, status, created_at, updated_at";
const AD_COLS: &str = "id, title, city, lat, lng, quantity, description, image, status, created_at, updated_at, category_id, users_id, growths_id, plants_id";
const PLANT_COLS: &str =
    "id, name, variety, difficulty, description, image, status, created_at, updated_at, category_id";
const MESSAGE_COLS: &str = "id, content, status, created_at, updated_at, ads_id, users_id";

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        pseudo: row.get(3)?,
        address: row.get(4)?,
        postal_code: row.get(5)?,
        city: row.get(6)?,
        lat: row.get(7)?,
        lng: row.get(8)?,
        avatar: row.get(9)?,
        roles: row.get(10)?,
        status: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_taxonomy_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, String, Option<String>)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn map_ad_row(row: &Row<'_>) -> rusqlite::Result<AdRow> {
    Ok(AdRow {
        id: row.get(0)?,
        title: row.get(1)?,
        city: row.get(2)?,
        lat: row.get(3)?,
        lng: row.get(4)?,
        quantity: row.get(5)?,
        description: row.get(6)?,
        image: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        category_id: row.get(11)?,
        users_id: row.get(12)?,
        growths_id: row.get(13)?,
        plants_id: row.get(14)?,
    })
}

fn map_plant_row(row: &Row<'_>) -> rusqlite::Result<PlantRow> {
    Ok(PlantRow {
        id: row.get(0)?,
        name: row.get(1)?,
        variety: row.get(2)?,
        difficulty: row.get(3)?,
        description: row.get(4)?,
        image: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        category_id: row.get(9)?,
    })
}

fn map_message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        content: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        ads_id: row.get(5)?,
        users_id: row.get(6)?,
    })
}

fn query_user(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLS} FROM user WHERE id = ?1"))?;
    Ok(stmt.query_row([id], map_user_row).optional()?)
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLS} FROM user WHERE email = ?1"))?;
    Ok(stmt.query_row([email], map_user_row).optional()?)
}

fn query_users(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLS} FROM user ORDER BY created_at"))?;
    let rows = stmt
        .query_map([], map_user_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_category(conn: &Connection, id: &str) -> Result<Option<CategoryRow>> {
    let mut stmt = conn
        .prepare("SELECT id, name, status, created_at, updated_at FROM category WHERE id = ?1")?;
    let row = stmt.query_row([id], map_taxonomy_row).optional()?;
    Ok(row.map(|(id, name, status, created_at, updated_at)| CategoryRow {
        id,
        name,
        status,
        created_at,
        updated_at,
    }))
}

fn query_categories(conn: &Connection) -> Result<Vec<CategoryRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, status, created_at, updated_at FROM category ORDER BY name")?;
    let rows = stmt
        .query_map([], map_taxonomy_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows
        .into_iter()
        .map(|(id, name, status, created_at, updated_at)| CategoryRow {
            id,
            name,
            status,
            created_at,
            updated_at,
        })
        .collect())
}

fn query_growth(conn: &Connection, id: &str) -> Result<Option<GrowthRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, status, created_at, updated_at FROM growth WHERE id = ?1")?;
    let row = stmt.query_row([id], map_taxonomy_row).optional()?;
    Ok(row.map(|(id, name, status, created_at, updated_at)| GrowthRow {
        id,
        name,
        status,
        created_at,
        updated_at,
    }))
}

fn query_plant(conn: &Connection, id: &str) -> Result<Option<PlantRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {PLANT_COLS} FROM plants WHERE id = ?1"))?;
    Ok(stmt.query_row([id], map_plant_row).optional()?)
}

fn query_plants(conn: &Connection) -> Result<Vec<PlantRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {PLANT_COLS} FROM plants ORDER BY name"))?;
    let rows = stmt
        .query_map([], map_plant_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_ad(conn: &Connection, id: &str) -> Result<Option<AdRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {AD_COLS} FROM ads WHERE id = ?1"))?;
    Ok(stmt.query_row([id], map_ad_row).optional()?)
}

fn query_active_ads(conn: &Connection) -> Result<Vec<AdRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AD_COLS} FROM ads WHERE status = 1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt
        .query_map([], map_ad_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_ads_for_user(conn: &Connection, user_id: &str) -> Result<Vec<AdRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AD_COLS} FROM ads WHERE users_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt
        .query_map([user_id], map_ad_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_ads_for_plant(conn: &Connection, plant_id: &str) -> Result<Vec<AdRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AD_COLS} FROM ads WHERE plants_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt
        .query_map([plant_id], map_ad_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {MESSAGE_COLS} FROM messages WHERE id = ?1"))?;
    Ok(stmt.query_row([id], map_message_row).optional()?)
}

fn query_messages(conn: &Connection) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM messages ORDER BY created_at"
    ))?;
    let rows = stmt
        .query_map([], map_message_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_messages_for_ad(conn: &Connection, ad_id: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLS} FROM messages WHERE ads_id = ?1 ORDER BY created_at"
    ))?;
    let rows = stmt
        .query_map([ad_id], map_message_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_fans_for_ad(conn: &Connection, ad_id: &str) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare("SELECT users_id FROM ads_user WHERE ads_id = ?1")?;
    let ids = stmt
        .query_map([ad_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.iter().map(|s| parse_uuid(s)).collect()
}

fn query_favorite_ads_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare("SELECT ads_id FROM ads_user WHERE users_id = ?1")?;
    let ids = stmt
        .query_map([user_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.iter().map(|s| parse_uuid(s)).collect()
}
