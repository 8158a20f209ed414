//! Visibility projector: maps (entity snapshot, named context) to the exact
//! field subset exposed externally. Membership mirrors the legacy
//! serialization-group table, with two hard guarantees on top of it:
//! the password hash is never emitted, in any context, and relationships
//! expand exactly one hop — a nested entity is rendered with its scalar
//! whitelist only, never its own collections or links.
//!
//! Projection is pure: no side effects, and identical (snapshot, context)
//! pairs produce identical values (collections render in id order).

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::entities::{Ad, Category, Growth, Message, Plant, User};
use crate::error::Error;
use crate::graph::EntityGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewContext {
    AdsBrowse,
    AdsRead,
    UserBrowse,
    UserRead,
    UserFavoris,
    CategoryBrowse,
    CategoryRead,
    PlantsBrowse,
    PlantsRead,
    MessagesBrowse,
    MessagesRead,
}

impl ViewContext {
    pub fn name(self) -> &'static str {
        match self {
            ViewContext::AdsBrowse => "ads_browse",
            ViewContext::AdsRead => "ads_read",
            ViewContext::UserBrowse => "user_browse",
            ViewContext::UserRead => "user_read",
            ViewContext::UserFavoris => "user_favoris",
            ViewContext::CategoryBrowse => "category_browse",
            ViewContext::CategoryRead => "category_read",
            ViewContext::PlantsBrowse => "plants_browse",
            ViewContext::PlantsRead => "plants_read",
            ViewContext::MessagesBrowse => "messages_browse",
            ViewContext::MessagesRead => "messages_read",
        }
    }

    pub const ALL: [ViewContext; 11] = [
        ViewContext::AdsBrowse,
        ViewContext::AdsRead,
        ViewContext::UserBrowse,
        ViewContext::UserRead,
        ViewContext::UserFavoris,
        ViewContext::CategoryBrowse,
        ViewContext::CategoryRead,
        ViewContext::PlantsBrowse,
        ViewContext::PlantsRead,
        ViewContext::MessagesBrowse,
        ViewContext::MessagesRead,
    ];
}

/// Nested renderings never expand their own relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    Root,
    Nested,
}

// -- Entry points --

pub fn project_user(graph: &EntityGraph, id: Uuid, ctx: ViewContext) -> Result<Value, Error> {
    Ok(render_user(graph, graph.user(id)?, ctx, Depth::Root))
}

pub fn project_ad(graph: &EntityGraph, id: Uuid, ctx: ViewContext) -> Result<Value, Error> {
    Ok(render_ad(graph, graph.ad(id)?, ctx, Depth::Root))
}

pub fn project_category(graph: &EntityGraph, id: Uuid, ctx: ViewContext) -> Result<Value, Error> {
    Ok(render_category(graph.category(id)?, ctx))
}

pub fn project_plant(graph: &EntityGraph, id: Uuid, ctx: ViewContext) -> Result<Value, Error> {
    Ok(render_plant(graph, graph.plant(id)?, ctx, Depth::Root))
}

pub fn project_message(graph: &EntityGraph, id: Uuid, ctx: ViewContext) -> Result<Value, Error> {
    Ok(render_message(graph, graph.message(id)?, ctx, Depth::Root))
}

// -- Per-kind renderings --

fn render_user(graph: &EntityGraph, user: &User, ctx: ViewContext, depth: Depth) -> Value {
    use ViewContext::*;
    let mut obj = Map::new();

    if matches!(
        ctx,
        UserBrowse | UserRead | UserFavoris | AdsBrowse | AdsRead | MessagesBrowse | MessagesRead
    ) {
        obj.insert("id".into(), json!(user.id));
    }
    if matches!(ctx, UserBrowse | UserRead | AdsRead) {
        obj.insert("email".into(), json!(user.email));
    }
    // The password hash is excluded unconditionally.
    if matches!(ctx, UserBrowse | UserRead | AdsBrowse | AdsRead) {
        obj.insert("pseudo".into(), json!(user.pseudo));
    }
    if matches!(ctx, UserBrowse | UserRead) {
        obj.insert("address".into(), json!(user.address));
        obj.insert("postal_code".into(), json!(user.postal_code));
    }
    if matches!(ctx, UserBrowse | UserRead | AdsRead) {
        obj.insert("city".into(), json!(user.city));
        obj.insert("coordinates".into(), json!(user.coordinates));
    }
    if matches!(ctx, UserBrowse | UserRead) {
        obj.insert("avatar".into(), json!(user.avatar));
        obj.insert("roles".into(), json!(user.roles()));
        obj.insert("status".into(), json!(user.status));
    }

    if depth == Depth::Root {
        if matches!(ctx, UserBrowse | UserRead) {
            let ads: Vec<Value> = user
                .ads
                .iter()
                .filter_map(|id| graph.ads.get(id))
                .map(|ad| render_ad(graph, ad, ctx, Depth::Nested))
                .collect();
            obj.insert("ads".into(), Value::Array(ads));
        }
        if matches!(ctx, UserRead | UserFavoris) {
            let favorites: Vec<Value> = user
                .favorites
                .iter()
                .filter_map(|id| graph.ads.get(id))
                .map(|ad| render_ad(graph, ad, ctx, Depth::Nested))
                .collect();
            obj.insert("favorites".into(), Value::Array(favorites));
        }
    }

    Value::Object(obj)
}

fn render_ad(graph: &EntityGraph, ad: &Ad, ctx: ViewContext, depth: Depth) -> Value {
    use ViewContext::*;
    let mut obj = Map::new();

    if matches!(
        ctx,
        AdsBrowse
            | AdsRead
            | UserBrowse
            | UserRead
            | UserFavoris
            | MessagesBrowse
            | MessagesRead
            | PlantsBrowse
            | PlantsRead
    ) {
        obj.insert("id".into(), json!(ad.id));
    }
    if matches!(ctx, AdsBrowse | AdsRead | UserBrowse | UserRead) {
        obj.insert("title".into(), json!(ad.title));
        obj.insert("city".into(), json!(ad.city));
        obj.insert("coordinates".into(), json!(ad.coordinates));
        obj.insert("quantity".into(), json!(ad.quantity));
        obj.insert("description".into(), json!(ad.description));
        obj.insert("image".into(), json!(ad.image));
        obj.insert("status".into(), json!(ad.status));
    }

    if depth == Depth::Root {
        if matches!(ctx, AdsBrowse | AdsRead | UserBrowse | UserRead) {
            let category = ad
                .category
                .and_then(|id| graph.categories.get(&id))
                .map(|c| render_category(c, ctx));
            obj.insert("category".into(), category.unwrap_or(Value::Null));
        }
        if matches!(ctx, AdsBrowse | AdsRead) {
            let user = ad
                .user
                .and_then(|id| graph.users.get(&id))
                .map(|u| render_user(graph, u, ctx, Depth::Nested));
            obj.insert("user".into(), user.unwrap_or(Value::Null));

            let growth = ad
                .growth
                .and_then(|id| graph.growths.get(&id))
                .map(render_growth_fields);
            obj.insert("growth".into(), growth.unwrap_or(Value::Null));
        }
        if ctx == UserFavoris {
            let fans: Vec<Value> = ad
                .favorited_by
                .iter()
                .filter_map(|id| graph.users.get(id))
                .map(|u| render_user(graph, u, ctx, Depth::Nested))
                .collect();
            obj.insert("favorited_by".into(), Value::Array(fans));
        }
    }

    Value::Object(obj)
}

fn render_category(category: &Category, ctx: ViewContext) -> Value {
    use ViewContext::*;
    let mut obj = Map::new();

    if matches!(
        ctx,
        AdsBrowse | AdsRead | CategoryBrowse | CategoryRead | PlantsBrowse | PlantsRead
    ) {
        obj.insert("id".into(), json!(category.id));
    }
    // Quirk carried over from the legacy group table: `name` is visible in
    // the user contexts while `id` is not.
    if matches!(
        ctx,
        AdsBrowse
            | AdsRead
            | UserBrowse
            | UserRead
            | CategoryBrowse
            | CategoryRead
            | PlantsBrowse
            | PlantsRead
    ) {
        obj.insert("name".into(), json!(category.name));
    }

    Value::Object(obj)
}

fn render_growth_fields(growth: &Growth) -> Value {
    // Growth only ever appears nested inside an ad, in the ads contexts.
    json!({
        "id": growth.id,
        "name": growth.name,
    })
}

fn render_plant(graph: &EntityGraph, plant: &Plant, ctx: ViewContext, depth: Depth) -> Value {
    use ViewContext::*;
    let mut obj = Map::new();

    if matches!(ctx, PlantsBrowse | PlantsRead) {
        obj.insert("id".into(), json!(plant.id));
        obj.insert("name".into(), json!(plant.name));
        obj.insert("variety".into(), json!(plant.variety));
        obj.insert("difficulty".into(), json!(plant.difficulty));
        obj.insert("description".into(), json!(plant.description));
        obj.insert("image".into(), json!(plant.image));

        if depth == Depth::Root {
            let category = plant
                .category
                .and_then(|id| graph.categories.get(&id))
                .map(|c| render_category(c, ctx));
            obj.insert("category".into(), category.unwrap_or(Value::Null));

            let ads: Vec<Value> = plant
                .ads
                .iter()
                .filter_map(|id| graph.ads.get(id))
                .map(|ad| render_ad(graph, ad, ctx, Depth::Nested))
                .collect();
            obj.insert("ads".into(), Value::Array(ads));
        }
    }

    Value::Object(obj)
}

fn render_message(graph: &EntityGraph, message: &Message, ctx: ViewContext, depth: Depth) -> Value {
    use ViewContext::*;
    let mut obj = Map::new();

    if matches!(ctx, MessagesBrowse | MessagesRead | UserBrowse | UserRead) {
        obj.insert("id".into(), json!(message.id));
        obj.insert("content".into(), json!(message.content));
    }

    if depth == Depth::Root {
        if matches!(ctx, MessagesBrowse | MessagesRead | UserBrowse | UserRead) {
            let ad = message
                .ad
                .and_then(|id| graph.ads.get(&id))
                .map(|a| render_ad(graph, a, ctx, Depth::Nested));
            obj.insert("ad".into(), ad.unwrap_or(Value::Null));
        }
        if matches!(ctx, MessagesBrowse | MessagesRead) {
            let user = message
                .user
                .and_then(|id| graph.users.get(&id))
                .map(|u| render_user(graph, u, ctx, Depth::Nested));
            obj.insert("user".into(), user.unwrap_or(Value::Null));
        }
    }

    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Ad, Category, Growth, Message, Plant, User};

    const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$secret$secret";

    fn sample_graph() -> (EntityGraph, Uuid, Uuid) {
        let mut graph = EntityGraph::new();
        let mut user = User::new();
        user.email = "jean@exemple.fr".into();
        user.pseudo = "jean".into();
        user.password_hash = HASH.into();
        let user = graph.insert_user(user);

        let category = graph.insert_category(Category::new("Succulentes"));
        let growth = graph.insert_growth(Growth::new("Bouture"));
        let plant = graph.insert_plant(Plant::new("Pilea peperomioides"));
        graph.add_plant_to_category(category, plant).unwrap();

        let mut ad = Ad::new();
        ad.title = "Bouture de pilea".into();
        ad.quantity = 2;
        let ad = graph.insert_ad(ad);
        graph.add_ad_to_category(category, ad).unwrap();
        graph.add_ad_to_growth(growth, ad).unwrap();
        graph.add_ad_to_user(user, ad).unwrap();
        graph.set_ad_plant(ad, plant).unwrap();

        let msg = graph.insert_message(Message::new("Encore dispo ?"));
        graph.add_message_to_ad(ad, msg).unwrap();
        graph.add_message_to_user(user, msg).unwrap();

        (graph, user, ad)
    }

    fn contains_needle(value: &Value, needle: &str) -> bool {
        match value {
            Value::String(s) => s.contains(needle),
            Value::Array(items) => items.iter().any(|v| contains_needle(v, needle)),
            Value::Object(map) => map
                .iter()
                .any(|(k, v)| k.contains(needle) || contains_needle(v, needle)),
            _ => false,
        }
    }

    #[test]
    fn password_never_leaks_in_any_context() {
        let (graph, user, ad) = sample_graph();
        for ctx in ViewContext::ALL {
            for value in [
                project_user(&graph, user, ctx).unwrap(),
                project_ad(&graph, ad, ctx).unwrap(),
            ] {
                assert!(!contains_needle(&value, "password"), "{}", ctx.name());
                assert!(!contains_needle(&value, "argon2id"), "{}", ctx.name());
            }
        }
    }

    #[test]
    fn relationships_expand_one_hop_only() {
        let (graph, _, ad) = sample_graph();
        let value = project_ad(&graph, ad, ViewContext::AdsRead).unwrap();

        let user = &value["user"];
        assert!(user.get("id").is_some());
        // The nested user must not carry its own collections.
        assert!(user.get("ads").is_none());
        assert!(user.get("favorites").is_none());
    }

    #[test]
    fn ads_browse_shows_taxonomy_but_never_messages() {
        let (graph, _, ad) = sample_graph();
        let value = project_ad(&graph, ad, ViewContext::AdsBrowse).unwrap();
        assert_eq!(value["category"]["name"], "Succulentes");
        assert_eq!(value["growth"]["name"], "Bouture");
        assert!(value.get("messages").is_none());
        // The plant link was never part of any group table.
        assert!(value.get("plant").is_none());
    }

    #[test]
    fn user_read_includes_own_ads_and_favorites() {
        let (mut graph, user, ad) = sample_graph();
        graph.add_favorite(user, ad).unwrap();
        let value = project_user(&graph, user, ViewContext::UserRead).unwrap();
        assert_eq!(value["ads"].as_array().unwrap().len(), 1);
        assert_eq!(value["favorites"].as_array().unwrap().len(), 1);
        assert_eq!(value["ads"][0]["title"], "Bouture de pilea");
    }

    #[test]
    fn user_browse_hides_email_on_nested_author() {
        let (graph, _, ad) = sample_graph();
        // ads_browse exposes the author's pseudo but not the email.
        let value = project_ad(&graph, ad, ViewContext::AdsBrowse).unwrap();
        assert_eq!(value["user"]["pseudo"], "jean");
        assert!(value["user"].get("email").is_none());
        // ads_read does include it.
        let value = project_ad(&graph, ad, ViewContext::AdsRead).unwrap();
        assert_eq!(value["user"]["email"], "jean@exemple.fr");
    }

    #[test]
    fn projection_is_deterministic() {
        let (graph, user, ad) = sample_graph();
        for ctx in ViewContext::ALL {
            assert_eq!(
                project_ad(&graph, ad, ctx).unwrap(),
                project_ad(&graph, ad, ctx).unwrap()
            );
            assert_eq!(
                project_user(&graph, user, ctx).unwrap(),
                project_user(&graph, user, ctx).unwrap()
            );
        }
    }

    #[test]
    fn messages_read_nests_ad_and_author_shallowly() {
        let (graph, _, ad) = sample_graph();
        let msg_id = *graph.ad(ad).unwrap().messages.iter().next().unwrap();
        let value = project_message(&graph, msg_id, ViewContext::MessagesRead).unwrap();
        assert_eq!(value["content"], "Encore dispo ?");
        assert_eq!(value["ad"]["id"], json!(ad));
        assert!(value["ad"].get("category").is_none());
        assert!(value["user"].get("ads").is_none());
    }

    #[test]
    fn plants_read_lists_linked_ads() {
        let (graph, _, ad) = sample_graph();
        let plant_id = graph.ad(ad).unwrap().plant.unwrap();
        let value = project_plant(&graph, plant_id, ViewContext::PlantsRead).unwrap();
        assert_eq!(value["name"], "Pilea peperomioides");
        assert_eq!(value["category"]["name"], "Succulentes");
        assert_eq!(value["ads"][0]["id"], json!(ad));
    }
}
