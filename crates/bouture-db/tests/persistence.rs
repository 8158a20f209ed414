//! Round-trip tests: build a graph, flush it, reload it from a fresh
//! connection and check the mirrors come back consistent.

use std::path::PathBuf;

use uuid::Uuid;

use bouture_db::Database;
use bouture_domain::{Ad, Category, EntityKind, Message, User};
use bouture_types::models::AdStatus;

fn temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("bouture-test-{}.db", Uuid::new_v4()))
}

fn seeded_growth_id() -> Uuid {
    // The cutting stage, seeded by the migrations.
    "00000000-0000-0000-0000-000000000003".parse().unwrap()
}

struct Setup {
    db: Database,
    user_id: Uuid,
    category_id: Uuid,
    ad_id: Uuid,
}

/// One user, one category, one ad linked to the seeded growth stage,
/// flushed to disk.
fn setup() -> Setup {
    let db = Database::open(&temp_db_path()).unwrap();

    let mut graph = bouture_domain::EntityGraph::new();
    let growth_id = seeded_growth_id();
    assert!(db.fetch_growth_into(&mut graph, growth_id).unwrap());

    let mut user = User::new();
    user.email = "leane@exemple.fr".into();
    user.password_hash = "$argon2id$stub".into();
    user.pseudo = "leane".into();
    let user_id = graph.insert_user(user);

    let category_id = graph.insert_category(Category::new("Succulentes"));

    let mut ad = Ad::new();
    ad.title = "Bouture de pilea".into();
    ad.quantity = 3;
    let ad_id = graph.insert_ad(ad);

    graph.add_ad_to_category(category_id, ad_id).unwrap();
    graph.add_ad_to_growth(growth_id, ad_id).unwrap();
    graph.add_ad_to_user(user_id, ad_id).unwrap();

    db.apply(&mut graph).unwrap();

    Setup {
        db,
        user_id,
        category_id,
        ad_id,
    }
}

#[test]
fn ad_round_trips_with_mirrored_links() {
    let s = setup();

    let graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    let ad = graph.ad(s.ad_id).unwrap();
    assert_eq!(ad.title, "Bouture de pilea");
    assert_eq!(ad.category, Some(s.category_id));
    assert_eq!(ad.growth, Some(seeded_growth_id()));
    assert_eq!(ad.user, Some(s.user_id));

    // Inverse sides are rebuilt from the owning columns.
    assert!(graph.category(s.category_id).unwrap().ads.contains(&s.ad_id));
    assert!(graph.user(s.user_id).unwrap().ads.contains(&s.ad_id));

    // Hydration must not leave anything pending.
    assert!(graph.pending_changes().is_empty());
}

#[test]
fn browse_graph_skips_inactive_ads() {
    let s = setup();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    graph.ad_mut(s.ad_id).unwrap().status = AdStatus::Inactive;
    graph.mark_dirty(EntityKind::Ad, s.ad_id);
    s.db.apply(&mut graph).unwrap();

    let browse = s.db.load_browse_graph().unwrap();
    assert!(browse.ads.is_empty());
}

#[test]
fn favorites_survive_an_ad_edit() {
    let s = setup();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    let mut fan = User::new();
    fan.email = "marc@exemple.fr".into();
    fan.password_hash = "$argon2id$stub".into();
    fan.pseudo = "marc".into();
    let fan_id = graph.insert_user(fan);
    graph.add_favorite(fan_id, s.ad_id).unwrap();
    s.db.apply(&mut graph).unwrap();

    // Editing the ad rewrites its row; the join rows must not be lost.
    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    graph.ad_mut(s.ad_id).unwrap().quantity = 5;
    graph.mark_dirty(EntityKind::Ad, s.ad_id);
    s.db.apply(&mut graph).unwrap();

    let graph = s.db.load_user_graph(fan_id).unwrap().unwrap();
    assert!(graph.user(fan_id).unwrap().favorites.contains(&s.ad_id));
    assert!(graph.ad(s.ad_id).unwrap().favorited_by.contains(&fan_id));
    assert_eq!(graph.ad(s.ad_id).unwrap().quantity, 5);
}

#[test]
fn unfavorite_removes_the_join_row() {
    let s = setup();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    graph.add_favorite(s.user_id, s.ad_id).unwrap();
    s.db.apply(&mut graph).unwrap();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    graph.remove_favorite(s.user_id, s.ad_id).unwrap();
    s.db.apply(&mut graph).unwrap();

    let graph = s.db.load_user_graph(s.user_id).unwrap().unwrap();
    assert!(graph.user(s.user_id).unwrap().favorites.is_empty());
}

#[test]
fn cascade_delete_takes_messages_and_favorites_along() {
    let s = setup();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    let message_id = graph.insert_message(Message::new("Toujours disponible ?"));
    graph.add_message_to_ad(s.ad_id, message_id).unwrap();
    graph.add_message_to_user(s.user_id, message_id).unwrap();
    graph.add_favorite(s.user_id, s.ad_id).unwrap();
    s.db.apply(&mut graph).unwrap();

    let mut graph = s.db.load_ad_graph(s.ad_id).unwrap().unwrap();
    graph.remove_ad(s.ad_id, true).unwrap();
    s.db.apply(&mut graph).unwrap();

    assert!(s.db.load_ad_graph(s.ad_id).unwrap().is_none());
    assert!(s.db.load_messages_graph().unwrap().messages.is_empty());
    let graph = s.db.load_user_graph(s.user_id).unwrap().unwrap();
    assert!(graph.user(s.user_id).unwrap().favorites.is_empty());
}

#[test]
fn user_lookup_by_email() {
    let s = setup();

    let user = s.db.get_user_by_email("leane@exemple.fr").unwrap().unwrap();
    assert_eq!(user.id, s.user_id);
    assert!(s.db.email_taken("leane@exemple.fr").unwrap());
    assert!(!s.db.email_taken("inconnu@exemple.fr").unwrap());
}

#[test]
fn seeded_growth_stages_are_present() {
    let db = Database::open(&temp_db_path()).unwrap();
    let mut graph = bouture_domain::EntityGraph::new();
    assert!(db.fetch_growth_into(&mut graph, seeded_growth_id()).unwrap());
    assert_eq!(graph.growth(seeded_growth_id()).unwrap().name, "Bouture");
}
