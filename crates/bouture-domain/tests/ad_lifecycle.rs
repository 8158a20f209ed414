//! End-to-end walk through the public domain API: post an ad, exchange a
//! message, favorite it, toggle its status, then try to delete it.

use uuid::Uuid;

use bouture_domain::{
    Actor, Ad, Category, EntityGraph, Error, Growth, Message, User, ViewContext,
    lifecycle::set_ad_status,
    view::{project_ad, project_user},
};
use bouture_types::models::{AdStatus, Role};

fn seeded_graph() -> (EntityGraph, Uuid, Uuid, Uuid) {
    let mut graph = EntityGraph::new();

    let mut owner = User::new();
    owner.email = "marie@exemple.fr".into();
    owner.pseudo = "marie".into();
    let owner = graph.insert_user(owner);

    let category = graph.insert_category(Category::new("Plantes vertes"));
    let growth = graph.insert_growth(Growth::new("Plant raciné"));

    (graph, owner, category, growth)
}

#[test]
fn posted_ad_appears_on_both_sides_and_survives_projection() {
    let (mut graph, owner, category, growth) = seeded_graph();

    let mut ad = Ad::new();
    ad.title = "Bouture de monstera".into();
    ad.city = Some("Nantes".into());
    ad.quantity = 2;
    let ad = graph.insert_ad(ad);
    graph.add_ad_to_category(category, ad).unwrap();
    graph.add_ad_to_growth(growth, ad).unwrap();
    graph.add_ad_to_user(owner, ad).unwrap();

    assert!(graph.user(owner).unwrap().ads.contains(&ad));
    assert!(graph.category(category).unwrap().ads.contains(&ad));
    assert_eq!(graph.ad(ad).unwrap().plant, None);

    let view = project_ad(&graph, ad, ViewContext::AdsBrowse).unwrap();
    assert_eq!(view["title"], "Bouture de monstera");
    assert_eq!(view["category"]["name"], "Plantes vertes");
}

#[test]
fn deactivated_ad_leaves_browse_until_reactivated() {
    let (mut graph, owner, category, growth) = seeded_graph();
    let mut ad = Ad::new();
    ad.title = "Bouture de lierre".into();
    ad.quantity = 1;
    let ad = graph.insert_ad(ad);
    graph.add_ad_to_category(category, ad).unwrap();
    graph.add_ad_to_growth(growth, ad).unwrap();
    graph.add_ad_to_user(owner, ad).unwrap();

    let actor = Actor::authenticated(owner, vec![Role::User]);
    set_ad_status(&mut graph, ad, AdStatus::Inactive, &actor).unwrap();
    assert!(graph.browse_ads().iter().all(|a| a.id != ad));

    set_ad_status(&mut graph, ad, AdStatus::Active, &actor).unwrap();
    assert!(graph.browse_ads().iter().any(|a| a.id == ad));
}

#[test]
fn delete_with_pending_message_requires_cascade() {
    let (mut graph, owner, category, growth) = seeded_graph();
    let mut ad = Ad::new();
    ad.title = "Bouture de ficus".into();
    ad.quantity = 1;
    let ad = graph.insert_ad(ad);
    graph.add_ad_to_category(category, ad).unwrap();
    graph.add_ad_to_growth(growth, ad).unwrap();
    graph.add_ad_to_user(owner, ad).unwrap();

    let mut buyer = User::new();
    buyer.pseudo = "paul".into();
    let buyer = graph.insert_user(buyer);
    let message = graph.insert_message(Message::new("Je suis preneur !"));
    graph.add_message_to_ad(ad, message).unwrap();
    graph.add_message_to_user(buyer, message).unwrap();
    graph.add_favorite(buyer, ad).unwrap();

    assert!(matches!(
        graph.remove_ad(ad, false),
        Err(Error::ReferentialConflict(_))
    ));

    graph.remove_ad(ad, true).unwrap();
    assert!(!graph.ads.contains_key(&ad));
    assert!(!graph.messages.contains_key(&message));
    assert!(!graph.user(buyer).unwrap().favorites.contains(&ad));

    // The buyer's projection no longer references the dead ad.
    let view = project_user(&graph, buyer, ViewContext::UserRead).unwrap();
    assert_eq!(view["favorites"].as_array().unwrap().len(), 0);
}
