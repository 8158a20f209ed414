//! Status engine. Soft delete is a status flip, never a row removal; only
//! ads also support physical removal (see [`crate::graph::EntityGraph::remove_ad`]).
//! Any state is reachable from any state — the only precondition is the
//! authorization gate. Status mutation touches the status field and nothing
//! else; `updated_at` belongs to the editing collaborators.

use uuid::Uuid;

use bouture_types::models::{AdStatus, Status};

use crate::authz::{Action, Actor, Resource, ensure};
use crate::entities::EntityKind;
use crate::error::Error;
use crate::graph::EntityGraph;

pub fn set_ad_status(
    graph: &mut EntityGraph,
    ad_id: Uuid,
    status: AdStatus,
    actor: &Actor,
) -> Result<(), Error> {
    ensure(actor, Action::Delete, &Resource::Ad(ad_id))?;
    graph.ad_mut(ad_id)?.status = status;
    graph.mark_dirty(EntityKind::Ad, ad_id);
    Ok(())
}

pub fn set_user_status(
    graph: &mut EntityGraph,
    user_id: Uuid,
    status: Status,
    actor: &Actor,
) -> Result<(), Error> {
    // Deactivating an account is the delete-equivalent action.
    ensure(actor, Action::Delete, &Resource::User(user_id))?;
    graph.user_mut(user_id)?.status = status;
    graph.mark_dirty(EntityKind::User, user_id);
    Ok(())
}

pub fn set_category_status(
    graph: &mut EntityGraph,
    category_id: Uuid,
    status: Status,
    actor: &Actor,
) -> Result<(), Error> {
    ensure(actor, Action::Delete, &Resource::Category(category_id))?;
    graph.category_mut(category_id)?.status = status;
    graph.mark_dirty(EntityKind::Category, category_id);
    Ok(())
}

pub fn set_plant_status(
    graph: &mut EntityGraph,
    plant_id: Uuid,
    status: Status,
    actor: &Actor,
) -> Result<(), Error> {
    ensure(actor, Action::Delete, &Resource::Plant(plant_id))?;
    graph.plant_mut(plant_id)?.status = status;
    graph.mark_dirty(EntityKind::Plant, plant_id);
    Ok(())
}

pub fn set_message_status(
    graph: &mut EntityGraph,
    message_id: Uuid,
    status: Status,
    actor: &Actor,
) -> Result<(), Error> {
    ensure(actor, Action::Delete, &Resource::Message(message_id))?;
    graph.message_mut(message_id)?.status = status;
    graph.mark_dirty(EntityKind::Message, message_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Ad, User};
    use bouture_types::models::Role;

    fn graph_with_ad() -> (EntityGraph, Uuid, Uuid) {
        let mut graph = EntityGraph::new();
        let user = graph.insert_user(User::new());
        let mut ad = Ad::new();
        ad.title = "Bouture de monstera".into();
        ad.quantity = 1;
        let ad = graph.insert_ad(ad);
        graph.add_ad_to_user(user, ad).unwrap();
        (graph, user, ad)
    }

    #[test]
    fn anonymous_cannot_change_status() {
        let (mut graph, _, ad) = graph_with_ad();
        let err = set_ad_status(&mut graph, ad, AdStatus::Inactive, &Actor::Anonymous).unwrap_err();
        assert!(matches!(err, Error::AccessDenied));
        assert_eq!(graph.ad(ad).unwrap().status, AdStatus::Active);
    }

    #[test]
    fn deactivation_hides_ad_from_browse_and_is_reversible() {
        let (mut graph, user, ad) = graph_with_ad();
        let actor = Actor::authenticated(user, vec![Role::User]);

        set_ad_status(&mut graph, ad, AdStatus::Inactive, &actor).unwrap();
        assert!(graph.browse_ads().is_empty());

        set_ad_status(&mut graph, ad, AdStatus::Active, &actor).unwrap();
        assert_eq!(graph.browse_ads().len(), 1);
    }

    #[test]
    fn pending_is_reachable_from_any_state() {
        let (mut graph, user, ad) = graph_with_ad();
        let actor = Actor::authenticated(user, vec![Role::User]);
        set_ad_status(&mut graph, ad, AdStatus::Inactive, &actor).unwrap();
        set_ad_status(&mut graph, ad, AdStatus::Pending, &actor).unwrap();
        assert_eq!(graph.ad(ad).unwrap().status, AdStatus::Pending);
    }

    #[test]
    fn status_change_leaves_updated_at_alone() {
        let (mut graph, user, ad) = graph_with_ad();
        let actor = Actor::authenticated(user, vec![Role::User]);
        set_ad_status(&mut graph, ad, AdStatus::Pending, &actor).unwrap();
        assert_eq!(graph.ad(ad).unwrap().updated_at, None);
    }

    #[test]
    fn only_the_owner_or_pure_admin_deactivates_a_user() {
        let mut graph = EntityGraph::new();
        let target = graph.insert_user(User::new());

        let stranger = Actor::authenticated(Uuid::new_v4(), vec![Role::User]);
        let err =
            set_user_status(&mut graph, target, Status::Inactive, &stranger).unwrap_err();
        assert!(matches!(err, Error::AccessDenied));

        let owner = Actor::authenticated(target, vec![Role::User]);
        set_user_status(&mut graph, target, Status::Inactive, &owner).unwrap();
        assert_eq!(graph.user(target).unwrap().status, Status::Inactive);
    }
}
