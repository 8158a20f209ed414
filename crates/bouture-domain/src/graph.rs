//! Entity graph manager: an arena of records per kind plus the paired
//! operations that keep every bidirectional relationship mirrored. Adding on
//! one side updates the other; removing clears the back-reference unless it
//! was already re-pointed elsewhere. Mutations are accumulated as a change
//! set and applied in one transaction by the persistence layer.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use bouture_types::models::AdStatus;

use crate::entities::{Ad, Category, EntityKind, Growth, Message, Plant, User};
use crate::error::Error;

/// One pending write. Inverse-side collections are derived data (owning
/// foreign keys plus the favorites join table), so only owning rows and
/// favorite pairs ever appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Upsert(EntityKind, Uuid),
    Delete(EntityKind, Uuid),
    Favorite { user: Uuid, ad: Uuid },
    Unfavorite { user: Uuid, ad: Uuid },
}

#[derive(Debug, Default)]
pub struct EntityGraph {
    pub users: HashMap<Uuid, User>,
    pub categories: HashMap<Uuid, Category>,
    pub growths: HashMap<Uuid, Growth>,
    pub plants: HashMap<Uuid, Plant>,
    pub ads: HashMap<Uuid, Ad>,
    pub messages: HashMap<Uuid, Message>,
    changes: Vec<Change>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the accumulated unit of work for the persistence layer.
    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub fn pending_changes(&self) -> &[Change] {
        &self.changes
    }

    /// Record a scalar edit so the row is rewritten on commit.
    pub fn mark_dirty(&mut self, kind: EntityKind, id: Uuid) {
        self.changes.push(Change::Upsert(kind, id));
    }

    /// Drop pending writes. Loaders hydrate a graph by replaying links
    /// through the normal paired operations, then clear the log so
    /// already-persisted state is not written back.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    // -- Hydration --
    //
    // Insert an already-persisted record without recording a pending write.
    // Only the persistence layer should need these.

    pub fn attach_user(&mut self, user: User) -> Uuid {
        let id = user.id;
        self.users.insert(id, user);
        id
    }

    pub fn attach_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.insert(id, category);
        id
    }

    pub fn attach_growth(&mut self, growth: Growth) -> Uuid {
        let id = growth.id;
        self.growths.insert(id, growth);
        id
    }

    pub fn attach_plant(&mut self, plant: Plant) -> Uuid {
        let id = plant.id;
        self.plants.insert(id, plant);
        id
    }

    pub fn attach_ad(&mut self, ad: Ad) -> Uuid {
        let id = ad.id;
        self.ads.insert(id, ad);
        id
    }

    pub fn attach_message(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.insert(id, message);
        id
    }

    // -- Inserts --

    pub fn insert_user(&mut self, user: User) -> Uuid {
        let id = user.id;
        self.users.insert(id, user);
        self.changes.push(Change::Upsert(EntityKind::User, id));
        id
    }

    pub fn insert_category(&mut self, category: Category) -> Uuid {
        let id = category.id;
        self.categories.insert(id, category);
        self.changes.push(Change::Upsert(EntityKind::Category, id));
        id
    }

    pub fn insert_growth(&mut self, growth: Growth) -> Uuid {
        let id = growth.id;
        self.growths.insert(id, growth);
        self.changes.push(Change::Upsert(EntityKind::Growth, id));
        id
    }

    pub fn insert_plant(&mut self, plant: Plant) -> Uuid {
        let id = plant.id;
        self.plants.insert(id, plant);
        self.changes.push(Change::Upsert(EntityKind::Plant, id));
        id
    }

    pub fn insert_ad(&mut self, ad: Ad) -> Uuid {
        let id = ad.id;
        self.ads.insert(id, ad);
        self.changes.push(Change::Upsert(EntityKind::Ad, id));
        id
    }

    pub fn insert_message(&mut self, message: Message) -> Uuid {
        let id = message.id;
        self.messages.insert(id, message);
        self.changes.push(Change::Upsert(EntityKind::Message, id));
        id
    }

    // -- Lookups --

    pub fn user(&self, id: Uuid) -> Result<&User, Error> {
        self.users
            .get(&id)
            .ok_or(Error::NotFound(EntityKind::User, id))
    }

    pub fn user_mut(&mut self, id: Uuid) -> Result<&mut User, Error> {
        self.users
            .get_mut(&id)
            .ok_or(Error::NotFound(EntityKind::User, id))
    }

    pub fn category(&self, id: Uuid) -> Result<&Category, Error> {
        self.categories
            .get(&id)
            .ok_or(Error::NotFound(EntityKind::Category, id))
    }

    pub fn category_mut(&mut self, id: Uuid) -> Result<&mut Category, Error> {
        self.categories
            .get_mut(&id)
            .ok_or(Error::NotFound(EntityKind::Category, id))
    }

    pub fn growth(&self, id: Uuid) -> Result<&Growth, Error> {
        self.growths
            .get(&id)
            .ok_or(Error::NotFound(EntityKind::Growth, id))
    }

    pub fn plant(&self, id: Uuid) -> Result<&Plant, Error> {
        self.plants
            .get(&id)
            .ok_or(Error::NotFound(EntityKind::Plant, id))
    }

    pub fn plant_mut(&mut self, id: Uuid) -> Result<&mut Plant, Error> {
        self.plants
            .get_mut(&id)
            .ok_or(Error::NotFound(EntityKind::Plant, id))
    }

    pub fn ad(&self, id: Uuid) -> Result<&Ad, Error> {
        self.ads.get(&id).ok_or(Error::NotFound(EntityKind::Ad, id))
    }

    pub fn ad_mut(&mut self, id: Uuid) -> Result<&mut Ad, Error> {
        self.ads
            .get_mut(&id)
            .ok_or(Error::NotFound(EntityKind::Ad, id))
    }

    pub fn message(&self, id: Uuid) -> Result<&Message, Error> {
        self.messages
            .get(&id)
            .ok_or(Error::NotFound(EntityKind::Message, id))
    }

    pub fn message_mut(&mut self, id: Uuid) -> Result<&mut Message, Error> {
        self.messages
            .get_mut(&id)
            .ok_or(Error::NotFound(EntityKind::Message, id))
    }

    /// Default listing view: active ads, newest first. Other kinds are not
    /// status-filtered on browse.
    pub fn browse_ads(&self) -> Vec<&Ad> {
        let mut ads: Vec<&Ad> = self
            .ads
            .values()
            .filter(|a| a.status == AdStatus::Active)
            .collect();
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        ads
    }

    // -- Category <-> Ads --

    pub fn add_ad_to_category(&mut self, category_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        if !self.categories.contains_key(&category_id) {
            return Err(Error::NotFound(EntityKind::Category, category_id));
        }
        let prev = {
            let ad = self.ad(ad_id)?;
            if ad.category == Some(category_id) {
                return Ok(());
            }
            ad.category
        };
        if let Some(prev_id) = prev
            && let Some(prev_cat) = self.categories.get_mut(&prev_id)
        {
            prev_cat.ads.remove(&ad_id);
        }
        if let Some(cat) = self.categories.get_mut(&category_id) {
            cat.ads.insert(ad_id);
        }
        self.ad_mut(ad_id)?.category = Some(category_id);
        self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        Ok(())
    }

    pub fn remove_ad_from_category(&mut self, category_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        let cat = self.category_mut(category_id)?;
        if !cat.ads.remove(&ad_id) {
            return Ok(());
        }
        if let Some(ad) = self.ads.get_mut(&ad_id)
            && ad.category == Some(category_id)
        {
            ad.category = None;
            self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        }
        Ok(())
    }

    // -- Category <-> Plants --

    pub fn add_plant_to_category(&mut self, category_id: Uuid, plant_id: Uuid) -> Result<(), Error> {
        if !self.categories.contains_key(&category_id) {
            return Err(Error::NotFound(EntityKind::Category, category_id));
        }
        let prev = {
            let plant = self.plant(plant_id)?;
            if plant.category == Some(category_id) {
                return Ok(());
            }
            plant.category
        };
        if let Some(prev_id) = prev
            && let Some(prev_cat) = self.categories.get_mut(&prev_id)
        {
            prev_cat.plants.remove(&plant_id);
        }
        if let Some(cat) = self.categories.get_mut(&category_id) {
            cat.plants.insert(plant_id);
        }
        self.plant_mut(plant_id)?.category = Some(category_id);
        self.changes.push(Change::Upsert(EntityKind::Plant, plant_id));
        Ok(())
    }

    pub fn remove_plant_from_category(
        &mut self,
        category_id: Uuid,
        plant_id: Uuid,
    ) -> Result<(), Error> {
        let cat = self.category_mut(category_id)?;
        if !cat.plants.remove(&plant_id) {
            return Ok(());
        }
        if let Some(plant) = self.plants.get_mut(&plant_id)
            && plant.category == Some(category_id)
        {
            plant.category = None;
            self.changes.push(Change::Upsert(EntityKind::Plant, plant_id));
        }
        Ok(())
    }

    // -- Growth <-> Ads --

    pub fn add_ad_to_growth(&mut self, growth_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        if !self.growths.contains_key(&growth_id) {
            return Err(Error::NotFound(EntityKind::Growth, growth_id));
        }
        let prev = {
            let ad = self.ad(ad_id)?;
            if ad.growth == Some(growth_id) {
                return Ok(());
            }
            ad.growth
        };
        if let Some(prev_id) = prev
            && let Some(prev_growth) = self.growths.get_mut(&prev_id)
        {
            prev_growth.ads.remove(&ad_id);
        }
        if let Some(growth) = self.growths.get_mut(&growth_id) {
            growth.ads.insert(ad_id);
        }
        self.ad_mut(ad_id)?.growth = Some(growth_id);
        self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        Ok(())
    }

    pub fn remove_ad_from_growth(&mut self, growth_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        let growth = self
            .growths
            .get_mut(&growth_id)
            .ok_or(Error::NotFound(EntityKind::Growth, growth_id))?;
        if !growth.ads.remove(&ad_id) {
            return Ok(());
        }
        if let Some(ad) = self.ads.get_mut(&ad_id)
            && ad.growth == Some(growth_id)
        {
            ad.growth = None;
            self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        }
        Ok(())
    }

    // -- User <-> Ads --

    pub fn add_ad_to_user(&mut self, user_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        if !self.users.contains_key(&user_id) {
            return Err(Error::NotFound(EntityKind::User, user_id));
        }
        let prev = {
            let ad = self.ad(ad_id)?;
            if ad.user == Some(user_id) {
                return Ok(());
            }
            ad.user
        };
        if let Some(prev_id) = prev
            && let Some(prev_user) = self.users.get_mut(&prev_id)
        {
            prev_user.ads.remove(&ad_id);
        }
        if let Some(user) = self.users.get_mut(&user_id) {
            user.ads.insert(ad_id);
        }
        self.ad_mut(ad_id)?.user = Some(user_id);
        self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        Ok(())
    }

    pub fn remove_ad_from_user(&mut self, user_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        let user = self.user_mut(user_id)?;
        if !user.ads.remove(&ad_id) {
            return Ok(());
        }
        if let Some(ad) = self.ads.get_mut(&ad_id)
            && ad.user == Some(user_id)
        {
            ad.user = None;
            self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        }
        Ok(())
    }

    // -- Ads <-> Messages --

    pub fn add_message_to_ad(&mut self, ad_id: Uuid, message_id: Uuid) -> Result<(), Error> {
        if !self.ads.contains_key(&ad_id) {
            return Err(Error::NotFound(EntityKind::Ad, ad_id));
        }
        let prev = {
            let message = self.message(message_id)?;
            if message.ad == Some(ad_id) {
                return Ok(());
            }
            message.ad
        };
        if let Some(prev_id) = prev
            && let Some(prev_ad) = self.ads.get_mut(&prev_id)
        {
            prev_ad.messages.remove(&message_id);
        }
        if let Some(ad) = self.ads.get_mut(&ad_id) {
            ad.messages.insert(message_id);
        }
        self.message_mut(message_id)?.ad = Some(ad_id);
        self.changes.push(Change::Upsert(EntityKind::Message, message_id));
        Ok(())
    }

    pub fn remove_message_from_ad(&mut self, ad_id: Uuid, message_id: Uuid) -> Result<(), Error> {
        let ad = self.ad_mut(ad_id)?;
        if !ad.messages.remove(&message_id) {
            return Ok(());
        }
        if let Some(message) = self.messages.get_mut(&message_id)
            && message.ad == Some(ad_id)
        {
            message.ad = None;
            self.changes.push(Change::Upsert(EntityKind::Message, message_id));
        }
        Ok(())
    }

    // -- User <-> Messages --

    pub fn add_message_to_user(&mut self, user_id: Uuid, message_id: Uuid) -> Result<(), Error> {
        if !self.users.contains_key(&user_id) {
            return Err(Error::NotFound(EntityKind::User, user_id));
        }
        let prev = {
            let message = self.message(message_id)?;
            if message.user == Some(user_id) {
                return Ok(());
            }
            message.user
        };
        if let Some(prev_id) = prev
            && let Some(prev_user) = self.users.get_mut(&prev_id)
        {
            prev_user.messages.remove(&message_id);
        }
        if let Some(user) = self.users.get_mut(&user_id) {
            user.messages.insert(message_id);
        }
        self.message_mut(message_id)?.user = Some(user_id);
        self.changes.push(Change::Upsert(EntityKind::Message, message_id));
        Ok(())
    }

    pub fn remove_message_from_user(&mut self, user_id: Uuid, message_id: Uuid) -> Result<(), Error> {
        let user = self.user_mut(user_id)?;
        if !user.messages.remove(&message_id) {
            return Ok(());
        }
        if let Some(message) = self.messages.get_mut(&message_id)
            && message.user == Some(user_id)
        {
            message.user = None;
            self.changes.push(Change::Upsert(EntityKind::Message, message_id));
        }
        Ok(())
    }

    // -- Ads <-> Plants (optional link) --

    pub fn set_ad_plant(&mut self, ad_id: Uuid, plant_id: Uuid) -> Result<(), Error> {
        if !self.plants.contains_key(&plant_id) {
            return Err(Error::NotFound(EntityKind::Plant, plant_id));
        }
        let prev = {
            let ad = self.ad(ad_id)?;
            if ad.plant == Some(plant_id) {
                return Ok(());
            }
            ad.plant
        };
        if let Some(prev_id) = prev
            && let Some(prev_plant) = self.plants.get_mut(&prev_id)
        {
            prev_plant.ads.remove(&ad_id);
        }
        if let Some(plant) = self.plants.get_mut(&plant_id) {
            plant.ads.insert(ad_id);
        }
        self.ad_mut(ad_id)?.plant = Some(plant_id);
        self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        Ok(())
    }

    pub fn clear_ad_plant(&mut self, ad_id: Uuid) -> Result<(), Error> {
        let prev = {
            let ad = self.ad(ad_id)?;
            match ad.plant {
                Some(prev) => prev,
                None => return Ok(()),
            }
        };
        if let Some(plant) = self.plants.get_mut(&prev) {
            plant.ads.remove(&ad_id);
        }
        self.ad_mut(ad_id)?.plant = None;
        self.changes.push(Change::Upsert(EntityKind::Ad, ad_id));
        Ok(())
    }

    // -- Favorites (symmetric many-to-many) --

    pub fn add_favorite(&mut self, user_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        if !self.ads.contains_key(&ad_id) {
            return Err(Error::NotFound(EntityKind::Ad, ad_id));
        }
        let user = self.user_mut(user_id)?;
        if !user.favorites.insert(ad_id) {
            return Ok(());
        }
        if let Some(ad) = self.ads.get_mut(&ad_id) {
            ad.favorited_by.insert(user_id);
        }
        self.changes.push(Change::Favorite {
            user: user_id,
            ad: ad_id,
        });
        Ok(())
    }

    pub fn remove_favorite(&mut self, user_id: Uuid, ad_id: Uuid) -> Result<(), Error> {
        if !self.ads.contains_key(&ad_id) {
            return Err(Error::NotFound(EntityKind::Ad, ad_id));
        }
        let user = self.user_mut(user_id)?;
        if !user.favorites.remove(&ad_id) {
            return Ok(());
        }
        if let Some(ad) = self.ads.get_mut(&ad_id) {
            ad.favorited_by.remove(&user_id);
        }
        self.changes.push(Change::Unfavorite {
            user: user_id,
            ad: ad_id,
        });
        Ok(())
    }

    // -- Physical removal (ads only) --

    /// Delete an ad outright. Refused with `ReferentialConflict` while
    /// messages still reference it, unless `cascade` removes them first.
    /// Favorite join rows go with the ad row via the FK cascade; the
    /// in-memory mirrors are cleaned here.
    pub fn remove_ad(&mut self, ad_id: Uuid, cascade: bool) -> Result<(), Error> {
        let (message_ids, fans) = {
            let ad = self.ad(ad_id)?;
            if !ad.messages.is_empty() && !cascade {
                return Err(Error::ReferentialConflict(ad_id));
            }
            (
                ad.messages.iter().copied().collect::<Vec<_>>(),
                ad.favorited_by.iter().copied().collect::<Vec<_>>(),
            )
        };

        for message_id in &message_ids {
            if let Some(message) = self.messages.remove(message_id) {
                if let Some(author_id) = message.user
                    && let Some(author) = self.users.get_mut(&author_id)
                {
                    author.messages.remove(message_id);
                }
                self.changes.push(Change::Delete(EntityKind::Message, *message_id));
            }
        }

        for user_id in fans {
            if let Some(user) = self.users.get_mut(&user_id) {
                user.favorites.remove(&ad_id);
            }
        }

        if let Some(ad) = self.ads.remove(&ad_id) {
            if let Some(category_id) = ad.category
                && let Some(cat) = self.categories.get_mut(&category_id)
            {
                cat.ads.remove(&ad_id);
            }
            if let Some(growth_id) = ad.growth
                && let Some(growth) = self.growths.get_mut(&growth_id)
            {
                growth.ads.remove(&ad_id);
            }
            if let Some(user_id) = ad.user
                && let Some(owner) = self.users.get_mut(&user_id)
            {
                owner.ads.remove(&ad_id);
            }
            if let Some(plant_id) = ad.plant
                && let Some(plant) = self.plants.get_mut(&plant_id)
            {
                plant.ads.remove(&ad_id);
            }
        }
        self.changes.push(Change::Delete(EntityKind::Ad, ad_id));
        debug!(%ad_id, cascaded = message_ids.len(), "ad removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Ad, Category, Growth, Message, Plant, User};

    struct Fixture {
        graph: EntityGraph,
        user: Uuid,
        category: Uuid,
        growth: Uuid,
        ad: Uuid,
    }

    fn fixture() -> Fixture {
        let mut graph = EntityGraph::new();
        let user = graph.insert_user(User::new());
        let category = graph.insert_category(Category::new("Succulentes"));
        let growth = graph.insert_growth(Growth::new("Bouture"));
        let mut ad = Ad::new();
        ad.title = "Bouture de pilea".into();
        ad.quantity = 3;
        let ad = graph.insert_ad(ad);
        graph.add_ad_to_category(category, ad).unwrap();
        graph.add_ad_to_growth(growth, ad).unwrap();
        graph.add_ad_to_user(user, ad).unwrap();
        Fixture {
            graph,
            user,
            category,
            growth,
            ad,
        }
    }

    #[test]
    fn add_mirrors_both_sides() {
        let f = fixture();
        assert_eq!(f.graph.ad(f.ad).unwrap().category, Some(f.category));
        assert!(f.graph.category(f.category).unwrap().ads.contains(&f.ad));
        assert!(f.graph.growth(f.growth).unwrap().ads.contains(&f.ad));
        assert!(f.graph.user(f.user).unwrap().ads.contains(&f.ad));
    }

    #[test]
    fn add_then_remove_round_trips() {
        let mut f = fixture();
        f.graph.remove_ad_from_category(f.category, f.ad).unwrap();
        assert_eq!(f.graph.ad(f.ad).unwrap().category, None);
        assert!(!f.graph.category(f.category).unwrap().ads.contains(&f.ad));

        f.graph.add_ad_to_category(f.category, f.ad).unwrap();
        assert_eq!(f.graph.ad(f.ad).unwrap().category, Some(f.category));
        assert!(f.graph.category(f.category).unwrap().ads.contains(&f.ad));
    }

    #[test]
    fn re_adding_is_a_no_op() {
        let mut f = fixture();
        f.graph.take_changes();
        f.graph.add_ad_to_category(f.category, f.ad).unwrap();
        assert!(f.graph.pending_changes().is_empty());
    }

    #[test]
    fn relinking_detaches_previous_owner() {
        let mut f = fixture();
        let other = f.graph.insert_category(Category::new("Aromatiques"));
        f.graph.add_ad_to_category(other, f.ad).unwrap();
        assert!(!f.graph.category(f.category).unwrap().ads.contains(&f.ad));
        assert!(f.graph.category(other).unwrap().ads.contains(&f.ad));
        assert_eq!(f.graph.ad(f.ad).unwrap().category, Some(other));
    }

    #[test]
    fn remove_does_not_clear_repointed_reference() {
        let mut f = fixture();
        let other = f.graph.insert_category(Category::new("Aromatiques"));
        f.graph.add_ad_to_category(other, f.ad).unwrap();
        // Already re-pointed at `other`; removing from the old category
        // must not null the new reference.
        f.graph.remove_ad_from_category(f.category, f.ad).unwrap();
        assert_eq!(f.graph.ad(f.ad).unwrap().category, Some(other));
    }

    #[test]
    fn favorites_stay_symmetric() {
        let mut f = fixture();
        let fan = f.graph.insert_user(User::new());
        f.graph.add_favorite(fan, f.ad).unwrap();
        assert!(f.graph.user(fan).unwrap().favorites.contains(&f.ad));
        assert!(f.graph.ad(f.ad).unwrap().favorited_by.contains(&fan));

        f.graph.remove_favorite(fan, f.ad).unwrap();
        assert!(!f.graph.user(fan).unwrap().favorites.contains(&f.ad));
        assert!(!f.graph.ad(f.ad).unwrap().favorited_by.contains(&fan));
    }

    #[test]
    fn favorite_toggle_records_changes() {
        let mut f = fixture();
        let fan = f.graph.insert_user(User::new());
        f.graph.take_changes();
        f.graph.add_favorite(fan, f.ad).unwrap();
        f.graph.add_favorite(fan, f.ad).unwrap(); // second call is a no-op
        assert_eq!(
            f.graph.pending_changes(),
            &[Change::Favorite {
                user: fan,
                ad: f.ad
            }]
        );
    }

    #[test]
    fn plant_link_is_optional_and_clearable() {
        let mut f = fixture();
        let mut plant = Plant::new("Pilea peperomioides");
        plant.category = None;
        let plant = f.graph.insert_plant(plant);
        f.graph.set_ad_plant(f.ad, plant).unwrap();
        assert!(f.graph.plant(plant).unwrap().ads.contains(&f.ad));

        f.graph.clear_ad_plant(f.ad).unwrap();
        assert_eq!(f.graph.ad(f.ad).unwrap().plant, None);
        assert!(!f.graph.plant(plant).unwrap().ads.contains(&f.ad));
    }

    #[test]
    fn remove_ad_with_messages_is_refused() {
        let mut f = fixture();
        let author = f.graph.insert_user(User::new());
        let msg = f.graph.insert_message(Message::new("Encore dispo ?"));
        f.graph.add_message_to_ad(f.ad, msg).unwrap();
        f.graph.add_message_to_user(author, msg).unwrap();

        match f.graph.remove_ad(f.ad, false) {
            Err(Error::ReferentialConflict(id)) => assert_eq!(id, f.ad),
            other => panic!("expected ReferentialConflict, got {other:?}"),
        }
        // Nothing was touched.
        assert!(f.graph.ads.contains_key(&f.ad));
        assert!(f.graph.messages.contains_key(&msg));
    }

    #[test]
    fn remove_ad_cascade_takes_messages_along() {
        let mut f = fixture();
        let author = f.graph.insert_user(User::new());
        let msg = f.graph.insert_message(Message::new("Encore dispo ?"));
        f.graph.add_message_to_ad(f.ad, msg).unwrap();
        f.graph.add_message_to_user(author, msg).unwrap();
        let fan = f.graph.insert_user(User::new());
        f.graph.add_favorite(fan, f.ad).unwrap();

        f.graph.remove_ad(f.ad, true).unwrap();

        assert!(!f.graph.ads.contains_key(&f.ad));
        assert!(!f.graph.messages.contains_key(&msg));
        assert!(!f.graph.user(author).unwrap().messages.contains(&msg));
        assert!(!f.graph.user(fan).unwrap().favorites.contains(&f.ad));
        assert!(!f.graph.category(f.category).unwrap().ads.contains(&f.ad));
        assert!(!f.graph.growth(f.growth).unwrap().ads.contains(&f.ad));
        assert!(!f.graph.user(f.user).unwrap().ads.contains(&f.ad));
    }

    #[test]
    fn browse_filters_inactive_ads() {
        let mut f = fixture();
        assert_eq!(f.graph.browse_ads().len(), 1);
        f.graph.ad_mut(f.ad).unwrap().status = AdStatus::Inactive;
        assert!(f.graph.browse_ads().is_empty());
        f.graph.ad_mut(f.ad).unwrap().status = AdStatus::Active;
        assert_eq!(f.graph.browse_ads().len(), 1);
    }
}
