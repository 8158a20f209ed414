//! Ownership authorization gate, ported from the legacy security voter.
//! Only user resources carry an ownership rule; every other kind is behind
//! the generic is-authenticated check upstream.

use uuid::Uuid;

use bouture_types::models::Role;

use crate::error::Error;

/// Who is asking. Credential verification happens upstream; by the time the
/// gate runs we only care about identity and roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Authenticated { id: Uuid, roles: Vec<Role> },
}

impl Actor {
    pub fn authenticated(id: Uuid, roles: Vec<Role>) -> Self {
        Actor::Authenticated { id, roles }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::Authenticated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Edit,
    Delete,
}

/// The resource an action targets, by kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User(Uuid),
    Ad(Uuid),
    Category(Uuid),
    Growth(Uuid),
    Plant(Uuid),
    Message(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub fn authorize(actor: &Actor, action: Action, resource: &Resource) -> Decision {
    let Actor::Authenticated { id, roles } = actor else {
        return Decision::Deny;
    };

    match resource {
        Resource::User(target) => match action {
            Action::Read | Action::Edit => {
                if id == target {
                    Decision::Allow
                } else {
                    Decision::Deny
                }
            }
            Action::Delete => {
                // Exact singleton comparison, kept as-is from the legacy
                // voter: an admin who also holds other roles is denied.
                if id == target || roles.as_slice() == [Role::Admin] {
                    Decision::Allow
                } else {
                    Decision::Deny
                }
            }
        },
        // No ownership rule for the remaining kinds; any authenticated
        // actor passes.
        _ => Decision::Allow,
    }
}

/// `authorize` as a fallible step: `Deny` becomes `AccessDenied`, which the
/// boundary maps to 403 — never to 404.
pub fn ensure(actor: &Actor, action: Action, resource: &Resource) -> Result<(), Error> {
    match authorize(actor, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(Error::AccessDenied),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_actor(id: Uuid) -> Actor {
        Actor::authenticated(id, vec![Role::User])
    }

    #[test]
    fn anonymous_is_always_denied() {
        let target = Uuid::new_v4();
        for action in [Action::Read, Action::Edit, Action::Delete] {
            assert_eq!(
                authorize(&Actor::Anonymous, action, &Resource::User(target)),
                Decision::Deny
            );
        }
        assert_eq!(
            authorize(&Actor::Anonymous, Action::Read, &Resource::Ad(target)),
            Decision::Deny
        );
    }

    #[test]
    fn owner_may_read_edit_delete_self() {
        let id = Uuid::new_v4();
        let actor = user_actor(id);
        for action in [Action::Read, Action::Edit, Action::Delete] {
            assert_eq!(authorize(&actor, action, &Resource::User(id)), Decision::Allow);
        }
    }

    #[test]
    fn distinct_non_admins_are_denied() {
        let actor = user_actor(Uuid::new_v4());
        let other = Uuid::new_v4();
        for action in [Action::Read, Action::Edit, Action::Delete] {
            assert_eq!(authorize(&actor, action, &Resource::User(other)), Decision::Deny);
        }
    }

    #[test]
    fn pure_admin_may_delete_any_user() {
        let actor = Actor::authenticated(Uuid::new_v4(), vec![Role::Admin]);
        let other = Uuid::new_v4();
        assert_eq!(
            authorize(&actor, Action::Delete, &Resource::User(other)),
            Decision::Allow
        );
        // ...but still cannot read or edit someone else.
        assert_eq!(
            authorize(&actor, Action::Read, &Resource::User(other)),
            Decision::Deny
        );
    }

    #[test]
    fn admin_with_extra_roles_is_denied_delete() {
        // Legacy singleton-equality rule: [Admin, User] != [Admin].
        let actor = Actor::authenticated(Uuid::new_v4(), vec![Role::Admin, Role::User]);
        assert_eq!(
            authorize(&actor, Action::Delete, &Resource::User(Uuid::new_v4())),
            Decision::Deny
        );
    }

    #[test]
    fn other_kinds_only_require_authentication() {
        let actor = user_actor(Uuid::new_v4());
        let id = Uuid::new_v4();
        for resource in [
            Resource::Ad(id),
            Resource::Category(id),
            Resource::Growth(id),
            Resource::Plant(id),
            Resource::Message(id),
        ] {
            assert_eq!(authorize(&actor, Action::Delete, &resource), Decision::Allow);
        }
    }

    #[test]
    fn ensure_surfaces_access_denied() {
        let err = ensure(
            &Actor::Anonymous,
            Action::Read,
            &Resource::User(Uuid::new_v4()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AccessDenied));
    }
}
