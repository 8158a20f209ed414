pub mod authz;
pub mod entities;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod validate;
pub mod view;

pub use authz::{Action, Actor, Decision, Resource, authorize, ensure};
pub use entities::{Ad, Category, EntityKind, Growth, Message, Plant, User};
pub use error::{Error, FieldErrors};
pub use graph::{Change, EntityGraph};
pub use view::ViewContext;
