pub mod ads;
pub mod auth;
pub mod categories;
pub mod error;
pub mod favorites;
pub mod messages;
pub mod middleware;
pub mod plants;
pub mod uploads;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
