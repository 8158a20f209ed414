use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::EntityKind;

/// Per-field validation messages. Collected, never short-circuited: a bad
/// request reports every invalid field in one response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.errors.get(name).map(Vec::as_slice)
    }

    /// Ok when no field failed, otherwise the collected 400-payload.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("access denied")]
    AccessDenied,

    #[error("{0} {1} not found")]
    NotFound(EntityKind, Uuid),

    #[error("ad {0} still has messages attached")]
    ReferentialConflict(Uuid),

    #[error("persistence failure")]
    Persistence(#[from] anyhow::Error),
}
