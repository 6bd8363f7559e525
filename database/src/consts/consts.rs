use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// New Type Pattern -- https://doc.rust-lang.org/rust-by-example/generics/new_types.html
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, PartialOrd)]
pub struct TransactionId(pub usize);

impl TransactionId {
    pub fn new_first_transaction() -> Self {
        TransactionId(0)
    }

    pub fn to_number(&self) -> usize {
        self.0
    }

    pub fn increment(&self) -> TransactionId {
        TransactionId(self.0 + 1)
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum EntityIdError {
    #[error("Malformed id: {0}")]
    Malformed(String),
}

/// Identifier shared by every record in the database, always a hyphenated UUID
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new() -> EntityId {
        EntityId(Uuid::new_v4().to_string())
    }

    /// Rejects anything that is not a UUID, ids are never looked up in their raw form
    pub fn parse(value: &str) -> Result<EntityId, EntityIdError> {
        Uuid::parse_str(value.trim())
            .map(|uuid| EntityId(uuid.to_string()))
            .map_err(|_| EntityIdError::Malformed(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        EntityId::new()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
