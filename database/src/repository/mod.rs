//! Typed access to clients and projects. Each repository operation runs as one
//! independent transaction; nothing here spans both entities.

use thiserror::Error;

use crate::{
    consts::consts::{EntityId, EntityIdError},
    database::request_manager::RequestManagerError,
    model::validation::ValidationError,
};

pub mod client;
pub mod project;

#[derive(Error, Debug, PartialEq)]
pub enum RepositoryError {
    /// The input was rejected before anything was sent to the database
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The database could not parse the id it was given
    #[error("{0}")]
    MalformedId(#[from] EntityIdError),

    /// The database could not be reached or refused the write
    #[error("{0}")]
    Storage(#[from] RequestManagerError),
}

impl RepositoryError {
    pub fn is_validation(&self) -> bool {
        matches!(self, RepositoryError::Validation(_))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

fn parse_id(id: &str) -> RepositoryResult<EntityId> {
    Ok(EntityId::parse(id)?)
}
