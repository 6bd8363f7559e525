use serde::{Deserialize, Serialize};

use crate::{
    consts::consts::{EntityId, TransactionId},
    model::{
        client::Client,
        project::{Project, UpdateProjectData},
    },
};

/// Anything that can be stored in a table, keyed by its id
pub trait Record: Clone {
    fn id(&self) -> &EntityId;
}

impl Record for Client {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Record for Project {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum UpdateStatement<T> {
    Set(T),
    NoChanges,
}

impl<T> UpdateStatement<T> {
    pub fn apply_to(self, field: &mut T) {
        if let UpdateStatement::Set(value) = self {
            *field = value;
        }
    }
}

impl<T> From<Option<T>> for UpdateStatement<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => UpdateStatement::Set(v),
            None => UpdateStatement::NoChanges,
        }
    }
}

#[derive(Debug)]
pub struct ApplyUpdateResult<T> {
    pub previous: Row<T>,
    pub current: T,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Row<T> {
    /// Insertion position, rows are listed in this order
    pub sequence: u64,
    /// Transaction that last wrote the record
    pub transaction_id: TransactionId,
    pub record: T,
}

impl<T: Record> Row<T> {
    pub fn new(sequence: u64, record: T, transaction_id: TransactionId) -> Self {
        Row {
            sequence,
            transaction_id,
            record,
        }
    }
}

impl Row<Project> {
    pub fn apply_update(
        &mut self,
        update: UpdateProjectData,
        transaction_id: TransactionId,
    ) -> ApplyUpdateResult<Project> {
        let previous = self.clone();

        let UpdateProjectData {
            name,
            description,
            status,
            client_id,
        } = update;

        name.apply_to(&mut self.record.name);
        description.apply_to(&mut self.record.description);
        status.apply_to(&mut self.record.status);
        client_id.apply_to(&mut self.record.client_id);

        self.transaction_id = transaction_id;

        ApplyUpdateResult {
            previous,
            current: self.record.clone(),
        }
    }
}
