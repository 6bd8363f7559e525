use std::collections::HashMap;
use thiserror::Error;

use crate::consts::consts::{EntityId, TransactionId};

use super::row::{Record, Row};

#[derive(Error, Debug, PartialEq)]
pub enum ApplyErrors {
    // CRUD - CREATE
    #[error("Cannot create, record already exists: {0}")]
    CannotCreateWhenAlreadyExists(EntityId),
}

/// How to undo a single applied mutation
#[derive(Debug, PartialEq)]
pub enum Undo<T> {
    /// The mutation inserted a row, drop it
    Remove(EntityId),
    /// The mutation changed or removed a row, put the previous row back
    Restore(Row<T>),
}

pub struct Table<T: Record> {
    pub rows: HashMap<EntityId, Row<T>>,
    next_sequence: u64,
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn insert(
        &mut self,
        record: T,
        transaction_id: TransactionId,
    ) -> Result<Undo<T>, ApplyErrors> {
        let id = record.id().clone();

        if self.rows.contains_key(&id) {
            return Err(ApplyErrors::CannotCreateWhenAlreadyExists(id));
        }

        let row = Row::new(self.next_sequence, record, transaction_id);

        self.next_sequence += 1;
        self.rows.insert(id.clone(), row);

        Ok(Undo::Remove(id))
    }

    /// Removing an id that does not exist is not an error, there is just nothing to undo
    pub fn remove(&mut self, id: &EntityId) -> Option<(T, Undo<T>)> {
        let row = self.rows.remove(id)?;

        Some((row.record.clone(), Undo::Restore(row)))
    }

    pub fn get(&self, id: &EntityId) -> Option<T> {
        self.rows.get(id).map(|row| row.record.clone())
    }

    pub fn get_row_mut(&mut self, id: &EntityId) -> Option<&mut Row<T>> {
        self.rows.get_mut(id)
    }

    pub fn list(&self) -> Vec<T> {
        self.latest_rows().into_iter().map(|row| row.record).collect()
    }

    /// Rows in insertion order
    pub fn latest_rows(&self) -> Vec<Row<T>> {
        let mut rows: Vec<Row<T>> = self.rows.values().cloned().collect();

        rows.sort_by_key(|row| row.sequence);

        rows
    }

    pub fn rollback(&mut self, undo: Undo<T>) {
        match undo {
            Undo::Remove(id) => {
                self.rows.remove(&id);
            }
            Undo::Restore(row) => {
                self.rows.insert(row.record.id().clone(), row);
            }
        }
    }

    /// Used when restoring from a snapshot
    pub fn restore_table(&mut self, rows: Vec<Row<T>>) {
        for row in rows {
            self.next_sequence = self.next_sequence.max(row.sequence + 1);
            self.rows.insert(row.record.id().clone(), row);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.next_sequence = 0;
    }
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::client::Client;

    use super::*;

    fn client(name: &str) -> Client {
        Client::new(name.to_string(), None, None)
    }

    #[test]
    fn list_returns_insertion_order() {
        let mut table = Table::<Client>::new();

        let names = ["One", "Two", "Three", "Four"];

        for name in names {
            table.insert(client(name), TransactionId(1)).unwrap();
        }

        let listed: Vec<String> = table.list().into_iter().map(|c| c.name).collect();

        assert_eq!(listed, names);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut table = Table::<Client>::new();
        let client = client("One");

        table.insert(client.clone(), TransactionId(1)).unwrap();

        assert_eq!(
            table.insert(client.clone(), TransactionId(2)),
            Err(ApplyErrors::CannotCreateWhenAlreadyExists(client.id))
        );
    }

    #[test]
    fn remove_missing_is_none() {
        let mut table = Table::<Client>::new();

        assert!(table.remove(&EntityId::new()).is_none());
    }

    #[test]
    fn rollback_restores_removed_row_in_place() {
        let mut table = Table::<Client>::new();
        let first = client("First");
        let second = client("Second");

        table.insert(first.clone(), TransactionId(1)).unwrap();
        table.insert(second.clone(), TransactionId(2)).unwrap();

        let (removed, undo) = table.remove(&first.id).unwrap();

        assert_eq!(removed, first);
        assert_eq!(table.list(), vec![second.clone()]);

        table.rollback(undo);

        assert_eq!(table.list(), vec![first, second]);
    }

    #[test]
    fn rollback_of_insert_drops_row() {
        let mut table = Table::<Client>::new();

        let undo = table.insert(client("One"), TransactionId(1)).unwrap();

        table.rollback(undo);

        assert!(table.is_empty());
    }

    #[test]
    fn restore_table_continues_sequence() {
        let mut table = Table::<Client>::new();
        let restored = client("Restored");

        table.restore_table(vec![Row::new(7, restored.clone(), TransactionId(3))]);

        let added = client("Added");

        table.insert(added.clone(), TransactionId(4)).unwrap();

        assert_eq!(table.list(), vec![restored, added]);
        assert_eq!(table.rows.get(&table.list()[1].id).unwrap().sequence, 8);
    }
}
