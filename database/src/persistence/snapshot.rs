use serde::{Deserialize, Serialize};

use crate::{
    consts::consts::TransactionId,
    database::table::{row::Row, tables::Tables},
    model::{client::Client, project::Project},
};

use super::storage::{ReadBlobState, SharedStorage, StorageError, StorageResult};

const SNAPSHOT_BLOB: &str = "snapshot";

/// Rows of both tables together with the last transaction they include, written as a
/// single blob so the two can never disagree
#[derive(Serialize, Deserialize, Debug)]
struct Snapshot {
    current_transaction_id: TransactionId,
    clients: Vec<Row<Client>>,
    projects: Vec<Row<Project>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            current_transaction_id: TransactionId::new_first_transaction(),
            clients: vec![],
            projects: vec![],
        }
    }
}

pub struct SnapshotManager {
    storage: SharedStorage,
}

impl SnapshotManager {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Loads the last snapshot into the tables, returns the number of restored rows and the
    /// id of the last transaction the snapshot contains
    #[tracing::instrument(skip(self, tables))]
    pub fn restore_snapshot(&self, tables: &mut Tables) -> StorageResult<(usize, TransactionId)> {
        let snapshot = self.read_snapshot()?;

        let snapshot_count = snapshot.clients.len() + snapshot.projects.len();

        tables.restore_tables(snapshot.clients, snapshot.projects);

        Ok((snapshot_count, snapshot.current_transaction_id))
    }

    #[tracing::instrument(skip(self, tables))]
    pub fn create_snapshot(
        &self,
        tables: &Tables,
        transaction_id: TransactionId,
    ) -> StorageResult<()> {
        let snapshot = Snapshot {
            current_transaction_id: transaction_id,
            clients: tables.client_table.latest_rows(),
            projects: tables.project_table.latest_rows(),
        };

        let serialized_data = serde_json::to_vec(&snapshot)
            .map_err(|e| StorageError::UnableToWriteBlob(e.to_string()))?;

        self.storage
            .lock()
            .unwrap()
            .write_blob(SNAPSHOT_BLOB.to_string(), serialized_data)
    }

    fn read_snapshot(&self) -> StorageResult<Snapshot> {
        let result = self
            .storage
            .lock()
            .unwrap()
            .read_blob(SNAPSHOT_BLOB.to_string())?;

        match result {
            ReadBlobState::Found(file_contents) => serde_json::from_slice(&file_contents)
                .map_err(|e| StorageError::UnableToDecode(e.to_string())),
            ReadBlobState::NotFound => Ok(Snapshot::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{model::statement::Statement, persistence::storage::memory::MemoryStorage};

    use super::*;

    #[test]
    fn snapshot_round_trip_keeps_order_and_transaction_id() {
        let manager = SnapshotManager::new(Arc::new(Mutex::new(MemoryStorage::new())));

        let mut tables = Tables::new();
        let client = Client::new_test();
        let project = Project::new_test(client.id.clone());
        let second = Client::new("Second".to_string(), None, None);

        for statement in [
            Statement::AddClient(client.clone()),
            Statement::AddProject(project.clone()),
            Statement::AddClient(second.clone()),
        ] {
            tables.apply_statement(statement, TransactionId(1)).unwrap();
        }

        manager.create_snapshot(&tables, TransactionId(3)).unwrap();

        let mut restored = Tables::new();
        let (count, transaction_id) = manager.restore_snapshot(&mut restored).unwrap();

        assert_eq!(count, 3);
        assert_eq!(transaction_id, TransactionId(3));
        assert_eq!(restored.client_table.list(), vec![client, second]);
        assert_eq!(restored.project_table.list(), vec![project]);
    }

    #[test]
    fn missing_snapshot_restores_nothing() {
        let manager = SnapshotManager::new(Arc::new(Mutex::new(MemoryStorage::new())));

        let mut tables = Tables::new();
        let (count, transaction_id) = manager.restore_snapshot(&mut tables).unwrap();

        assert_eq!(count, 0);
        assert_eq!(transaction_id, TransactionId::new_first_transaction());
        assert!(tables.client_table.is_empty());
    }
}
