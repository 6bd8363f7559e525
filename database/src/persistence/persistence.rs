use crate::database::options::DatabaseOptions;

use super::{
    snapshot::SnapshotManager,
    storage::{SharedStorage, StorageResult},
    transaction::TransactionWAL,
};

pub struct Persistence {
    pub transaction_wal: TransactionWAL,
    pub snapshot_manager: SnapshotManager,
    storage: SharedStorage,
}

impl Persistence {
    pub fn new(options: &DatabaseOptions) -> StorageResult<Self> {
        let storage = options.storage_engine.get_engine()?;

        storage.lock().unwrap().init()?;

        Ok(Self {
            transaction_wal: TransactionWAL::new(options.write_mode.clone(), storage.clone()),
            snapshot_manager: SnapshotManager::new(storage.clone()),
            storage,
        })
    }

    pub fn reset(&self) -> StorageResult<()> {
        self.storage.lock().unwrap().reset_database()?;
        self.transaction_wal.reset();

        Ok(())
    }
}
