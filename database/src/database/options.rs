use std::{path::PathBuf, time::Duration};

use crate::persistence::{
    storage::StorageEngine,
    transaction::{TransactionFileWriteMode, TransactionWriteMode},
};

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub restore: bool,
    pub write_mode: TransactionWriteMode,
    pub storage_engine: StorageEngine,
    pub threads: usize,
    pub request_timeout: Duration,
    /// Take a snapshot once this many transactions are in the log, `None` disables it
    pub snapshot_threshold: Option<usize>,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl DatabaseOptions {
    /// Defines whether we should attempt to restore the database from a snapshot and transaction log
    /// on startup
    pub fn set_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    /// Defines whether we should sync the file write to disk before marking the
    /// transaction as committed. This is useful for durability but can be slow ~3ms per sync
    pub fn set_sync_file_write(mut self, write_mode: TransactionWriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn set_storage_engine(mut self, storage_engine: StorageEngine) -> Self {
        self.storage_engine = storage_engine;
        self
    }

    /// Number of database worker threads, at least one is always started
    pub fn set_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// How long a caller waits for a worker to respond before giving up
    pub fn set_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn set_snapshot_threshold(mut self, snapshot_threshold: Option<usize>) -> Self {
        self.snapshot_threshold = snapshot_threshold.filter(|threshold| *threshold > 0);
        self
    }
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            write_mode: TransactionWriteMode::File(TransactionFileWriteMode::Sync),
            storage_engine: StorageEngine::File(PathBuf::from("data")),
            restore: true,
            threads: 2,
            request_timeout: Duration::from_secs(2),
            snapshot_threshold: Some(1_000),
        }
    }
}

impl DatabaseOptions {
    /// In memory database with the transaction log still enabled, so snapshot and restore
    /// behaviour is exercised by tests
    pub fn new_test() -> Self {
        DatabaseOptions::default()
            .set_storage_engine(StorageEngine::Memory)
            .set_restore(false)
            .set_threads(2)
            .set_sync_file_write(TransactionWriteMode::File(TransactionFileWriteMode::OSBuffered))
    }

    pub fn new_benchmark() -> Self {
        let database_dir: PathBuf = [
            "/",
            "tmp",
            "project-tracker",
            &uuid::Uuid::new_v4().to_string(),
        ]
        .iter()
        .collect();

        DatabaseOptions::default()
            .set_storage_engine(StorageEngine::File(database_dir))
            .set_restore(false)
            .set_threads(2)
            .set_sync_file_write(TransactionWriteMode::File(TransactionFileWriteMode::OSBuffered))
    }
}
