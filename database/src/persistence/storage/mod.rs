use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use thiserror::Error;

use self::{file::FileStorage, memory::MemoryStorage};

pub mod file;
pub mod memory;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to initialize persistence: {0}")]
    UnableToInitializePersistence(String),

    #[error("Unable to write blob: {0}")]
    UnableToWriteBlob(String),

    #[error("Unable to read blob: {0}")]
    UnableToReadBlob(String),

    #[error("Unable to decode stored data: {0}")]
    UnableToDecode(String),

    #[error("Unable to write transaction: {0}")]
    UnableToWriteTransaction(String),

    #[error("Unable to sync transaction buffer to persistent storage: {0}")]
    UnableToSyncTransactionBufferToPersistentStorage(String),

    #[error("Unable to create new transaction log: {0}")]
    UnableToCreateNewTransactionLog(String),

    #[error("Unable to load previous transactions: {0}")]
    UnableToLoadPreviousTransactions(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub fn io_to_generic_error(error: std::io::Error) -> String {
    format!("{} ({:?})", error, error.kind())
}

#[derive(Debug, PartialEq)]
pub enum ReadBlobState {
    Found(Vec<u8>),
    NotFound,
}

/// Backing store for snapshots (named blobs) and the transaction log (append only text)
pub trait Storage {
    // Snapshot
    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()>;
    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState>;

    // Lifecycle
    fn init(&mut self) -> StorageResult<()>;
    fn reset_database(&mut self) -> StorageResult<()>;

    // Transactions
    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()>;
    fn transaction_sync(&self) -> StorageResult<()>;
    fn transaction_flush(&mut self) -> StorageResult<()>;
    fn transaction_load(&mut self) -> StorageResult<String>;
}

pub type SharedStorage = Arc<Mutex<dyn Storage + Sync + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageEngine {
    /// Directory holding the transaction log and snapshot blobs
    File(PathBuf),
    /// Process local storage, nothing survives a restart
    Memory,
}

impl StorageEngine {
    pub fn get_engine(&self) -> StorageResult<SharedStorage> {
        let storage: SharedStorage = match self {
            StorageEngine::File(path) => Arc::new(Mutex::new(FileStorage::new(path.clone())?)),
            StorageEngine::Memory => Arc::new(Mutex::new(MemoryStorage::new())),
        };

        Ok(storage)
    }

    pub fn describe(&self) -> String {
        match self {
            StorageEngine::File(path) => format!("File [{}]", path.display()),
            StorageEngine::Memory => "Memory".to_string(),
        }
    }
}
