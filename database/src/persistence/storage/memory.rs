use std::collections::HashMap;

use super::{ReadBlobState, Storage, StorageResult};

/// Keeps blobs and the transaction log in process memory
#[derive(Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, Vec<u8>>,
    transaction_log: Vec<u8>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        self.blobs.insert(path, bytes);
        Ok(())
    }

    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState> {
        Ok(match self.blobs.get(&path) {
            Some(bytes) => ReadBlobState::Found(bytes.clone()),
            None => ReadBlobState::NotFound,
        })
    }

    fn init(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn reset_database(&mut self) -> StorageResult<()> {
        self.blobs.clear();
        self.transaction_log.clear();
        Ok(())
    }

    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()> {
        self.transaction_log.extend_from_slice(transaction);
        Ok(())
    }

    fn transaction_sync(&self) -> StorageResult<()> {
        Ok(())
    }

    fn transaction_flush(&mut self) -> StorageResult<()> {
        self.transaction_log.clear();
        Ok(())
    }

    fn transaction_load(&mut self) -> StorageResult<String> {
        Ok(String::from_utf8_lossy(&self.transaction_log).into_owned())
    }
}
