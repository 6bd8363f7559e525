use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::PathBuf,
};

use super::{io_to_generic_error, ReadBlobState, Storage, StorageError, StorageResult};

const TRANSACTION_LOG_FILE: &str = "transaction_log.json";

pub struct FileStorage {
    base_path: PathBuf,
    log_file: File,
    transaction_file_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        let transaction_file_path = base_path.join(TRANSACTION_LOG_FILE);

        fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;

        let log_file = open_log(&transaction_file_path)?;

        Ok(Self {
            base_path,
            log_file,
            transaction_file_path,
        })
    }

    fn get_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

fn open_log(path: &PathBuf) -> StorageResult<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StorageError::UnableToCreateNewTransactionLog(io_to_generic_error(e)))
}

impl Storage for FileStorage {
    /// Written to a temporary file first and renamed over the old blob, a crash leaves
    /// either the old or the new contents in place
    fn write_blob(&mut self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        let final_path = self.get_path(&path);
        let temp_path = self.get_path(&format!("{}.tmp", path));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))?;

        file.write_all(&bytes)
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))?;

        file.sync_all()
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))?;

        fs::rename(&temp_path, &final_path)
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))
    }

    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState> {
        let mut file = match File::open(self.get_path(&path)) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                std::io::ErrorKind::NotFound => return Ok(ReadBlobState::NotFound),
                _ => return Err(StorageError::UnableToReadBlob(io_to_generic_error(err))),
            },
        };

        let mut buf = Vec::new();

        file.read_to_end(&mut buf)
            .map_err(|e| StorageError::UnableToReadBlob(io_to_generic_error(e)))?;

        Ok(ReadBlobState::Found(buf))
    }

    // Called on DB Start-up, should be idempotent
    fn init(&mut self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;

        self.log_file = open_log(&self.transaction_file_path)?;

        Ok(())
    }

    // Called when the database gets cleared (via user)
    fn reset_database(&mut self) -> StorageResult<()> {
        fs::remove_dir_all(&self.base_path)
            .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;

        self.init()
    }

    fn transaction_write(&mut self, transaction: &[u8]) -> StorageResult<()> {
        // Buffered OS write, is not 'durable' without the fsync
        self.log_file
            .write_all(transaction)
            .map_err(|e| StorageError::UnableToWriteTransaction(io_to_generic_error(e)))
    }

    fn transaction_sync(&self) -> StorageResult<()> {
        self.log_file.sync_all().map_err(|e| {
            StorageError::UnableToSyncTransactionBufferToPersistentStorage(io_to_generic_error(e))
        })
    }

    fn transaction_flush(&mut self) -> StorageResult<()> {
        self.log_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.transaction_file_path)
            .map_err(|e| StorageError::UnableToCreateNewTransactionLog(io_to_generic_error(e)))?;

        self.log_file.sync_all().map_err(|e| {
            StorageError::UnableToSyncTransactionBufferToPersistentStorage(io_to_generic_error(e))
        })?;

        // Reopen in append mode so later writes never land at a stale offset
        self.log_file = open_log(&self.transaction_file_path)?;

        Ok(())
    }

    // File may or may not exist
    fn transaction_load(&mut self) -> StorageResult<String> {
        let mut contents = String::new();

        let mut file = match File::open(&self.transaction_file_path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(contents),
            Err(err) => {
                return Err(StorageError::UnableToLoadPreviousTransactions(
                    io_to_generic_error(err),
                ))
            }
        };

        file.read_to_string(&mut contents)
            .map_err(|e| StorageError::UnableToLoadPreviousTransactions(io_to_generic_error(e)))?;

        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn test_directory() -> PathBuf {
        ["/", "tmp", "project-tracker", &Uuid::new_v4().to_string()]
            .iter()
            .collect()
    }

    #[test]
    fn blob_round_trip_overwrites() {
        let mut storage = FileStorage::new(test_directory()).unwrap();

        storage
            .write_blob("snapshot".to_string(), b"a longer value".to_vec())
            .unwrap();
        storage
            .write_blob("snapshot".to_string(), b"short".to_vec())
            .unwrap();

        assert_eq!(
            storage.read_blob("snapshot".to_string()).unwrap(),
            ReadBlobState::Found(b"short".to_vec())
        );
        assert_eq!(
            storage.read_blob("missing".to_string()).unwrap(),
            ReadBlobState::NotFound
        );
    }

    #[test]
    fn blob_write_leaves_no_temporary_file() {
        let directory = test_directory();
        let mut storage = FileStorage::new(directory.clone()).unwrap();

        storage
            .write_blob("snapshot".to_string(), b"data".to_vec())
            .unwrap();

        assert!(directory.join("snapshot").exists());
        assert!(!directory.join("snapshot.tmp").exists());
    }

    #[test]
    fn transaction_log_appends_and_flushes() {
        let mut storage = FileStorage::new(test_directory()).unwrap();

        storage.transaction_write(b"one\n").unwrap();
        storage.transaction_write(b"two\n").unwrap();
        storage.transaction_sync().unwrap();

        assert_eq!(storage.transaction_load().unwrap(), "one\ntwo\n");

        storage.transaction_flush().unwrap();
        storage.transaction_write(b"three\n").unwrap();

        assert_eq!(storage.transaction_load().unwrap(), "three\n");
    }

    #[test]
    fn log_survives_reopen() {
        let directory = test_directory();

        {
            let mut storage = FileStorage::new(directory.clone()).unwrap();
            storage.transaction_write(b"one\n").unwrap();
            storage.transaction_sync().unwrap();
        }

        let mut storage = FileStorage::new(directory).unwrap();

        assert_eq!(storage.transaction_load().unwrap(), "one\n");
    }

    #[test]
    fn reset_clears_everything() {
        let mut storage = FileStorage::new(test_directory()).unwrap();

        storage.transaction_write(b"one\n").unwrap();
        storage
            .write_blob("snapshot".to_string(), b"data".to_vec())
            .unwrap();

        storage.reset_database().unwrap();

        assert_eq!(storage.transaction_load().unwrap(), "");
        assert_eq!(
            storage.read_blob("snapshot".to_string()).unwrap(),
            ReadBlobState::NotFound
        );
    }
}
