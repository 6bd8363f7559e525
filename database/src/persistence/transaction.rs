use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::consts::consts::TransactionId;
use crate::model::statement::Statement;

use super::storage::{SharedStorage, StorageError, StorageResult};

// A transaction only reaches the log once every statement in it has applied,
// so the only status we ever write is `Committed`
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum TransactionStatus {
    Committed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionFileWriteMode {
    /// Writes the transaction and performs an fsync before acknowledging the commit
    Sync,
    /// Writes the transaction, lets the OS buffer the writes
    OSBuffered,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionWriteMode {
    /// Writes the WAL to storage
    File(TransactionFileWriteMode),
    /// Used for testing purposes. Skips writing the log entirely
    Off,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub statements: Vec<Statement>,
    pub status: TransactionStatus,
}

pub struct TransactionWAL {
    write_mode: TransactionWriteMode,
    current_transaction_id: LocalClock,
    size: AtomicUsize,
    storage: SharedStorage,
}

impl TransactionWAL {
    pub fn new(write_mode: TransactionWriteMode, storage: SharedStorage) -> Self {
        Self {
            write_mode,
            current_transaction_id: LocalClock::new(),
            size: AtomicUsize::new(0),
            storage,
        }
    }

    pub fn get_increment_current_transaction_id(&self) -> TransactionId {
        self.current_transaction_id.increment()
    }

    pub fn get_current_transaction_id(&self) -> TransactionId {
        self.current_transaction_id.current()
    }

    pub fn set_current_transaction_id(&self, transaction_id: &TransactionId) {
        self.current_transaction_id.set(transaction_id.to_number())
    }

    /// Number of transactions written since the last flush
    pub fn get_wal_size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    pub fn commit(
        &self,
        applied_transaction_id: TransactionId,
        statements: Vec<Statement>,
    ) -> StorageResult<()> {
        let sync = match &self.write_mode {
            TransactionWriteMode::Off => return Ok(()),
            TransactionWriteMode::File(mode) => mode == &TransactionFileWriteMode::Sync,
        };

        let transaction = Transaction {
            id: applied_transaction_id,
            statements,
            status: TransactionStatus::Committed,
        };

        let transaction_json_line = format!(
            "{}\n",
            serde_json::to_string(&transaction)
                .map_err(|e| StorageError::UnableToWriteTransaction(e.to_string()))?
        );

        let mut storage = self.storage.lock().unwrap();

        storage.transaction_write(transaction_json_line.as_bytes())?;

        // Performs an fsync on the transaction log, ensuring that the transaction is durable
        // https://www.postgresql.org/docs/current/wal-reliability.html
        if sync {
            storage.transaction_sync()?;
        }

        self.size.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    pub fn sync(&self) -> StorageResult<()> {
        self.storage.lock().unwrap().transaction_sync()
    }

    // We have persisted the current state, we can delete the transaction log
    pub fn flush_transactions(&self) -> StorageResult<usize> {
        self.storage.lock().unwrap().transaction_flush()?;

        Ok(self.size.swap(0, Ordering::SeqCst))
    }

    pub fn reset(&self) {
        self.size.store(0, Ordering::SeqCst);
        self.current_transaction_id.reset();
    }

    /// Reads every logged transaction in commit order. A final line that does not decode is
    /// an append cut short by a crash: it is dropped from the log and never acknowledged.
    /// Damage anywhere else is an error.
    pub fn restore(&self) -> StorageResult<Vec<Transaction>> {
        let mut storage = self.storage.lock().unwrap();

        let transactions_data = storage.transaction_load()?;

        let last_line_index = transactions_data
            .split('\n')
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, _)| index)
            .last();

        let mut transactions: Vec<Transaction> = vec![];
        let mut torn_line_start: Option<usize> = None;
        let mut offset = 0;

        for (index, transaction_string) in transactions_data.split('\n').enumerate() {
            let line_start = offset;
            offset += transaction_string.len() + 1;

            if transaction_string.is_empty() {
                continue;
            }

            match serde_json::from_str::<Transaction>(transaction_string) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) if Some(index) == last_line_index => {
                    log::warn!(
                        "Discarding incomplete transaction at the end of the log: {}",
                        e
                    );
                    torn_line_start = Some(line_start);
                }
                Err(e) => {
                    return Err(StorageError::UnableToDecode(format!(
                        "transaction log line {}: {}",
                        index + 1,
                        e
                    )))
                }
            }
        }

        if let Some(valid_length) = torn_line_start {
            storage.transaction_flush()?;
            storage.transaction_write(&transactions_data.as_bytes()[..valid_length])?;
            storage.transaction_sync()?;
        }

        self.size.store(transactions.len(), Ordering::SeqCst);

        Ok(transactions)
    }
}

#[derive(Debug, Default)]
pub struct LocalClock {
    ts_sequence: AtomicUsize,
}

impl LocalClock {
    pub fn new() -> Self {
        Self {
            ts_sequence: AtomicUsize::new(0),
        }
    }

    // It is unlikely we need `SeqCst` Acq / Rel should be sufficient
    fn increment(&self) -> TransactionId {
        TransactionId(self.ts_sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn current(&self) -> TransactionId {
        TransactionId(self.ts_sequence.load(Ordering::SeqCst))
    }

    fn reset(&self) {
        self.ts_sequence.store(0, Ordering::SeqCst);
    }

    fn set(&self, value: usize) {
        self.ts_sequence.store(value, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{
        model::client::Client,
        persistence::storage::{memory::MemoryStorage, Storage},
    };

    use super::*;

    fn wal(write_mode: TransactionWriteMode) -> TransactionWAL {
        TransactionWAL::new(write_mode, Arc::new(Mutex::new(MemoryStorage::new())))
    }

    #[test]
    fn committed_transactions_restore_in_order() {
        let wal = wal(TransactionWriteMode::File(TransactionFileWriteMode::Sync));

        let first = vec![Statement::AddClient(Client::new_test())];
        let second = vec![Statement::ListClients];

        let first_id = wal.get_increment_current_transaction_id();
        wal.commit(first_id.clone(), first.clone()).unwrap();

        let second_id = wal.get_increment_current_transaction_id();
        wal.commit(second_id.clone(), second.clone()).unwrap();

        assert_eq!(first_id, TransactionId(1));
        assert_eq!(second_id, TransactionId(2));
        assert_eq!(wal.get_wal_size(), 2);

        assert_eq!(
            wal.restore().unwrap(),
            vec![
                Transaction {
                    id: first_id,
                    statements: first,
                    status: TransactionStatus::Committed,
                },
                Transaction {
                    id: second_id,
                    statements: second,
                    status: TransactionStatus::Committed,
                },
            ]
        );
    }

    #[test]
    fn write_mode_off_skips_log() {
        let wal = wal(TransactionWriteMode::Off);

        wal.commit(TransactionId(1), vec![Statement::ListClients])
            .unwrap();

        assert!(wal.restore().unwrap().is_empty());
    }

    #[test]
    fn incomplete_last_line_is_dropped_from_log() {
        let storage: SharedStorage = Arc::new(Mutex::new(MemoryStorage::new()));
        let wal = TransactionWAL::new(
            TransactionWriteMode::File(TransactionFileWriteMode::Sync),
            storage.clone(),
        );

        let statements = vec![Statement::AddClient(Client::new_test())];

        wal.commit(TransactionId(1), statements.clone()).unwrap();

        storage
            .lock()
            .unwrap()
            .transaction_write(b"{\"id\":2,\"statem")
            .unwrap();

        let restored = wal.restore().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].statements, statements);

        // Later commits land on a clean line
        wal.commit(TransactionId(2), vec![Statement::ListClients])
            .unwrap();

        let ids: Vec<TransactionId> = wal.restore().unwrap().into_iter().map(|t| t.id).collect();

        assert_eq!(ids, vec![TransactionId(1), TransactionId(2)]);
    }

    #[test]
    fn damaged_line_before_the_end_is_an_error() {
        let storage: SharedStorage = Arc::new(Mutex::new(MemoryStorage::new()));
        let wal = TransactionWAL::new(
            TransactionWriteMode::File(TransactionFileWriteMode::Sync),
            storage.clone(),
        );

        wal.commit(TransactionId(1), vec![Statement::ListClients])
            .unwrap();

        storage
            .lock()
            .unwrap()
            .transaction_write(b"not json\n")
            .unwrap();

        wal.commit(TransactionId(2), vec![Statement::ListClients])
            .unwrap();

        assert!(matches!(
            wal.restore(),
            Err(StorageError::UnableToDecode(_))
        ));
    }

    #[test]
    fn flush_empties_log_and_reports_size() {
        let wal = wal(TransactionWriteMode::File(TransactionFileWriteMode::OSBuffered));

        wal.commit(TransactionId(1), vec![Statement::ListClients])
            .unwrap();

        assert_eq!(wal.flush_transactions().unwrap(), 1);
        assert!(wal.restore().unwrap().is_empty());
        assert_eq!(wal.get_wal_size(), 0);
    }
}
