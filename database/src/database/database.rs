use std::{
    sync::{Arc, RwLock, RwLockWriteGuard},
    thread,
    time::Instant,
};

use num_format::{Locale, ToFormattedString};
use thiserror::Error;

use crate::{
    consts::consts::TransactionId,
    model::statement::Statement,
    persistence::{persistence::Persistence, storage::StorageError, storage::StorageResult},
};

use super::{
    commands::{CommandRequest, CommandResponse, DatabaseCommand, TransactionResponse},
    control::{ControlContext, DatabaseControlAction},
    options::DatabaseOptions,
    request_manager::RequestManager,
    table::tables::{TableRollback, Tables},
};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Unable to replay transaction {0} from the transaction log: {1}")]
    Restore(TransactionId, String),

    #[error("Unable to start database worker thread: {0}")]
    WorkerSpawn(std::io::Error),
}

pub enum ApplyMode {
    /// Normal operation, the transaction is assigned the next id and written to the log
    Request,
    /// Replaying the log, the transaction keeps its logged id and is not written again
    Restore(TransactionId),
}

pub struct Database {
    pub(crate) tables: RwLock<Tables>,
    pub(crate) persistence: Persistence,
    pub database_options: DatabaseOptions,
}

impl Database {
    /// Opens the storage engine and, when enabled, restores the previous state from it
    pub fn new(database_options: DatabaseOptions) -> Result<Self, DatabaseError> {
        let database = Self {
            tables: RwLock::new(Tables::new()),
            persistence: Persistence::new(&database_options)?,
            database_options,
        };

        if database.database_options.restore {
            database.restore()?;
        }

        Ok(database)
    }

    pub fn new_test() -> Self {
        Database::new(DatabaseOptions::new_test()).expect("In memory database should always start")
    }

    #[tracing::instrument(skip(self))]
    fn restore(&self) -> Result<(), DatabaseError> {
        let now = Instant::now();

        log::info!(
            "Storage Engine: [{}]",
            self.database_options.storage_engine.describe()
        );

        let (snapshot_count, snapshot_transaction_id) = {
            let mut tables = self.tables.write().unwrap();

            self.persistence
                .snapshot_manager
                .restore_snapshot(&mut tables)?
        };

        self.persistence
            .transaction_wal
            .set_current_transaction_id(&snapshot_transaction_id);

        let mut restored_transaction_count: usize = 0;

        for transaction in self.persistence.transaction_wal.restore()? {
            // Transactions already captured by the snapshot are skipped
            if transaction.id <= snapshot_transaction_id {
                continue;
            }

            let transaction_id = transaction.id.clone();

            if let TransactionResponse::Rollback(rollback_message) = self
                .apply_transaction(transaction.statements, ApplyMode::Restore(transaction.id))
            {
                return Err(DatabaseError::Restore(transaction_id, rollback_message));
            }

            restored_transaction_count += 1;
        }

        log::info!(
            "✅ Successful Restore [Duration: {}ms]",
            now.elapsed().as_millis(),
        );

        log::info!(
            "📀 Data               [RowsFromSnapshot: {}, TransactionsAppliedToSnapshot: {}, CurrentTxId: {}]",
            snapshot_count.to_formatted_string(&Locale::en),
            restored_transaction_count.to_formatted_string(&Locale::en),
            self.persistence
                .transaction_wal
                .get_current_transaction_id()
                .to_number()
                .to_formatted_string(&Locale::en)
        );

        Ok(())
    }

    /// Starts the worker threads, each with its own channel. The returned request manager
    /// spreads requests across them.
    pub fn run(self) -> Result<RequestManager, DatabaseError> {
        let threads = self.database_options.threads.max(1);
        let request_timeout = self.database_options.request_timeout;

        let database = Arc::new(self);

        let mut database_senders = Vec::with_capacity(threads);

        for thread_id in 0..threads {
            let (database_sender, database_receiver) = flume::unbounded::<CommandRequest>();

            let thread_database = database.clone();

            thread::Builder::new()
                .name(format!("Database Worker {}", thread_id))
                .spawn(move || thread_database.process_commands(thread_id, database_receiver))
                .map_err(DatabaseError::WorkerSpawn)?;

            database_senders.push(database_sender);
        }

        log::info!("Started {} database worker threads", threads);

        Ok(RequestManager::new(database_senders, request_timeout))
    }

    fn process_commands(&self, thread_id: usize, database_receiver: flume::Receiver<CommandRequest>) {
        let control_context = ControlContext {
            thread_id,
            database: self,
        };

        // Ends when the worker is shut down or every request manager has been dropped
        while let Ok(CommandRequest { command, resolver }) = database_receiver.recv() {
            log::debug!("[Thread: {}] Received command: {}", thread_id, command.summary());

            match command {
                DatabaseCommand::Transaction(statements) => {
                    let response = self.apply_transaction(statements, ApplyMode::Request);

                    // The caller may have already timed out
                    let _ = resolver.send(CommandResponse::Transaction(response));
                }
                DatabaseCommand::Control(control) => {
                    let (action, response) = control_context.run(control);

                    if let DatabaseControlAction::Exit = action {
                        // Stop accepting work before acknowledging, queued requests are
                        // dropped so their callers see the worker as unavailable
                        database_receiver.drain().for_each(drop);
                        drop(database_receiver);

                        let _ = resolver.send(CommandResponse::Control(response));
                        break;
                    }

                    let _ = resolver.send(CommandResponse::Control(response));
                }
            }
        }

        log::info!("[Thread: {}] Database worker stopped", thread_id);
    }

    /// Applies every statement or none of them. Read only transactions share a read lock,
    /// anything that mutates holds the write lock until it is in the transaction log.
    pub fn apply_transaction(
        &self,
        statements: Vec<Statement>,
        mode: ApplyMode,
    ) -> TransactionResponse {
        if statements.iter().all(Statement::is_query) {
            let tables = self.tables.read().unwrap();

            return TransactionResponse::Commit(
                statements
                    .iter()
                    .map(|statement| tables.query_statement(statement))
                    .collect(),
            );
        }

        let mut tables = self.tables.write().unwrap();

        let transaction_wal = &self.persistence.transaction_wal;

        let applying_transaction_id = match &mode {
            ApplyMode::Request => transaction_wal.get_increment_current_transaction_id(),
            ApplyMode::Restore(transaction_id) => {
                transaction_wal.set_current_transaction_id(transaction_id);
                transaction_id.clone()
            }
        };

        let mut results = Vec::with_capacity(statements.len());
        let mut rollbacks: Vec<TableRollback> = vec![];

        for statement in statements.clone() {
            match tables.apply_statement(statement, applying_transaction_id.clone()) {
                Ok((result, rollback)) => {
                    results.push(result);
                    rollbacks.extend(rollback);
                }
                Err(err) => {
                    Self::rollback(&mut tables, rollbacks);

                    log::info!("⚠️  Rolled back: [TX: {}] {}", applying_transaction_id, err);

                    return TransactionResponse::Rollback(err.to_string());
                }
            }
        }

        if let ApplyMode::Request = mode {
            if let Err(err) = transaction_wal.commit(applying_transaction_id.clone(), statements) {
                Self::rollback(&mut tables, rollbacks);

                log::error!(
                    "⚠️  Rolled back: [TX: {}] unable to write transaction log: {}",
                    applying_transaction_id,
                    err
                );

                return TransactionResponse::Rollback(format!(
                    "Unable to persist transaction: {}",
                    err
                ));
            }

            log::debug!("✅ Committed: [TX: {}]", applying_transaction_id);

            self.snapshot_when_log_is_full(&tables);
        }

        TransactionResponse::Commit(results)
    }

    fn rollback(tables: &mut RwLockWriteGuard<'_, Tables>, rollbacks: Vec<TableRollback>) {
        for rollback in rollbacks.into_iter().rev() {
            tables.apply_rollback(rollback);
        }
    }

    /// Runs with the write lock already held by the committing transaction. A failed snapshot
    /// leaves the log intact, the commit itself has already succeeded.
    fn snapshot_when_log_is_full(&self, tables: &Tables) {
        let Some(threshold) = self.database_options.snapshot_threshold else {
            return;
        };

        if self.persistence.transaction_wal.get_wal_size() < threshold {
            return;
        }

        match self.snapshot_tables(tables) {
            Ok(flushed) => log::info!(
                "📸 Snapshot taken, flushed {} transactions",
                flushed.to_formatted_string(&Locale::en)
            ),
            Err(e) => log::error!("Unable to snapshot database: {}", e),
        }
    }

    /// Persists the current tables and trims the transaction log, returns the number of
    /// transactions that no longer need replaying
    pub fn snapshot(&self) -> StorageResult<usize> {
        // Holding the write lock stops commits between the snapshot and the log flush
        let tables = self.tables.write().unwrap();

        self.snapshot_tables(&tables)
    }

    fn snapshot_tables(&self, tables: &Tables) -> StorageResult<usize> {
        let transaction_id = self
            .persistence
            .transaction_wal
            .get_current_transaction_id();

        self.persistence
            .snapshot_manager
            .create_snapshot(tables, transaction_id)?;

        self.persistence.transaction_wal.flush_transactions()
    }

    pub fn reset(&self) -> StorageResult<()> {
        let mut tables = self.tables.write().unwrap();

        self.persistence.reset()?;

        tables.clear();

        Ok(())
    }
}

pub mod test_utils {
    use crate::{database::commands::TransactionResponse, model::statement::Statement};

    use super::{ApplyMode, Database};

    pub fn apply_transaction_at_next_timestamp(
        database: &Database,
        statements: Vec<Statement>,
    ) -> TransactionResponse {
        database.apply_transaction(statements, ApplyMode::Request)
    }
}
