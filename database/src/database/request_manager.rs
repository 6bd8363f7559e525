use std::time::Duration;

use flume::Sender;
use rand::Rng;
use thiserror::Error;

use crate::model::statement::{Statement, StatementResult};

use super::commands::{
    CommandRequest, CommandResponse, Control, ControlResponse, DatabaseCommand,
    TransactionResponse,
};

#[derive(Error, Debug, PartialEq)]
pub enum RequestManagerError {
    #[error("Database took too long to respond to request")]
    DatabaseTimeout,
    #[error("Database is not running")]
    DatabaseUnavailable,
    #[error("Rolled back transaction: {0}")]
    TransactionRollback(String),
    #[error("Database control command failed: {0}")]
    ControlError(String),
    #[error("Database responded with an unexpected response type")]
    UnexpectedResponse,
}

/// Goal of the request manager is to provide a simple interface for interacting with the database
///
/// The request manager provides the following APIs, sorted by the easiest to use to the most complex
/// 1. Single statement -- one statement, one result
/// 2. Transaction -- several statements applied all or nothing, one result per statement
/// 3. Control -- shutdown, snapshot and reset of the database workers
///
/// Typed access per entity lives in the repositories, which wrap this API.
#[derive(Clone)]
pub struct RequestManager {
    database_senders: Vec<Sender<CommandRequest>>,
    timeout: Duration,
}

impl RequestManager {
    pub fn new(database_senders: Vec<Sender<CommandRequest>>, timeout: Duration) -> Self {
        Self {
            database_senders,
            timeout,
        }
    }

    /// Sends a single statement to the database and returns a single statement result
    pub fn send_single_statement(
        &self,
        statement: Statement,
    ) -> Result<StatementResult, RequestManagerError> {
        self.send_transaction(vec![statement])?
            .into_iter()
            .next()
            .ok_or(RequestManagerError::UnexpectedResponse)
    }

    /// Used to create a transaction
    pub fn send_transaction(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<StatementResult>, RequestManagerError> {
        let sender = self
            .pick_worker()
            .ok_or(RequestManagerError::DatabaseUnavailable)?;

        match self.send_command(sender, DatabaseCommand::Transaction(statements))? {
            CommandResponse::Transaction(TransactionResponse::Commit(results)) => Ok(results),
            CommandResponse::Transaction(TransactionResponse::Rollback(message)) => {
                Err(RequestManagerError::TransactionRollback(message))
            }
            CommandResponse::Control(_) => Err(RequestManagerError::UnexpectedResponse),
        }
    }

    /// Stops every worker thread, each syncs the transaction log on the way out. A worker
    /// that fails does not stop the request reaching the rest.
    pub fn send_shutdown_request(&self) -> Result<String, RequestManagerError> {
        let mut messages = vec![];
        let mut errors = vec![];

        for (thread_id, sender) in self.database_senders.iter().enumerate() {
            match self.send_control(sender, Control::Shutdown) {
                Ok(message) => messages.push(message),
                Err(e) => errors.push(format!("[Thread: {}] {}", thread_id, e)),
            }
        }

        if !errors.is_empty() {
            return Err(RequestManagerError::ControlError(errors.join("\n")));
        }

        Ok(messages.join("\n"))
    }

    pub fn send_snapshot_request(&self) -> Result<String, RequestManagerError> {
        let sender = self
            .pick_worker()
            .ok_or(RequestManagerError::DatabaseUnavailable)?;

        self.send_control(sender, Control::SnapshotDatabase)
    }

    pub fn send_reset_request(&self) -> Result<String, RequestManagerError> {
        let sender = self
            .pick_worker()
            .ok_or(RequestManagerError::DatabaseUnavailable)?;

        self.send_control(sender, Control::ResetDatabase)
    }

    fn pick_worker(&self) -> Option<&Sender<CommandRequest>> {
        if self.database_senders.is_empty() {
            return None;
        }

        let index = rand::thread_rng().gen_range(0..self.database_senders.len());

        self.database_senders.get(index)
    }

    fn send_control(
        &self,
        sender: &Sender<CommandRequest>,
        control: Control,
    ) -> Result<String, RequestManagerError> {
        match self.send_command(sender, DatabaseCommand::Control(control))? {
            CommandResponse::Control(ControlResponse::Success(message)) => Ok(message),
            CommandResponse::Control(ControlResponse::Error(message)) => {
                Err(RequestManagerError::ControlError(message))
            }
            CommandResponse::Transaction(_) => Err(RequestManagerError::UnexpectedResponse),
        }
    }

    fn send_command(
        &self,
        sender: &Sender<CommandRequest>,
        command: DatabaseCommand,
    ) -> Result<CommandResponse, RequestManagerError> {
        let (resolver, response_receiver) = oneshot::channel::<CommandResponse>();

        // Sends the request to the database worker, the worker will respond
        //  on the response_receiver once it's finished processing the request
        sender
            .send(CommandRequest { resolver, command })
            .map_err(|_| RequestManagerError::DatabaseUnavailable)?;

        match response_receiver.recv_timeout(self.timeout) {
            Ok(response) => Ok(response),
            Err(oneshot::RecvTimeoutError::Timeout) => Err(RequestManagerError::DatabaseTimeout),
            Err(oneshot::RecvTimeoutError::Disconnected) => {
                Err(RequestManagerError::DatabaseUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread::{self, JoinHandle};

    use crate::{
        database::{database::Database, options::DatabaseOptions},
        model::client::Client,
    };

    use super::*;

    #[test]
    fn statements_from_many_threads_are_all_applied() {
        let request_manager = Database::new(DatabaseOptions::new_test().set_threads(3))
            .unwrap()
            .run()
            .unwrap();

        let mut sender_threads: Vec<JoinHandle<()>> = vec![];

        for thread_id in 0..4 {
            let rm = request_manager.clone();

            sender_threads.push(thread::spawn(move || {
                for index in 0..25 {
                    let client = Client::new(format!("Client {}-{}", thread_id, index), None, None);

                    let added = rm
                        .send_single_statement(Statement::AddClient(client.clone()))
                        .expect("Should not timeout")
                        .client();

                    assert_eq!(added, client);
                }
            }));
        }

        for thread in sender_threads {
            thread.join().unwrap();
        }

        let clients = request_manager
            .send_single_statement(Statement::ListClients)
            .unwrap()
            .client_list();

        assert_eq!(clients.len(), 100);

        request_manager.send_shutdown_request().unwrap();
    }

    #[test]
    fn rollback_is_reported_as_error() {
        let request_manager = Database::new_test().run().unwrap();

        let client = Client::new_test();

        let result = request_manager.send_transaction(vec![
            Statement::AddClient(client.clone()),
            Statement::AddClient(client.clone()),
        ]);

        assert_eq!(
            result,
            Err(RequestManagerError::TransactionRollback(format!(
                "Cannot create, record already exists: {}",
                client.id
            )))
        );
    }

    #[test]
    fn requests_after_shutdown_are_unavailable() {
        let request_manager = Database::new_test().run().unwrap();

        let shutdown_response = request_manager.send_shutdown_request().unwrap();

        assert!(shutdown_response.contains("Successfully shut down worker thread"));

        assert_eq!(
            request_manager.send_single_statement(Statement::ListClients),
            Err(RequestManagerError::DatabaseUnavailable)
        );
    }

    #[test]
    fn shutdown_reaches_every_worker_when_one_fails() {
        let request_manager = Database::new_test().run().unwrap();

        let worker = |index: usize| {
            RequestManager::new(
                vec![request_manager.database_senders[index].clone()],
                Duration::from_secs(2),
            )
        };

        let first_worker = worker(0);
        let second_worker = worker(1);

        first_worker.send_shutdown_request().unwrap();

        let result = request_manager.send_shutdown_request();

        assert!(matches!(
            result,
            Err(RequestManagerError::ControlError(message)) if message.starts_with("[Thread: 0]")
        ));

        assert_eq!(
            second_worker.send_single_statement(Statement::ListClients),
            Err(RequestManagerError::DatabaseUnavailable)
        );
    }

    #[test]
    fn snapshot_and_reset_controls() {
        let request_manager = Database::new_test().run().unwrap();

        request_manager
            .send_single_statement(Statement::AddClient(Client::new_test()))
            .unwrap();

        let snapshot = request_manager.send_snapshot_request().unwrap();

        assert!(snapshot.contains("flushed 1 transactions"));

        request_manager.send_reset_request().unwrap();

        let clients = request_manager
            .send_single_statement(Statement::ListClients)
            .unwrap()
            .client_list();

        assert!(clients.is_empty());
    }

    #[test]
    fn no_workers_is_unavailable() {
        let request_manager = RequestManager::new(vec![], Duration::from_millis(10));

        assert_eq!(
            request_manager.send_single_statement(Statement::ListClients),
            Err(RequestManagerError::DatabaseUnavailable)
        );
    }
}
