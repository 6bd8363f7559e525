use crate::model::statement::{Statement, StatementResult};

/// Work sent to a database worker thread
#[derive(Debug)]
pub enum DatabaseCommand {
    /// Statements applied all or nothing, one result per statement
    Transaction(Vec<Statement>),
    Control(Control),
}

impl DatabaseCommand {
    /// One line summary for the worker's debug log
    pub fn summary(&self) -> String {
        match self {
            DatabaseCommand::Transaction(statements) => {
                let mutations = statements.iter().filter(|s| s.is_mutation()).count();

                format!(
                    "Transaction [statements: {}, mutations: {}]",
                    statements.len(),
                    mutations
                )
            }
            DatabaseCommand::Control(control) => format!("Control [{:?}]", control),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransactionResponse {
    Commit(Vec<StatementResult>),
    /// Nothing was applied, carries the reason
    Rollback(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlResponse {
    Success(String),
    Error(String),
}

impl ControlResponse {
    /// Picks the response variant from the outcome of a control action
    pub fn from_result<T, E: std::fmt::Display>(
        result: Result<T, E>,
        on_success: impl FnOnce(T) -> String,
        on_error: impl FnOnce(E) -> String,
    ) -> Self {
        match result {
            Ok(value) => ControlResponse::Success(on_success(value)),
            Err(e) => ControlResponse::Error(on_error(e)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandResponse {
    Transaction(TransactionResponse),
    Control(ControlResponse),
}

#[derive(Debug, PartialEq)]
pub enum Control {
    /// Syncs the transaction log and stops the worker that receives it
    Shutdown,
    /// Persists both tables and trims the transaction log
    SnapshotDatabase,
    /// Drops every record and clears storage, transaction ids start again from 1
    ResetDatabase,
}

/// A command plus the channel its response goes back on
pub struct CommandRequest {
    pub resolver: oneshot::Sender<CommandResponse>,
    pub command: DatabaseCommand,
}
