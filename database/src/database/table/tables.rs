use crate::{
    consts::consts::TransactionId,
    model::{
        client::Client,
        project::Project,
        statement::{Statement, StatementResult},
    },
};

use super::{
    row::{ApplyUpdateResult, Row},
    table::{ApplyErrors, Table, Undo},
};

/// Undo record for a mutation, tagged with the table it touched
#[derive(Debug)]
pub enum TableRollback {
    Client(Undo<Client>),
    Project(Undo<Project>),
}

/// Every table in the database. Projects reference clients by id only, nothing here
/// enforces that the referenced client exists.
#[derive(Default)]
pub struct Tables {
    pub client_table: Table<Client>,
    pub project_table: Table<Project>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a statement, mutations also return the information needed to roll them back
    pub fn apply_statement(
        &mut self,
        statement: Statement,
        transaction_id: TransactionId,
    ) -> Result<(StatementResult, Option<TableRollback>), ApplyErrors> {
        let applied = match statement {
            Statement::AddClient(client) => {
                let undo = self
                    .client_table
                    .insert(client.clone(), transaction_id)?;

                (StatementResult::Client(client), Some(TableRollback::Client(undo)))
            }
            Statement::RemoveClient(id) => match self.client_table.remove(&id) {
                Some((client, undo)) => (
                    StatementResult::OptionalClient(Some(client)),
                    Some(TableRollback::Client(undo)),
                ),
                None => (StatementResult::OptionalClient(None), None),
            },
            Statement::AddProject(project) => {
                let undo = self
                    .project_table
                    .insert(project.clone(), transaction_id)?;

                (
                    StatementResult::Project(project),
                    Some(TableRollback::Project(undo)),
                )
            }
            Statement::UpdateProject(id, update) => match self.project_table.get_row_mut(&id) {
                Some(row) => {
                    let ApplyUpdateResult { previous, current } =
                        row.apply_update(update, transaction_id);

                    (
                        StatementResult::OptionalProject(Some(current)),
                        Some(TableRollback::Project(Undo::Restore(previous))),
                    )
                }
                None => (StatementResult::OptionalProject(None), None),
            },
            Statement::RemoveProject(id) => match self.project_table.remove(&id) {
                Some((project, undo)) => (
                    StatementResult::OptionalProject(Some(project)),
                    Some(TableRollback::Project(undo)),
                ),
                None => (StatementResult::OptionalProject(None), None),
            },
            query => (self.query_statement(&query), None),
        };

        Ok(applied)
    }

    pub fn query_statement(&self, statement: &Statement) -> StatementResult {
        match statement {
            Statement::GetClient(id) => StatementResult::OptionalClient(self.client_table.get(id)),
            Statement::ListClients => StatementResult::ClientList(self.client_table.list()),
            Statement::GetProject(id) => {
                StatementResult::OptionalProject(self.project_table.get(id))
            }
            Statement::ListProjects => StatementResult::ProjectList(self.project_table.list()),
            Statement::AddClient(_)
            | Statement::RemoveClient(_)
            | Statement::AddProject(_)
            | Statement::UpdateProject(_, _)
            | Statement::RemoveProject(_) => {
                panic!("Should only contain query statements")
            }
        }
    }

    pub fn apply_rollback(&mut self, rollback: TableRollback) {
        match rollback {
            TableRollback::Client(undo) => self.client_table.rollback(undo),
            TableRollback::Project(undo) => self.project_table.rollback(undo),
        }
    }

    pub fn restore_tables(&mut self, client_rows: Vec<Row<Client>>, project_rows: Vec<Row<Project>>) {
        self.client_table.restore_table(client_rows);
        self.project_table.restore_table(project_rows);
    }

    pub fn clear(&mut self) {
        self.client_table.clear();
        self.project_table.clear();
    }
}
