use crate::{
    database::request_manager::RequestManager,
    model::{client::Client, statement::Statement, validation::require_text},
};

use super::{parse_id, RepositoryResult};

pub trait ClientRepository: Send + Sync {
    fn create_client(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> RepositoryResult<Client>;

    /// Projects referencing the client are left untouched
    fn delete_client(&self, id: &str) -> RepositoryResult<Option<Client>>;

    fn find_clients(&self) -> RepositoryResult<Vec<Client>>;

    fn find_client_by_id(&self, id: &str) -> RepositoryResult<Option<Client>>;
}

pub struct DatabaseClientRepository {
    request_manager: RequestManager,
}

impl DatabaseClientRepository {
    pub fn new(request_manager: RequestManager) -> Self {
        Self { request_manager }
    }
}

impl ClientRepository for DatabaseClientRepository {
    fn create_client(
        &self,
        name: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> RepositoryResult<Client> {
        require_text("name", &name)?;

        let client = Client::new(name, email, phone);

        Ok(self
            .request_manager
            .send_single_statement(Statement::AddClient(client))?
            .client())
    }

    fn delete_client(&self, id: &str) -> RepositoryResult<Option<Client>> {
        let id = parse_id(id)?;

        Ok(self
            .request_manager
            .send_single_statement(Statement::RemoveClient(id))?
            .optional_client())
    }

    fn find_clients(&self) -> RepositoryResult<Vec<Client>> {
        Ok(self
            .request_manager
            .send_single_statement(Statement::ListClients)?
            .client_list())
    }

    fn find_client_by_id(&self, id: &str) -> RepositoryResult<Option<Client>> {
        let id = parse_id(id)?;

        Ok(self
            .request_manager
            .send_single_statement(Statement::GetClient(id))?
            .optional_client())
    }
}
