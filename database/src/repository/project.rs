use crate::{
    database::{request_manager::RequestManager, table::row::UpdateStatement},
    model::{
        project::{Project, ProjectStatus, UpdateProjectData},
        statement::Statement,
        validation::require_text,
    },
};

use super::{parse_id, RepositoryResult};

pub trait ProjectRepository: Send + Sync {
    /// `client_id` must be a well formed id, the client itself is not required to exist
    fn create_project(
        &self,
        client_id: &str,
        name: String,
        description: String,
        status: Option<ProjectStatus>,
    ) -> RepositoryResult<Project>;

    fn delete_project(&self, id: &str) -> RepositoryResult<Option<Project>>;

    /// Omitted `status` and `client_id` keep their stored values
    fn update_project(
        &self,
        id: &str,
        name: String,
        description: String,
        status: Option<ProjectStatus>,
        client_id: Option<&str>,
    ) -> RepositoryResult<Option<Project>>;

    fn find_projects(&self) -> RepositoryResult<Vec<Project>>;

    fn find_project_by_id(&self, id: &str) -> RepositoryResult<Option<Project>>;
}

pub struct DatabaseProjectRepository {
    request_manager: RequestManager,
}

impl DatabaseProjectRepository {
    pub fn new(request_manager: RequestManager) -> Self {
        Self { request_manager }
    }
}

impl ProjectRepository for DatabaseProjectRepository {
    fn create_project(
        &self,
        client_id: &str,
        name: String,
        description: String,
        status: Option<ProjectStatus>,
    ) -> RepositoryResult<Project> {
        require_text("name", &name)?;
        require_text("description", &description)?;
        require_text("clientId", client_id)?;

        let project = Project::new(parse_id(client_id)?, name, description, status);

        Ok(self
            .request_manager
            .send_single_statement(Statement::AddProject(project))?
            .project())
    }

    fn delete_project(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let id = parse_id(id)?;

        Ok(self
            .request_manager
            .send_single_statement(Statement::RemoveProject(id))?
            .optional_project())
    }

    fn update_project(
        &self,
        id: &str,
        name: String,
        description: String,
        status: Option<ProjectStatus>,
        client_id: Option<&str>,
    ) -> RepositoryResult<Option<Project>> {
        require_text("name", &name)?;
        require_text("description", &description)?;

        let id = parse_id(id)?;

        let client_id = match client_id {
            Some(client_id) => UpdateStatement::Set(parse_id(client_id)?),
            None => UpdateStatement::NoChanges,
        };

        let update = UpdateProjectData {
            name: UpdateStatement::Set(name),
            description: UpdateStatement::Set(description),
            status: status.into(),
            client_id,
        };

        Ok(self
            .request_manager
            .send_single_statement(Statement::UpdateProject(id, update))?
            .optional_project())
    }

    fn find_projects(&self) -> RepositoryResult<Vec<Project>> {
        Ok(self
            .request_manager
            .send_single_statement(Statement::ListProjects)?
            .project_list())
    }

    fn find_project_by_id(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let id = parse_id(id)?;

        Ok(self
            .request_manager
            .send_single_statement(Statement::GetProject(id))?
            .optional_project())
    }
}
