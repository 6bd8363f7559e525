use std::sync::Arc;

use database::{
    database::request_manager::RequestManager,
    model::{
        client::Client,
        project::{Project, ProjectStatus},
    },
    repository::{
        client::{ClientRepository, DatabaseClientRepository},
        project::{DatabaseProjectRepository, ProjectRepository},
        RepositoryError,
    },
};
use juniper::{
    graphql_value, EmptySubscription, FieldError, FieldResult, GraphQLEnum, GraphQLObject,
    RootNode, ID,
};

pub struct GraphQLContext {
    pub clients: Arc<dyn ClientRepository>,
    pub projects: Arc<dyn ProjectRepository>,
}

impl GraphQLContext {
    pub fn new(request_manager: RequestManager) -> Self {
        Self {
            clients: Arc::new(DatabaseClientRepository::new(request_manager.clone())),
            projects: Arc::new(DatabaseProjectRepository::new(request_manager)),
        }
    }
}

// https://graphql-rust.github.io/juniper/master/types/objects/using_contexts.html
impl juniper::Context for GraphQLContext {}

/// Validation failures are reported to the caller, everything else is opaque
fn to_field_error(error: RepositoryError) -> FieldError {
    if error.is_validation() {
        return FieldError::new(error, graphql_value!({ "code": "VALIDATION_ERROR" }));
    }

    log::error!("Storage request failed: {}", error);

    FieldError::new(error, graphql_value!({ "code": "STORAGE_ERROR" }))
}

#[derive(GraphQLEnum, Clone, Copy, Debug, PartialEq)]
#[graphql(name = "ProjectStatus")]
pub enum ProjectStatusValue {
    #[graphql(name = "NEW")]
    New,
    InProgress,
    Completed,
}

impl From<ProjectStatusValue> for ProjectStatus {
    fn from(value: ProjectStatusValue) -> Self {
        match value {
            ProjectStatusValue::New => ProjectStatus::NotStarted,
            ProjectStatusValue::InProgress => ProjectStatus::InProgress,
            ProjectStatusValue::Completed => ProjectStatus::Completed,
        }
    }
}

#[derive(GraphQLObject)]
#[graphql(name = "Client")]
pub struct ClientObject {
    pub id: ID,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Client> for ClientObject {
    fn from(client: Client) -> Self {
        ClientObject {
            id: ID::from(client.id.to_string()),
            name: client.name,
            email: client.email,
            phone: client.phone,
        }
    }
}

pub struct ProjectObject(Project);

#[juniper::graphql_object(name = "Project", context = GraphQLContext)]
impl ProjectObject {
    fn id(&self) -> ID {
        ID::from(self.0.id.to_string())
    }

    fn client_id(&self) -> ID {
        ID::from(self.0.client_id.to_string())
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn description(&self) -> &str {
        &self.0.description
    }

    /// Human readable status, e.g. "Not Started"
    fn status(&self) -> String {
        self.0.status.to_string()
    }

    /// Owning client, null once that client has been deleted
    fn client(&self, context: &GraphQLContext) -> FieldResult<Option<ClientObject>> {
        context
            .clients
            .find_client_by_id(self.0.client_id.as_str())
            .map(|client| client.map(ClientObject::from))
            .map_err(to_field_error)
    }
}

pub struct QueryRoot;

#[juniper::graphql_object(name = "RootQueryType", context = GraphQLContext)]
impl QueryRoot {
    fn clients(context: &GraphQLContext) -> FieldResult<Vec<ClientObject>> {
        let clients = context.clients.find_clients().map_err(to_field_error)?;

        Ok(clients.into_iter().map(ClientObject::from).collect())
    }

    fn client(id: ID, context: &GraphQLContext) -> FieldResult<Option<ClientObject>> {
        let client = context
            .clients
            .find_client_by_id(&id)
            .map_err(to_field_error)?;

        Ok(client.map(ClientObject::from))
    }

    fn projects(context: &GraphQLContext) -> FieldResult<Vec<ProjectObject>> {
        let projects = context.projects.find_projects().map_err(to_field_error)?;

        Ok(projects.into_iter().map(ProjectObject).collect())
    }

    fn project(id: ID, context: &GraphQLContext) -> FieldResult<Option<ProjectObject>> {
        let project = context
            .projects
            .find_project_by_id(&id)
            .map_err(to_field_error)?;

        Ok(project.map(ProjectObject))
    }
}

pub struct MutationRoot;

#[juniper::graphql_object(name = "Mutations", context = GraphQLContext)]
impl MutationRoot {
    fn add_client(
        name: String,
        email: Option<String>,
        phone: Option<String>,
        context: &GraphQLContext,
    ) -> FieldResult<ClientObject> {
        let client = context
            .clients
            .create_client(name, email, phone)
            .map_err(to_field_error)?;

        Ok(ClientObject::from(client))
    }

    /// Projects of the deleted client are kept
    fn delete_client(id: ID, context: &GraphQLContext) -> FieldResult<Option<ClientObject>> {
        let client = context.clients.delete_client(&id).map_err(to_field_error)?;

        Ok(client.map(ClientObject::from))
    }

    fn add_project(
        name: String,
        description: String,
        client_id: String,
        status: Option<ProjectStatusValue>,
        context: &GraphQLContext,
    ) -> FieldResult<ProjectObject> {
        let project = context
            .projects
            .create_project(&client_id, name, description, status.map(ProjectStatus::from))
            .map_err(to_field_error)?;

        Ok(ProjectObject(project))
    }

    fn delete_project(id: ID, context: &GraphQLContext) -> FieldResult<Option<ProjectObject>> {
        let project = context.projects.delete_project(&id).map_err(to_field_error)?;

        Ok(project.map(ProjectObject))
    }

    /// Omitting `status` or `clientId` keeps the stored value
    fn update_project(
        id: ID,
        name: String,
        description: String,
        status: Option<ProjectStatusValue>,
        client_id: Option<String>,
        context: &GraphQLContext,
    ) -> FieldResult<Option<ProjectObject>> {
        let project = context
            .projects
            .update_project(
                &id,
                name,
                description,
                status.map(ProjectStatus::from),
                client_id.as_deref(),
            )
            .map_err(to_field_error)?;

        Ok(project.map(ProjectObject))
    }
}

pub type Schema = RootNode<'static, QueryRoot, MutationRoot, EmptySubscription<GraphQLContext>>;

pub fn create_schema() -> Schema {
    Schema::new(QueryRoot {}, MutationRoot {}, EmptySubscription::new())
}
