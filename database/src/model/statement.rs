use serde::{Deserialize, Serialize};

use crate::consts::consts::EntityId;

use super::{
    client::Client,
    project::{Project, UpdateProjectData},
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Statement {
    AddClient(Client),
    RemoveClient(EntityId),
    GetClient(EntityId),
    /// Returns every client in insertion order
    ListClients,
    AddProject(Project),
    UpdateProject(EntityId, UpdateProjectData),
    RemoveProject(EntityId),
    GetProject(EntityId),
    /// Returns every project in insertion order
    ListProjects,
}

impl Statement {
    pub fn is_query(&self) -> bool {
        !self.is_mutation()
    }

    pub fn is_mutation(&self) -> bool {
        match self {
            Statement::AddClient(_)
            | Statement::RemoveClient(_)
            | Statement::AddProject(_)
            | Statement::UpdateProject(_, _)
            | Statement::RemoveProject(_) => true,
            Statement::GetClient(_)
            | Statement::ListClients
            | Statement::GetProject(_)
            | Statement::ListProjects => false,
        }
    }
}

// Each statement maps to exactly one result variant:
//  - Add* -> Client / Project
//  - Remove*, Get*, UpdateProject -> OptionalClient / OptionalProject
//  - List* -> ClientList / ProjectList
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum StatementResult {
    Client(Client),
    OptionalClient(Option<Client>),
    ClientList(Vec<Client>),
    Project(Project),
    OptionalProject(Option<Project>),
    ProjectList(Vec<Project>),
}

impl StatementResult {
    pub fn client(self) -> Client {
        if let StatementResult::Client(c) = self {
            c
        } else {
            panic!("Statement result is not of type Client")
        }
    }

    pub fn optional_client(self) -> Option<Client> {
        if let StatementResult::OptionalClient(c) = self {
            c
        } else {
            panic!("Statement result is not of type OptionalClient")
        }
    }

    pub fn client_list(self) -> Vec<Client> {
        if let StatementResult::ClientList(l) = self {
            l
        } else {
            panic!("Statement result is not of type ClientList")
        }
    }

    pub fn project(self) -> Project {
        if let StatementResult::Project(p) = self {
            p
        } else {
            panic!("Statement result is not of type Project")
        }
    }

    pub fn optional_project(self) -> Option<Project> {
        if let StatementResult::OptionalProject(p) = self {
            p
        } else {
            panic!("Statement result is not of type OptionalProject")
        }
    }

    pub fn project_list(self) -> Vec<Project> {
        if let StatementResult::ProjectList(l) = self {
            l
        } else {
            panic!("Statement result is not of type ProjectList")
        }
    }
}
