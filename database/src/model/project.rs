use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::{consts::consts::EntityId, database::table::row::UpdateStatement};

/// Progress of a project, stored and displayed using its human readable form
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Not Started")]
    #[strum(serialize = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    #[strum(serialize = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    #[strum(serialize = "Completed")]
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Project {
    pub id: EntityId,
    pub client_id: EntityId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
}

impl Project {
    pub fn new(
        client_id: EntityId,
        name: String,
        description: String,
        status: Option<ProjectStatus>,
    ) -> Self {
        Project {
            id: EntityId::new(),
            client_id,
            name,
            description,
            status: status.unwrap_or_default(),
        }
    }

    pub fn new_test(client_id: EntityId) -> Self {
        Project::new(
            client_id,
            "Site Redesign".to_string(),
            "Revamp".to_string(),
            None,
        )
    }
}

/// Fields of a project that can change after creation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpdateProjectData {
    pub name: UpdateStatement<String>,
    pub description: UpdateStatement<String>,
    pub status: UpdateStatement<ProjectStatus>,
    pub client_id: UpdateStatement<EntityId>,
}
