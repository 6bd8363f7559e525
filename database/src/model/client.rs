use serde::{Deserialize, Serialize};

use crate::consts::consts::EntityId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Client {
    pub id: EntityId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Client {
    pub fn new(name: String, email: Option<String>, phone: Option<String>) -> Self {
        Client {
            id: EntityId::new(),
            name,
            email,
            phone,
        }
    }

    pub fn new_test() -> Self {
        Client::new(
            "Acme".to_string(),
            Some("a@acme.com".to_string()),
            Some("555".to_string()),
        )
    }
}
