pub mod client;
pub mod project;
pub mod statement;
pub mod validation;
