pub mod row;
pub mod table;
pub mod tables;
