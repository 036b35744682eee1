pub mod migrations;
pub mod registry;
pub mod schema;
pub mod schema_version;
