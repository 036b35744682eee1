use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaxmiError {
    #[error("_schema table is not initialized")]
    SchemaNotInitialized,

    #[error("{}", .errors.join(", "))]
    InvalidProfileName { errors: Vec<String> },

    #[error("Profile with name '{name}' already exists.")]
    ProfileAlreadyExists { name: String },

    #[error("Profile with name '{name}' does not exist.")]
    ProfileNotFound { name: String },

    #[error("Invalid migration filename format: {name}")]
    MalformedMigrationName { name: String },

    #[error("Migration {name} is malformed: {reason}")]
    MalformedMigrationContract { name: String, reason: String },

    #[error("Migrations {first} and {second} both claim version {version}")]
    DuplicateMigrationVersion {
        version: u32,
        first: String,
        second: String,
    },

    #[error("Migration {version} ({name}) failed: {source}")]
    MigrationFailed {
        version: u32,
        name: String,
        #[source]
        source: Box<LaxmiError>,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LaxmiError>;

// Conversion to String for the UI-facing command results
impl From<LaxmiError> for String {
    fn from(error: LaxmiError) -> Self {
        error.to_string()
    }
}
