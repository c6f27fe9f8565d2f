//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Remote catalog error: {0}")]
    RemoteCatalog(String),

    #[error("Local library error: {0}")]
    LocalLibrary(String),

    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteCatalog(msg.into())
    }

    pub fn local(msg: impl Into<String>) -> Self {
        Self::LocalLibrary(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("TrackedSeries", "item-1");
        assert_eq!(
            err.to_string(),
            "Entity not found: TrackedSeries with id item-1"
        );
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(Error::remote("timeout"), Error::RemoteCatalog(m) if m == "timeout"));
        assert!(matches!(Error::local("gone"), Error::LocalLibrary(m) if m == "gone"));
        assert!(matches!(Error::config("bad"), Error::Configuration(_)));
    }
}
