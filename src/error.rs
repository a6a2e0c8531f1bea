use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sqlforge
#[derive(Error, Debug)]
pub enum Error {
    #[error("No driver registered for database type '{0}'")]
    BadDriver(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Invalid bind data: {0}")]
    InvalidBindData(String),

    #[error("Feature not supported by {driver}: {feature}")]
    NotSupported { driver: String, feature: String },

    #[error("Invalid join condition: {0}")]
    InvalidJoinCondition(String),

    #[error("Missing required clause: {clause}. Add .{clause}() to your query.")]
    MissingClause { clause: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl Error {
    pub fn bad_driver(driver: impl Into<String>) -> Self {
        Self::BadDriver(driver.into())
    }

    pub fn connection_not_found(name: impl Into<String>) -> Self {
        Self::ConnectionNotFound(name.into())
    }

    pub fn invalid_bind_data(msg: impl Into<String>) -> Self {
        Self::InvalidBindData(msg.into())
    }

    pub fn not_supported(driver: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::NotSupported {
            driver: driver.into(),
            feature: feature.into(),
        }
    }

    pub fn missing_clause(clause: impl Into<String>) -> Self {
        Self::MissingClause {
            clause: clause.into(),
        }
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}
