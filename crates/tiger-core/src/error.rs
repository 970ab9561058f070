//! Custom error types for TIGER load operations.
//!
//! This module provides structured error handling using `thiserror`. Each stage of the
//! load pipeline (discovery, schema inference, feature loading, database access) owns an
//! error enum, and [`TigerError`] ties them together so callers can decide whether an
//! error aborts a single table group or the whole run.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed source error used where the underlying library error type varies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for TIGER load operations.
///
/// This is the root error type that encompasses all domain-specific errors.
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum TigerError {
    /// Dataset directory classification errors
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Schema inference errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Feature streaming and insert errors
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Database connection and statement errors
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while classifying dataset directories.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A directory could not be listed
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        /// The directory being listed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The geography token of a dataset directory has no table mapping
    #[error("Unknown geography type '{code}' in '{path}'")]
    UnknownGeographyType {
        /// The dataset directory
        path: PathBuf,
        /// The raw Census geography code
        code: String,
    },

    /// A dataset directory contains no `.shp` file
    #[error("No shapefile found in '{path}'")]
    MissingShapefile {
        /// The dataset directory
        path: PathBuf,
    },
}

/// Errors raised while inferring a table schema from a template shapefile.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The shapefile or its attribute table could not be opened
    #[error("Failed to open shapefile '{path}': {source}")]
    Open {
        /// The shapefile path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: BoxError,
    },

    /// A field's declared type has no SQL mapping
    #[error("Field '{field}' in '{path}' has unsupported type {field_type}")]
    UnsupportedFieldType {
        /// The shapefile path
        path: PathBuf,
        /// The field name as declared in the shapefile
        field: String,
        /// The declared field type
        field_type: String,
    },

    /// A table, schema or column name is not a safe SQL identifier
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Two fields collapse onto the same column name
    #[error("Column '{column}' appears more than once in '{path}'")]
    DuplicateColumn {
        /// The shapefile path
        path: PathBuf,
        /// The duplicated column name
        column: String,
    },
}

/// Errors raised while streaming features into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A feature could not be read or converted
    #[error("Failed to read feature {feature_index} of '{path}': {message}")]
    FeatureRead {
        /// The shapefile path
        path: PathBuf,
        /// Zero-based feature index within the shapefile
        feature_index: usize,
        /// Description of the problem
        message: String,
    },

    /// The database rejected a feature
    #[error("Failed to insert feature {feature_index} of '{path}': {source}")]
    FeatureInsert {
        /// The shapefile path
        path: PathBuf,
        /// Zero-based feature index within the shapefile
        feature_index: usize,
        /// The underlying error
        #[source]
        source: BoxError,
    },

    /// A group member lacks a field present in the group's template shapefile
    #[error("Field '{field}' is missing from '{path}'")]
    MissingField {
        /// The shapefile path
        path: PathBuf,
        /// The missing field name
        field: String,
    },

    /// An attribute value does not fit its column type
    #[error("Field '{field}' of feature {feature_index} in '{path}': expected {expected}, found {found}")]
    ValueMismatch {
        /// The shapefile path
        path: PathBuf,
        /// Zero-based feature index within the shapefile
        feature_index: usize,
        /// The field name
        field: String,
        /// Expected column type
        expected: String,
        /// Value type found
        found: String,
    },
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Could not connect to the database
    #[error("Failed to connect to {target}: {source}")]
    Connection {
        /// Password-free description of the connection target
        target: String,
        /// The underlying error
        #[source]
        source: BoxError,
    },

    /// A statement failed
    #[error("Statement failed ({statement}): {source}")]
    Statement {
        /// The statement, or a short label for it
        statement: String,
        /// The underlying error
        #[source]
        source: BoxError,
    },
}

/// Configuration errors.
///
/// These errors occur when options or configuration are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },
}

/// Type alias for Results using `TigerError`.
pub type Result<T> = std::result::Result<T, TigerError>;

impl TigerError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Discovery(e) => format!("Discovery error: {e}"),
            Self::Schema(e) => format!("Schema error: {e}"),
            Self::Load(e) => format!("Load error: {e}"),
            Self::Database(e) => format!("Database error: {e}"),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Discovery(DiscoveryError::UnknownGeographyType { .. }) => Some(
                "Run 'tiger geographies' to see the geography codes that map to tables."
                    .to_string(),
            ),
            Self::Schema(SchemaError::UnsupportedFieldType { .. }) => {
                Some("Only String and Real attribute fields can be loaded.".to_string())
            },
            Self::Database(DatabaseError::Connection { .. }) => Some(
                "Check the host, port, user and password, and that the database exists."
                    .to_string(),
            ),
            Self::Config(_) => Some("Run 'tiger load --help' for valid options.".to_string()),
            _ => None,
        }
    }

    /// Returns `true` if the error aborts only the table group being loaded.
    ///
    /// Connection and configuration errors end the whole run; everything raised
    /// while inferring or loading a single group leaves the other groups untouched.
    #[must_use]
    pub fn is_group_fatal(&self) -> bool {
        match self {
            Self::Discovery(_) | Self::Schema(_) | Self::Load(_) => true,
            Self::Database(DatabaseError::Statement { .. }) => true,
            Self::Database(DatabaseError::Connection { .. }) | Self::Config(_) | Self::Other(_) => {
                false
            },
        }
    }
}

/// Extension trait for attaching a statement label to database errors.
pub trait DatabaseErrorExt<T> {
    /// Wrap the error as a [`DatabaseError::Statement`].
    ///
    /// # Errors
    ///
    /// Returns a [`DatabaseError::Statement`] if the underlying operation fails.
    fn with_statement(self, statement: &str) -> Result<T>;
}

impl<T, E> DatabaseErrorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_statement(self, statement: &str) -> Result<T> {
        self.map_err(|e| {
            TigerError::Database(DatabaseError::Statement {
                statement: statement.to_string(),
                source: Box::new(e),
            })
        })
    }
}
