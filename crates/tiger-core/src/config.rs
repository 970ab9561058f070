//! Connection and load configuration.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::sql::Identifier;

/// NAD83 geographic coordinates, the reference system TIGER/Line files ship in.
pub const DEFAULT_SOURCE_SRID: i32 = 4269;

/// NAD83(HARN) / Oregon North (ft), the default projected target.
pub const DEFAULT_TARGET_SRID: i32 = 2913;

/// Connection parameters for the target PostgreSQL database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Role to connect as
    pub user: String,
    /// Password, if the server requires one
    pub password: Option<String>,
    /// Database name
    pub dbname: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            dbname: "census".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Converts into a `tokio_postgres` configuration.
    #[must_use]
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.dbname)
            .application_name("tiger");
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }

    /// Password-free description of the target, safe to log.
    ///
    /// # Examples
    ///
    /// ```
    /// use tiger_core::config::ConnectionConfig;
    ///
    /// let conn = ConnectionConfig {
    ///     password: Some("secret".to_string()),
    ///     ..ConnectionConfig::default()
    /// };
    /// assert_eq!(conn.describe(), "postgres@localhost:5432/census");
    /// ```
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }

    /// Checks that the required parameters are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] for an empty host, user or database name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, value) in [
            ("host", &self.host),
            ("user", &self.user),
            ("dbname", &self.dbname),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    option: option.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Options for a load run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Directory holding the extracted dataset directories
    pub data_dir: PathBuf,
    /// Target schema
    pub schema: String,
    /// SRID of the shapefile geometries
    pub source_srid: i32,
    /// SRID the geometries are stored in
    pub target_srid: i32,
    /// Rows committed per transaction
    pub batch_size: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("extracted_files"),
            schema: "tiger".to_string(),
            source_srid: DEFAULT_SOURCE_SRID,
            target_srid: DEFAULT_TARGET_SRID,
            batch_size: 1000,
        }
    }
}

impl LoadConfig {
    /// Validates the options and returns the schema identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an unsafe schema name, a non-positive
    /// SRID or a zero batch size.
    pub fn validate(&self) -> Result<Identifier, ConfigError> {
        if self.source_srid <= 0 {
            return Err(invalid("source-srid", "must be a positive SRID"));
        }
        if self.target_srid <= 0 {
            return Err(invalid("target-srid", "must be a positive SRID"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch-size", "must be at least 1"));
        }
        Identifier::parse(&self.schema).map_err(|e| invalid("schema", &e.to_string()))
    }
}

fn invalid(option: &str, message: &str) -> ConfigError {
    ConfigError::InvalidOption {
        option: option.to_string(),
        message: message.to_string(),
    }
}
