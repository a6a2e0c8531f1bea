//! Connection parameter bag and its parsed form
//!
//! Parameters usually arrive from configuration, so the bag derives
//! serde and tolerates unknown fields: anything outside the named set
//! is collected into `extra` and propagated into the DSN as `key=value`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Generic connection parameters, engine-agnostic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Engine type, case-insensitive (`mysql`, `pgsql`, `postgresql`,
    /// `sqlite`).
    #[serde(rename = "type")]
    pub driver: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Data file path for file-based engines.
    #[serde(default)]
    pub file: Option<String>,
    /// Table prefix applied by the builder to every table name.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Registry key for this connection.
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Driver-specific options passed through to the connector.
    #[serde(default)]
    pub options: IndexMap<String, String>,
    /// Unrecognized fields; each becomes a `key=value` DSN pair.
    #[serde(flatten)]
    pub extra: IndexMap<String, String>,
}

impl ConnectionParams {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }
}

/// Validated output of DSN parsing: the connection string, the
/// normalized driver key, the driver options and the original bag.
#[derive(Debug, Clone)]
pub struct ParsedParams {
    pub dsn: String,
    pub driver: String,
    pub options: IndexMap<String, String>,
    pub params: ConnectionParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_with_extras() {
        let json = r#"{
            "type": "PgSQL",
            "host": "localhost",
            "database": "app",
            "port": "5432",
            "sslmode": "require"
        }"#;
        let params: ConnectionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.driver, "PgSQL");
        assert_eq!(params.host.as_deref(), Some("localhost"));
        assert_eq!(params.extra.get("port").map(String::as_str), Some("5432"));
        assert_eq!(
            params.extra.get("sslmode").map(String::as_str),
            Some("require")
        );
    }

    #[test]
    fn test_defaults_leave_optionals_empty() {
        let params = ConnectionParams::new("sqlite");
        assert!(params.host.is_none());
        assert!(params.extra.is_empty());
        assert!(params.options.is_empty());
    }
}
