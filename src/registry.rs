//! Driver and connection registry
//!
//! An explicitly constructed, shareable registry replaces any notion of
//! a process-wide singleton: callers build one, register drivers, and
//! pass it (or an `Arc` of it) wherever connections are opened. Both
//! maps are concurrent, so `connect()`/`get()` are safe from multiple
//! threads.

use crate::builder::QueryBuilder;
use crate::connection::Connection;
use crate::dialects::Dialect;
use crate::error::{Error, Result};
use crate::params::{ConnectionParams, ParsedParams};
use dashmap::DashMap;
use log::debug;
use std::sync::{Arc, Mutex, RwLock};

/// Fields never emitted into the DSN as `key=value` pairs.
const DSN_SKIP_FIELDS: &[&str] = &[
    "name", "pass", "user", "type", "prefix", "options", "database", "alias",
];

/// Opens connections for one engine family.
pub trait Driver: Send + Sync {
    /// Fresh dialect instance for builders on this driver.
    fn dialect(&self) -> Box<dyn Dialect>;

    /// Open a connection from parsed parameters.
    fn connect(&self, parsed: &ParsedParams) -> Result<Box<dyn Connection>>;
}

/// Maps driver keys to [`Driver`] implementations and aliases to live
/// query builders.
#[derive(Default)]
pub struct ConnectionRegistry {
    drivers: DashMap<String, Arc<dyn Driver>>,
    connections: DashMap<String, Arc<Mutex<QueryBuilder>>>,
    /// Registration order; the last entry answers unnamed lookups.
    order: RwLock<Vec<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its normalized key.
    pub fn register_driver(&self, key: impl Into<String>, driver: Arc<dyn Driver>) {
        self.drivers.insert(key.into().to_lowercase(), driver);
    }

    /// Registered connection keys in registration order.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.order_read()?.clone())
    }

    /// Normalize the driver key, verify a driver exists and build the DSN.
    ///
    /// File-based engines get a bare file path; everything else gets
    /// `{type}:` followed by `;`-joined `key=value` pairs with the
    /// database emitted first as `dbname=`.
    pub fn parse_params(&self, params: &ConnectionParams) -> Result<ParsedParams> {
        let mut driver = params.driver.to_lowercase();
        if driver == "postgresql" {
            driver = "pgsql".to_string();
        }
        let entry = self
            .drivers
            .get(&driver)
            .ok_or_else(|| Error::bad_driver(&driver))?;

        let dsn = if entry.dialect().is_file_based() {
            params
                .file
                .clone()
                .or_else(|| params.database.clone())
                .unwrap_or_default()
        } else {
            let mut pairs = Vec::new();
            if let Some(database) = &params.database {
                pairs.push(format!("dbname={}", database));
            }
            if let Some(host) = &params.host {
                pairs.push(format!("host={}", host));
            }
            for (key, value) in &params.extra {
                if DSN_SKIP_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                pairs.push(format!("{}={}", key, value));
            }
            format!("{}:{}", driver, pairs.join(";"))
        };

        Ok(ParsedParams {
            dsn,
            driver,
            options: params.options.clone(),
            params: params.clone(),
        })
    }

    /// Open a connection, wrap it in a builder and register it.
    ///
    /// The registry key is `alias` if present, then `name`, then the
    /// positional registration index.
    pub fn connect(&self, params: &ConnectionParams) -> Result<Arc<Mutex<QueryBuilder>>> {
        let parsed = self.parse_params(params)?;
        let driver = self
            .drivers
            .get(&parsed.driver)
            .ok_or_else(|| Error::bad_driver(&parsed.driver))?
            .clone();

        let conn = driver.connect(&parsed)?;
        let mut builder = QueryBuilder::new(conn, driver.dialect());
        if let Some(prefix) = &params.prefix {
            builder = builder.with_prefix(prefix.clone());
        }

        let mut order = self.order_write()?;
        let key = params
            .alias
            .clone()
            .or_else(|| params.name.clone())
            .unwrap_or_else(|| order.len().to_string());
        debug!("Registering connection '{}' ({})", key, parsed.driver);

        let builder = Arc::new(Mutex::new(builder));
        self.connections.insert(key.clone(), Arc::clone(&builder));
        order.retain(|existing| existing != &key);
        order.push(key);
        Ok(builder)
    }

    /// Look up a connection by key, or the most recently registered one
    /// when no key is given.
    pub fn get(&self, name: Option<&str>) -> Result<Arc<Mutex<QueryBuilder>>> {
        match name {
            Some(name) => self
                .connections
                .get(name)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| Error::connection_not_found(name)),
            None => {
                let order = self.order_read()?;
                let last = order
                    .last()
                    .ok_or_else(|| Error::connection_not_found("registry is empty"))?;
                self.connections
                    .get(last)
                    .map(|entry| Arc::clone(entry.value()))
                    .ok_or_else(|| Error::connection_not_found(last.clone()))
            }
        }
    }

    fn order_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<String>>> {
        self.order
            .read()
            .map_err(|_| Error::database("connection registry lock poisoned"))
    }

    fn order_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<String>>> {
        self.order
            .write()
            .map_err(|_| Error::database("connection registry lock poisoned"))
    }
}
