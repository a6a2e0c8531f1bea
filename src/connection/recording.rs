//! In-memory connection that records executed statements
//!
//! Backs the crate's integration tests and doubles as a dry-run driver:
//! every statement is captured with its bind values, and responses are
//! served from canned rows. The statement log is behind an `Arc` so a
//! caller can keep a handle to it after boxing the connection.

use super::{Connection, ExecResult, MetadataKind, Row};
use crate::error::{Error, Result};
use crate::value::SqlValue;
use std::sync::{Arc, Mutex};

/// Shared record of executed statements, oldest first.
pub type StatementLog = Arc<Mutex<Vec<(String, Vec<SqlValue>)>>>;

#[derive(Debug, Default)]
pub struct RecordingConnection {
    executed: StatementLog,
    /// Rows returned by every fetch call.
    pub canned_rows: Vec<Row>,
    /// Affected-row count reported by every write call.
    pub affected: u64,
    in_transaction: bool,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            canned_rows: rows,
            ..Self::default()
        }
    }

    /// Handle to the statement log; stays valid after the connection is
    /// boxed and handed to a builder.
    pub fn log(&self) -> StatementLog {
        Arc::clone(&self.executed)
    }

    /// SQL text of the most recently executed statement.
    pub fn last_sql(&self) -> Option<String> {
        self.executed
            .lock()
            .ok()
            .and_then(|log| log.last().map(|(sql, _)| sql.clone()))
    }

    /// Bind values of the most recently executed statement.
    pub fn last_values(&self) -> Option<Vec<SqlValue>> {
        self.executed
            .lock()
            .ok()
            .and_then(|log| log.last().map(|(_, values)| values.clone()))
    }

    fn record(&self, sql: &str, values: &[SqlValue]) -> Result<()> {
        self.executed
            .lock()
            .map_err(|_| Error::database("statement log lock poisoned"))?
            .push((sql.to_string(), values.to_vec()));
        Ok(())
    }
}

impl Connection for RecordingConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.record(sql, &[])?;
        Ok(self.canned_rows.clone())
    }

    fn prepare_query(&mut self, sql: &str, values: &[SqlValue]) -> Result<Vec<Row>> {
        self.record(sql, values)?;
        Ok(self.canned_rows.clone())
    }

    fn prepare_execute(&mut self, sql: &str, values: &[SqlValue]) -> Result<ExecResult> {
        self.record(sql, values)?;
        Ok(ExecResult {
            rows_affected: self.affected,
            last_insert_id: None,
        })
    }

    fn begin(&mut self) -> Result<()> {
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.in_transaction = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn metadata(&mut self, _kind: MetadataKind, _table: Option<&str>) -> Result<Option<Vec<Row>>> {
        Ok(None)
    }
}
