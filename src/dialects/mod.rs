//! Database dialect implementations
//!
//! Each engine's SQL syntax variations live behind the [`Dialect`] trait:
//! identifier escape characters, limit/offset syntax, random ordering,
//! EXPLAIN wrapping, RETURNING support, batch statement shapes and the
//! introspection query templates. A dialect is stateless; a missing
//! capability signals [`Error::NotSupported`], never silently wrong SQL.

use crate::error::{Error, Result};
use crate::quote::IdentifierQuoter;
use crate::value::SqlValue;
use indexmap::IndexMap;

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Trait for database-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Normalized driver key for this dialect (`mysql`, `pgsql`, `sqlite`).
    fn name(&self) -> &'static str;

    /// Opening identifier escape character.
    fn escape_open(&self) -> char;

    /// Closing identifier escape character.
    fn escape_close(&self) -> char;

    /// Identifier quoter configured with this dialect's escape characters.
    fn quoter(&self) -> IdentifierQuoter {
        IdentifierQuoter::new(self.escape_open(), self.escape_close())
    }

    /// Whether the DSN for this dialect is a bare file path.
    fn is_file_based(&self) -> bool {
        false
    }

    /// Keyword used for random ordering.
    fn random_keyword(&self) -> &'static str;

    /// Dialect-specific LIMIT/OFFSET suffix, leading space included.
    fn limit_syntax(&self, limit: i64, offset: Option<i64>) -> String;

    /// Wrap a statement for the engine's query-plan output.
    fn explain(&self, sql: &str) -> String {
        format!("EXPLAIN {}", sql)
    }

    /// Append a RETURNING clause.
    ///
    /// Returning the input unchanged is the contract signal that the
    /// engine has no native RETURNING support; the compiler turns that
    /// into an explicit error.
    fn returning(&self, sql: &str, _fields: &str) -> String {
        sql.to_string()
    }

    /// One multi-row INSERT statement; bind values flattened row-major.
    fn insert_batch(
        &self,
        table: &str,
        keys: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<(String, Vec<SqlValue>)> {
        if keys.is_empty() || rows.is_empty() {
            return Err(Error::invalid_bind_data("no rows provided for batch insert"));
        }
        let tuple = format!("({})", vec!["?"; keys.len()].join(","));
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            keys.join(", "),
            vec![tuple; rows.len()].join(",")
        );
        let values = rows.iter().flatten().cloned().collect();
        Ok((sql, values))
    }

    /// One CASE-WHEN batch UPDATE keyed on `key`.
    ///
    /// Produces one `col = CASE WHEN key=? THEN ? ... ELSE col END` block
    /// per non-key column with one WHEN pair per row, closed by
    /// `WHERE key IN (...)`.
    fn update_batch(
        &self,
        table: &str,
        key: &str,
        rows: &[IndexMap<String, SqlValue>],
    ) -> Result<(String, Vec<SqlValue>)> {
        if rows.is_empty() {
            return Err(Error::invalid_bind_data("no rows provided for batch update"));
        }
        let quoter = self.quoter();
        let quoted_key = quoter.quote(key);

        let mut key_values = Vec::with_capacity(rows.len());
        for row in rows {
            match row.get(key) {
                Some(v) => key_values.push(v.clone()),
                None => {
                    return Err(Error::invalid_bind_data(format!(
                        "batch update row is missing key field '{}'",
                        key
                    )))
                }
            }
        }

        let columns: Vec<&String> = rows[0].keys().filter(|k| k.as_str() != key).collect();
        if columns.is_empty() {
            return Err(Error::invalid_bind_data(
                "batch update rows carry no non-key fields",
            ));
        }

        let mut values = Vec::new();
        let mut set_blocks = Vec::with_capacity(columns.len());
        for column in &columns {
            let quoted_col = quoter.quote(column);
            let mut block = format!("{} = CASE", quoted_col);
            for (row, key_value) in rows.iter().zip(&key_values) {
                let cell = row.get(column.as_str()).cloned().ok_or_else(|| {
                    Error::invalid_bind_data(format!(
                        "batch update row is missing field '{}'",
                        column
                    ))
                })?;
                block.push_str(&format!(" WHEN {} = ? THEN ?", quoted_key));
                values.push(key_value.clone());
                values.push(cell);
            }
            block.push_str(&format!(" ELSE {} END", quoted_col));
            set_blocks.push(block);
        }

        let placeholders = vec!["?"; rows.len()].join(",");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} IN ({})",
            table,
            set_blocks.join(", "),
            quoted_key,
            placeholders
        );
        values.extend(key_values);
        Ok((sql, values))
    }

    // Introspection query templates. Engines without a capability return
    // an explicit error instead of made-up SQL.

    fn table_list_sql(&self) -> Result<String>;
    fn column_list_sql(&self, table: &str) -> Result<String>;
    fn fk_list_sql(&self, table: &str) -> Result<String>;
    fn index_list_sql(&self, table: &str) -> Result<String>;
    fn view_list_sql(&self) -> Result<String>;
    fn trigger_list_sql(&self) -> Result<String>;

    fn type_list_sql(&self) -> Result<String> {
        Err(Error::not_supported(self.name(), "type listing"))
    }

    fn sequence_list_sql(&self) -> Result<String> {
        Err(Error::not_supported(self.name(), "sequence listing"))
    }

    fn function_list_sql(&self) -> Result<String> {
        Err(Error::not_supported(self.name(), "function listing"))
    }

    fn procedure_list_sql(&self) -> Result<String> {
        Err(Error::not_supported(self.name(), "procedure listing"))
    }
}

/// Factory mapping a normalized driver key to a dialect implementation,
/// resolved once at connect time.
pub fn create_dialect(kind: &str) -> Option<Box<dyn Dialect>> {
    match kind {
        "mysql" => Some(Box::new(MySqlDialect::new())),
        "pgsql" => Some(Box::new(PostgresDialect::new())),
        "sqlite" => Some(Box::new(SqliteDialect::new())),
        _ => None,
    }
}
