//! SQLite dialect
//!
//! Double-quote escaping, file-path DSN, `EXPLAIN QUERY PLAN`, native
//! RETURNING (3.35+), and a legacy batch-insert mode for engine versions
//! without multi-row VALUES syntax. Stored routines and sequences do not
//! exist on this engine and report as unsupported.

use super::Dialect;
use crate::error::{Error, Result};
use crate::value::SqlValue;

pub struct SqliteDialect {
    /// Emit `SELECT ... UNION ALL SELECT ...` batch inserts for engines
    /// predating multi-row VALUES support.
    legacy_batch: bool,
}

impl SqliteDialect {
    pub fn new() -> Self {
        Self {
            legacy_batch: false,
        }
    }

    pub fn with_legacy_batch() -> Self {
        Self { legacy_batch: true }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn escape_open(&self) -> char {
        '"'
    }

    fn escape_close(&self) -> char {
        '"'
    }

    fn is_file_based(&self) -> bool {
        true
    }

    fn random_keyword(&self) -> &'static str {
        "RANDOM()"
    }

    fn limit_syntax(&self, limit: i64, offset: Option<i64>) -> String {
        match offset {
            Some(offset) => format!(" LIMIT {} OFFSET {}", limit, offset),
            None => format!(" LIMIT {}", limit),
        }
    }

    fn explain(&self, sql: &str) -> String {
        format!("EXPLAIN QUERY PLAN {}", sql)
    }

    fn returning(&self, sql: &str, fields: &str) -> String {
        format!("{} RETURNING {}", sql, fields)
    }

    fn insert_batch(
        &self,
        table: &str,
        keys: &[String],
        rows: &[Vec<SqlValue>],
    ) -> Result<(String, Vec<SqlValue>)> {
        if keys.is_empty() || rows.is_empty() {
            return Err(Error::invalid_bind_data("no rows provided for batch insert"));
        }
        if !self.legacy_batch {
            // Modern engines take the shared multi-row VALUES shape.
            let tuple = format!("({})", vec!["?"; keys.len()].join(","));
            let sql = format!(
                "INSERT INTO {} ({}) VALUES {}",
                table,
                keys.join(", "),
                vec![tuple; rows.len()].join(",")
            );
            let values = rows.iter().flatten().cloned().collect();
            return Ok((sql, values));
        }

        let tuple = vec!["?"; keys.len()].join(",");
        let selects = vec![format!("SELECT {}", tuple); rows.len()].join(" UNION ALL ");
        let sql = format!("INSERT INTO {} ({}) {}", table, keys.join(", "), selects);
        let values = rows.iter().flatten().cloned().collect();
        Ok((sql, values))
    }

    fn table_list_sql(&self) -> Result<String> {
        Ok("SELECT name FROM sqlite_master WHERE type = 'table' \
            AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string())
    }

    fn column_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!("PRAGMA table_info({})", self.quoter().quote(table)))
    }

    fn fk_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "PRAGMA foreign_key_list({})",
            self.quoter().quote(table)
        ))
    }

    fn index_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!("PRAGMA index_list({})", self.quoter().quote(table)))
    }

    fn view_list_sql(&self) -> Result<String> {
        Ok("SELECT name FROM sqlite_master WHERE type = 'view' ORDER BY name".to_string())
    }

    fn trigger_list_sql(&self) -> Result<String> {
        Ok("SELECT name FROM sqlite_master WHERE type = 'trigger' ORDER BY name".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_query_plan() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            dialect.explain("SELECT * FROM \"t\""),
            "EXPLAIN QUERY PLAN SELECT * FROM \"t\""
        );
    }

    #[test]
    fn test_modern_batch_insert_uses_values() {
        let dialect = SqliteDialect::new();
        let keys = vec![r#""a""#.to_string(), r#""b""#.to_string()];
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::Int(2)],
            vec![SqlValue::Int(3), SqlValue::Int(4)],
        ];
        let (sql, values) = dialect.insert_batch(r#""t""#, &keys, &rows).unwrap();
        assert_eq!(sql, r#"INSERT INTO "t" ("a", "b") VALUES (?,?),(?,?)"#);
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_legacy_batch_insert_uses_union_selects() {
        let dialect = SqliteDialect::with_legacy_batch();
        let keys = vec![r#""a""#.to_string(), r#""b""#.to_string()];
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::Int(2)],
            vec![SqlValue::Int(3), SqlValue::Int(4)],
        ];
        let (sql, values) = dialect.insert_batch(r#""t""#, &keys, &rows).unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "t" ("a", "b") SELECT ?,? UNION ALL SELECT ?,?"#
        );
        assert_eq!(
            values,
            vec![
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Int(4)
            ]
        );
    }

    #[test]
    fn test_procedures_not_supported() {
        let dialect = SqliteDialect::new();
        let err = dialect.procedure_list_sql().unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_file_based() {
        assert!(SqliteDialect::new().is_file_based());
    }
}
