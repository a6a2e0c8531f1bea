//! PostgreSQL dialect
//!
//! Double-quote escaping, `LIMIT n OFFSET m`, `RANDOM()` ordering, native
//! RETURNING, and the richest introspection surface of the three engines.

use super::Dialect;
use crate::error::Result;

pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn escape_open(&self) -> char {
        '"'
    }

    fn escape_close(&self) -> char {
        '"'
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

    fn returning(&self, sql: &str, fields: &str) -> String {
        format!("{} RETURNING {}", sql, fields)
    }

    fn table_list_sql(&self) -> Result<String> {
        Ok("SELECT table_name FROM information_schema.tables \
            WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
            ORDER BY table_name"
            .to_string())
    }

    fn column_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = '{}' \
             ORDER BY ordinal_position",
            table.replace('\'', "''")
        ))
    }

    fn fk_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT tc.constraint_name, kcu.column_name, \
             ccu.table_name AS foreign_table_name, \
             ccu.column_name AS foreign_column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_name = kcu.constraint_name \
             JOIN information_schema.constraint_column_usage ccu \
             ON ccu.constraint_name = tc.constraint_name \
             WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_name = '{}'",
            table.replace('\'', "''")
        ))
    }

    fn index_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT indexname, indexdef FROM pg_indexes WHERE tablename = '{}'",
            table.replace('\'', "''")
        ))
    }

    fn view_list_sql(&self) -> Result<String> {
        Ok("SELECT table_name FROM information_schema.views \
            WHERE table_schema = 'public' ORDER BY table_name"
            .to_string())
    }

    fn trigger_list_sql(&self) -> Result<String> {
        Ok("SELECT trigger_name, event_manipulation, event_object_table \
            FROM information_schema.triggers ORDER BY trigger_name"
            .to_string())
    }

    fn type_list_sql(&self) -> Result<String> {
        Ok("SELECT typname FROM pg_type t \
            JOIN pg_namespace n ON n.oid = t.typnamespace \
            WHERE n.nspname = 'public' ORDER BY typname"
            .to_string())
    }

    fn sequence_list_sql(&self) -> Result<String> {
        Ok("SELECT sequence_name FROM information_schema.sequences \
            WHERE sequence_schema = 'public' ORDER BY sequence_name"
            .to_string())
    }

    fn function_list_sql(&self) -> Result<String> {
        Ok("SELECT routine_name FROM information_schema.routines \
            WHERE routine_schema = 'public' AND routine_type = 'FUNCTION' \
            ORDER BY routine_name"
            .to_string())
    }

    fn procedure_list_sql(&self) -> Result<String> {
        Ok("SELECT routine_name FROM information_schema.routines \
            WHERE routine_schema = 'public' AND routine_type = 'PROCEDURE' \
            ORDER BY routine_name"
            .to_string())
    }
}
