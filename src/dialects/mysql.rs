//! MySQL/MariaDB dialect
//!
//! Backtick escaping, comma LIMIT syntax, `RAND()` ordering, no native
//! RETURNING clause.

use super::Dialect;
use crate::error::Result;

pub struct MySqlDialect;

impl MySqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn escape_open(&self) -> char {
        '`'
    }

    fn escape_close(&self) -> char {
        '`'
    }

    fn random_keyword(&self) -> &'static str {
        "RAND()"
    }

    fn limit_syntax(&self, limit: i64, offset: Option<i64>) -> String {
        match offset {
            Some(offset) => format!(" LIMIT {}, {}", offset, limit),
            None => format!(" LIMIT {}", limit),
        }
    }

    // Inherits the default `returning`: the SQL comes back unchanged,
    // which the compiler reports as an unsupported capability.

    fn table_list_sql(&self) -> Result<String> {
        Ok("SHOW TABLES".to_string())
    }

    fn column_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!("SHOW COLUMNS FROM {}", self.quoter().quote(table)))
    }

    fn fk_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "SELECT CONSTRAINT_NAME, COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = '{}' \
             AND REFERENCED_TABLE_NAME IS NOT NULL",
            table.replace('\'', "''")
        ))
    }

    fn index_list_sql(&self, table: &str) -> Result<String> {
        Ok(format!("SHOW INDEX FROM {}", self.quoter().quote(table)))
    }

    fn view_list_sql(&self) -> Result<String> {
        Ok("SHOW FULL TABLES WHERE Table_type = 'VIEW'".to_string())
    }

    fn trigger_list_sql(&self) -> Result<String> {
        Ok("SHOW TRIGGERS".to_string())
    }

    fn function_list_sql(&self) -> Result<String> {
        Ok("SHOW FUNCTION STATUS WHERE Db = DATABASE()".to_string())
    }

    fn procedure_list_sql(&self) -> Result<String> {
        Ok("SHOW PROCEDURE STATUS WHERE Db = DATABASE()".to_string())
    }
}
