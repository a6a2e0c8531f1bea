//! SQL assembly from accumulated clause state
//!
//! Compilation is a pure read of the builder's state: the statement
//! skeleton first, then every clause entry verbatim in append order,
//! then GROUP BY, ORDER BY, HAVING, the dialect's limit suffix, an
//! optional RETURNING clause and finally the EXPLAIN wrapper. Compiling
//! twice without mutation yields identical SQL.

use super::QueryBuilder;
use crate::error::{Error, Result};

/// Statement families the compiler can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryBuilder {
    /// Statement skeleton for `statement` against the (already quoted)
    /// target table.
    fn compile_type(&self, statement: Statement, table: &str) -> Result<String> {
        match statement {
            Statement::Insert => {
                if self.state.set_keys.is_empty() {
                    return Err(Error::invalid_bind_data("no fields set for insert"));
                }
                Ok(format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    self.state.set_keys.join(", "),
                    vec!["?"; self.state.values.len()].join(",")
                ))
            }
            Statement::Update => {
                if self.state.set_string.is_empty() {
                    return Err(Error::invalid_bind_data("no fields set for update"));
                }
                Ok(format!(
                    "UPDATE {} SET {}",
                    table,
                    self.state.set_string.trim_end_matches(',')
                ))
            }
            Statement::Delete => Ok(format!("DELETE FROM {}", table)),
            Statement::Select => {
                if self.state.from_string.is_empty() {
                    return Err(Error::missing_clause("from"));
                }
                let select = if self.state.select_string.is_empty() {
                    "*"
                } else {
                    self.state.select_string.as_str()
                };
                Ok(format!("SELECT {} \nFROM {}", select, self.state.from_string))
            }
        }
    }

    /// Assemble the full statement text.
    pub(crate) fn compile(&self, statement: Statement, table: &str) -> Result<String> {
        let mut sql = self.compile_type(statement, table)?;

        for entry in &self.state.query_map {
            sql.push_str(&entry.conjunction);
            sql.push_str(&entry.fragment);
        }

        sql.push_str(&self.state.group_string);
        sql.push_str(&self.state.order_string);

        for entry in &self.state.having_map {
            sql.push_str(&entry.conjunction);
            sql.push_str(&entry.fragment);
        }

        if let Some(limit) = self.state.limit {
            sql.push_str(&self.dialect.limit_syntax(limit, self.state.offset));
        }

        if let Some(fields) = &self.returning_fields {
            sql = self.compile_returning(sql, fields)?;
        }

        if self.explain {
            sql = self.dialect.explain(&sql);
        }

        Ok(sql)
    }

    /// Append the RETURNING clause or fail loudly.
    ///
    /// A dialect without native RETURNING hands the statement back
    /// unchanged; silently dropping the clause would lose the caller's
    /// expected result rows, so that becomes an explicit error.
    fn compile_returning(&self, sql: String, fields: &str) -> Result<String> {
        let out = self.dialect.returning(&sql, fields);
        if out == sql {
            return Err(Error::not_supported(self.dialect.name(), "RETURNING clause"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryBuilder;
    use crate::connection::RecordingConnection;
    use crate::dialects::{MySqlDialect, PostgresDialect, SqliteDialect};

    fn builder() -> QueryBuilder {
        QueryBuilder::new(
            Box::new(RecordingConnection::new()),
            Box::new(PostgresDialect::new()),
        )
    }

    #[test]
    fn test_fresh_select_skeleton() {
        let mut qb = builder();
        qb.from("users");
        let sql = qb.compile(Statement::Select, "").unwrap();
        assert_eq!(sql, "SELECT * \nFROM \"users\"");
    }

    #[test]
    fn test_select_without_from_is_missing_clause() {
        let qb = builder();
        let err = qb.compile(Statement::Select, "").unwrap_err();
        assert!(matches!(err, Error::MissingClause { .. }));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut qb = builder();
        qb.from("users").where_("id", 1).order_by("name", "ASC");
        let first = qb.compile(Statement::Select, "").unwrap();
        let second = qb.compile(Statement::Select, "").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clause_order_group_order_having_limit() {
        let mut qb = builder();
        qb.from("orders")
            .where_("status", "open")
            .group_by("region")
            .order_by("region", "ASC")
            .having("COUNT(id) >", 5)
            .limit(10)
            .offset(20);
        let sql = qb.compile(Statement::Select, "").unwrap();
        let where_pos = sql.find("WHERE").unwrap();
        let group_pos = sql.find("GROUP BY").unwrap();
        let order_pos = sql.find("ORDER BY").unwrap();
        let having_pos = sql.find("HAVING").unwrap();
        let limit_pos = sql.find("LIMIT").unwrap();
        assert!(where_pos < group_pos);
        assert!(group_pos < order_pos);
        assert!(order_pos < having_pos);
        assert!(having_pos < limit_pos);
        assert!(sql.ends_with(" LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_returning_appends_on_postgres() {
        let mut qb = builder();
        qb.set("name", "a").returning("id");
        let sql = qb.compile(Statement::Insert, "\"users\"").unwrap();
        assert!(sql.ends_with("RETURNING \"id\""));
    }

    #[test]
    fn test_returning_unsupported_on_mysql() {
        let mut qb = QueryBuilder::new(
            Box::new(RecordingConnection::new()),
            Box::new(MySqlDialect::new()),
        );
        qb.set("name", "a").returning("id");
        let err = qb.compile(Statement::Insert, "`users`").unwrap_err();
        assert!(matches!(err, Error::NotSupported { .. }));
    }

    #[test]
    fn test_explain_wraps_select() {
        let mut qb = QueryBuilder::new(
            Box::new(RecordingConnection::new()),
            Box::new(SqliteDialect::new()),
        );
        qb.from("users").where_("id", 1).explain();
        let sql = qb.compile(Statement::Select, "").unwrap();
        assert!(sql.starts_with("EXPLAIN QUERY PLAN SELECT"));
    }

    #[test]
    fn test_update_trims_trailing_comma() {
        let mut qb = builder();
        qb.set("a", 1).set("b", 2).where_("id", 3);
        let sql = qb.compile(Statement::Update, "\"t\"").unwrap();
        assert!(sql.starts_with("UPDATE \"t\" SET \"a\"=?,\"b\"=?\nWHERE"));
    }

    #[test]
    fn test_insert_skeleton() {
        let mut qb = builder();
        qb.set("a", 1).set("b", "x");
        let sql = qb.compile(Statement::Insert, "\"t\"").unwrap();
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?,?)");
    }

    #[test]
    fn test_insert_without_set_rejected() {
        let qb = builder();
        let err = qb.compile(Statement::Insert, "\"t\"").unwrap_err();
        assert!(matches!(err, Error::InvalidBindData(_)));
    }
}
