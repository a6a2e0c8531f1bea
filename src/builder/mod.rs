//! Chainable query builder
//!
//! A [`QueryBuilder`] owns one [`Connection`] and one [`Dialect`].
//! Clause methods mutate accumulated [`QueryState`] and return
//! `&mut Self` for chaining; terminal methods compile the statement,
//! execute it through the connection with positional binds, then reset
//! the state so the builder is immediately reusable.

use crate::connection::{Connection, MetadataKind, Row};
use crate::dialects::Dialect;
use crate::error::{Error, Result};
use crate::join::JoinConditionParser;
use crate::quote::IdentifierQuoter;
use crate::state::{ClauseEntry, ClauseKind, QueryState};
use crate::value::SqlValue;
use indexmap::IndexMap;
use log::debug;
use std::fmt;

mod compile;
mod conditions;

pub(crate) use compile::Statement;

/// Placement of `%` wildcards around a LIKE match value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMatch {
    /// `%value`
    Before,
    /// `value%`
    After,
    /// `%value%`
    Both,
}

/// A compiled statement: SQL text with `?` placeholders plus the bind
/// values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

pub struct QueryBuilder {
    conn: Box<dyn Connection>,
    dialect: Box<dyn Dialect>,
    quoter: IdentifierQuoter,
    prefix: String,
    state: QueryState,
    explain: bool,
    returning_fields: Option<String>,
}

impl fmt::Debug for QueryBuilder {
    // The connection and dialect are trait objects, so deriving is not an
    // option; summarize them by dialect name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect.name())
            .field("prefix", &self.prefix)
            .field("state", &self.state)
            .field("explain", &self.explain)
            .field("returning_fields", &self.returning_fields)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    pub fn new(conn: Box<dyn Connection>, dialect: Box<dyn Dialect>) -> Self {
        let quoter = dialect.quoter();
        Self {
            conn,
            dialect,
            quoter,
            prefix: String::new(),
            state: QueryState::new(),
            explain: false,
            returning_fields: None,
        }
    }

    /// Table prefix inserted into the final segment of every table name.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Quote and prefix a table name for this connection.
    pub fn resolve_table(&self, table: &str) -> String {
        self.quoter.quote_table(table, &self.prefix)
    }

    // --- chainable clause methods ---

    /// Add fields to the SELECT list. Comma-separated lists and function
    /// calls are quoted per identifier segment.
    pub fn select(&mut self, fields: &str) -> &mut Self {
        let quoted = self.quoter.quote(fields);
        if self.state.select_string.is_empty() {
            self.state.select_string = quoted;
        } else {
            self.state.select_string.push_str(", ");
            self.state.select_string.push_str(&quoted);
        }
        self
    }

    /// Add a table to the FROM list.
    pub fn from(&mut self, table: &str) -> &mut Self {
        let quoted = self.resolve_table(table);
        if self.state.from_string.is_empty() {
            self.state.from_string = quoted;
        } else {
            self.state.from_string.push_str(", ");
            self.state.from_string.push_str(&quoted);
        }
        self
    }

    /// Add a JOIN clause. The ON condition is tokenized and its
    /// identifiers quoted; a condition with non-whitespace characters
    /// outside the recognized token grammar is rejected.
    pub fn join(&mut self, table: &str, condition: &str, join_type: &str) -> Result<&mut Self> {
        let compiled = JoinConditionParser::compile(condition, &self.quoter)?;
        let quoted_table = self.resolve_table(table);
        let conjunction = if join_type.trim().is_empty() {
            "\nJOIN ".to_string()
        } else {
            format!("\n{} JOIN ", join_type.trim().to_uppercase())
        };
        self.state.query_map.push(ClauseEntry {
            kind: ClauseKind::Join,
            conjunction,
            fragment: format!("{} ON {}", quoted_table, compiled),
        });
        Ok(self)
    }

    /// Add an ORDER BY field. Direction `RANDOM` emits the dialect's
    /// random-ordering keyword; anything other than ASC/DESC is treated
    /// as no direction.
    pub fn order_by(&mut self, field: &str, direction: &str) -> &mut Self {
        let dir = direction.trim().to_uppercase();
        let dir = match dir.as_str() {
            "ASC" | "DESC" | "RANDOM" => dir,
            _ => String::new(),
        };
        let quoted = self.quoter.quote(field);
        self.state.order_fields.insert(quoted, dir);
        self.rebuild_order_string();
        self
    }

    /// Add a GROUP BY field.
    pub fn group_by(&mut self, field: &str) -> &mut Self {
        let quoted = self.quoter.quote(field);
        self.state.group_fields.push(quoted);
        self.state.group_string = format!("\nGROUP BY {}", self.state.group_fields.join(", "));
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.state.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    /// Stage one column/value pair for INSERT or UPDATE.
    pub fn set<V: Into<SqlValue>>(&mut self, key: &str, value: V) -> &mut Self {
        let quoted = self.quoter.quote(key);
        self.state.values.push(value.into());
        self.state.set_keys.push(quoted.clone());
        self.state.set_string.push_str(&quoted);
        self.state.set_string.push_str("=?,");
        self
    }

    /// Stage multiple column/value pairs in iteration order.
    pub fn set_many<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        K: AsRef<str>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.set(key.as_ref(), value);
        }
        self
    }

    /// Request a RETURNING clause on the next write statement.
    pub fn returning(&mut self, fields: &str) -> &mut Self {
        self.returning_fields = Some(self.quoter.quote(fields));
        self
    }

    /// Wrap the next statement in the dialect's query-plan form.
    pub fn explain(&mut self) -> &mut Self {
        self.explain = true;
        self
    }

    /// Discard all accumulated state. The builder then compiles
    /// byte-identical SQL to a freshly constructed one.
    pub fn reset_query(&mut self) {
        self.state = QueryState::new();
        self.explain = false;
        self.returning_fields = None;
    }

    fn rebuild_order_string(&mut self) {
        let fragments: Vec<String> = self
            .state
            .order_fields
            .iter()
            .map(|(field, dir)| match dir.as_str() {
                "RANDOM" => self.dialect.random_keyword().to_string(),
                "" => field.clone(),
                _ => format!("{} {}", field, dir),
            })
            .collect();
        self.state.order_string = format!("\nORDER BY {}", fragments.join(", "));
    }

    // --- terminal methods ---

    /// Execute raw SQL, bypassing the builder state entirely.
    pub fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!("Executing query: {}", sql);
        self.conn.query(sql)
    }

    /// Compile and run the accumulated SELECT, then reset.
    pub fn get(&mut self, table: Option<&str>) -> Result<Vec<Row>> {
        if let Some(table) = table {
            self.from(table);
        }
        let sql = self.compile(Statement::Select, "")?;
        let values = self.state.where_values.clone();
        debug!("Executing query: {}", sql);
        let rows = self.conn.prepare_query(&sql, &values)?;
        self.reset_query();
        Ok(rows)
    }

    /// Shorthand: add WHERE pairs and an optional limit, then [`get`](Self::get).
    pub fn get_where<K, V, I>(&mut self, table: Option<&str>, pairs: I, limit: Option<i64>) -> Result<Vec<Row>>
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.where_many(pairs);
        if let Some(limit) = limit {
            self.limit(limit);
        }
        self.get(table)
    }

    /// Compile and run an INSERT from staged or supplied pairs, then reset.
    pub fn insert<K, V, I>(&mut self, table: &str, data: I) -> Result<u64>
    where
        K: AsRef<str>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set_many(data);
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Insert, &table)?;
        let values = self.state.values.clone();
        self.execute_write(&sql, &values)
    }

    /// Compile and run an UPDATE from staged or supplied pairs, then reset.
    pub fn update<K, V, I>(&mut self, table: &str, data: I) -> Result<u64>
    where
        K: AsRef<str>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set_many(data);
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Update, &table)?;
        let values = self.state.bind_values();
        self.execute_write(&sql, &values)
    }

    /// Compile and run a DELETE against the accumulated WHERE clauses,
    /// then reset.
    pub fn delete(&mut self, table: &str) -> Result<u64> {
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Delete, &table)?;
        let values = self.state.where_values.clone();
        self.execute_write(&sql, &values)
    }

    /// Insert many rows in one statement. Column set is taken from the
    /// first row; every row must carry the same fields.
    pub fn insert_batch(&mut self, table: &str, rows: &[IndexMap<String, SqlValue>]) -> Result<u64> {
        if rows.is_empty() {
            return Err(Error::invalid_bind_data("no rows provided for batch insert"));
        }
        let keys: Vec<String> = rows[0].keys().map(|k| self.quoter.quote(k)).collect();
        let mut value_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = Vec::with_capacity(keys.len());
            for field in rows[0].keys() {
                let value = row.get(field).cloned().ok_or_else(|| {
                    Error::invalid_bind_data(format!("batch insert row is missing field '{}'", field))
                })?;
                values.push(value);
            }
            value_rows.push(values);
        }
        let table = self.resolve_table(table);
        let (sql, values) = self.dialect.insert_batch(&table, &keys, &value_rows)?;
        self.execute_write(&sql, &values)
    }

    /// Update many rows in one CASE-WHEN statement keyed on `key`.
    /// Returns the number of rows submitted, not the engine's affected
    /// count, which CASE-WHEN updates report unreliably across drivers.
    pub fn update_batch(
        &mut self,
        table: &str,
        key: &str,
        rows: &[IndexMap<String, SqlValue>],
    ) -> Result<u64> {
        let table = self.resolve_table(table);
        let (sql, values) = self.dialect.update_batch(&table, key, rows)?;
        self.execute_write(&sql, &values)?;
        Ok(rows.len() as u64)
    }

    /// Total row count of a table, ignoring accumulated state.
    pub fn count_all(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS numrows FROM {}", self.resolve_table(table));
        debug!("Executing query: {}", sql);
        let rows = self.conn.query(&sql)?;
        Ok(extract_numrows(&rows))
    }

    /// Row count the accumulated query would return. With `reset` false
    /// the clause state survives for a subsequent [`get`](Self::get).
    pub fn count_all_results(&mut self, table: Option<&str>, reset: bool) -> Result<u64> {
        if let Some(table) = table {
            self.from(table);
        }
        let saved = std::mem::replace(
            &mut self.state.select_string,
            "COUNT(*) AS numrows".to_string(),
        );
        let compiled = self.compile(Statement::Select, "");
        self.state.select_string = saved;
        let sql = compiled?;
        let values = self.state.where_values.clone();
        debug!("Executing query: {}", sql);
        let rows = self.conn.prepare_query(&sql, &values)?;
        if reset {
            self.reset_query();
        }
        Ok(extract_numrows(&rows))
    }

    // --- compiled-only accessors ---

    /// Compile the accumulated SELECT without executing it.
    pub fn get_compiled_select(&mut self, table: Option<&str>, reset: bool) -> Result<CompiledQuery> {
        if let Some(table) = table {
            self.from(table);
        }
        let sql = self.compile(Statement::Select, "")?;
        let values = self.state.where_values.clone();
        if reset {
            self.reset_query();
        }
        Ok(CompiledQuery { sql, values })
    }

    pub fn get_compiled_insert(&mut self, table: &str, reset: bool) -> Result<CompiledQuery> {
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Insert, &table)?;
        let values = self.state.values.clone();
        if reset {
            self.reset_query();
        }
        Ok(CompiledQuery { sql, values })
    }

    pub fn get_compiled_update(&mut self, table: &str, reset: bool) -> Result<CompiledQuery> {
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Update, &table)?;
        let values = self.state.bind_values();
        if reset {
            self.reset_query();
        }
        Ok(CompiledQuery { sql, values })
    }

    pub fn get_compiled_delete(&mut self, table: &str, reset: bool) -> Result<CompiledQuery> {
        let table = self.resolve_table(table);
        let sql = self.compile(Statement::Delete, &table)?;
        let values = self.state.where_values.clone();
        if reset {
            self.reset_query();
        }
        Ok(CompiledQuery { sql, values })
    }

    // --- transactions ---

    pub fn begin(&mut self) -> Result<()> {
        self.conn.begin()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.conn.rollback()
    }

    pub fn in_transaction(&self) -> bool {
        self.conn.in_transaction()
    }

    // --- introspection ---

    pub fn table_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Tables, None)
    }

    pub fn column_list(&mut self, table: &str) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Columns, Some(table))
    }

    pub fn fk_list(&mut self, table: &str) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::ForeignKeys, Some(table))
    }

    pub fn index_list(&mut self, table: &str) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Indexes, Some(table))
    }

    pub fn type_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Types, None)
    }

    pub fn view_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Views, None)
    }

    pub fn sequence_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Sequences, None)
    }

    pub fn trigger_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Triggers, None)
    }

    pub fn function_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Functions, None)
    }

    pub fn procedure_list(&mut self) -> Result<Vec<Row>> {
        self.metadata_rows(MetadataKind::Procedures, None)
    }

    /// Ask the driver first; fall back to the dialect's SQL template.
    fn metadata_rows(&mut self, kind: MetadataKind, table: Option<&str>) -> Result<Vec<Row>> {
        if let Some(rows) = self.conn.metadata(kind, table)? {
            return Ok(rows);
        }
        let sql = match kind {
            MetadataKind::Tables => self.dialect.table_list_sql()?,
            MetadataKind::Columns => self.dialect.column_list_sql(table.unwrap_or_default())?,
            MetadataKind::ForeignKeys => self.dialect.fk_list_sql(table.unwrap_or_default())?,
            MetadataKind::Indexes => self.dialect.index_list_sql(table.unwrap_or_default())?,
            MetadataKind::Types => self.dialect.type_list_sql()?,
            MetadataKind::Views => self.dialect.view_list_sql()?,
            MetadataKind::Sequences => self.dialect.sequence_list_sql()?,
            MetadataKind::Triggers => self.dialect.trigger_list_sql()?,
            MetadataKind::Functions => self.dialect.function_list_sql()?,
            MetadataKind::Procedures => self.dialect.procedure_list_sql()?,
        };
        debug!("Executing query: {}", sql);
        self.conn.query(&sql)
    }

    fn execute_write(&mut self, sql: &str, values: &[SqlValue]) -> Result<u64> {
        debug!("Executing query: {}", sql);
        let result = self.conn.prepare_execute(sql, values)?;
        self.reset_query();
        Ok(result.rows_affected)
    }
}

/// Pull the `numrows` column out of a COUNT(*) result row, tolerating
/// drivers that hand counts back as strings.
fn extract_numrows(rows: &[Row]) -> u64 {
    rows.first()
        .and_then(|row| row.get("numrows"))
        .and_then(|value| {
            value
                .as_u64()
                .or_else(|| value.as_i64().map(|n| n.max(0) as u64))
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        })
        .unwrap_or(0)
}
