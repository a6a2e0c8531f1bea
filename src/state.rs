//! Accumulated clause state for one in-flight statement
//!
//! One `QueryState` is owned exclusively by one builder. Every clause
//! method mutates it and `reset_query()` replaces it wholesale, so a
//! freshly reset builder compiles byte-identical SQL to a new one.

use crate::value::SqlValue;
use indexmap::IndexMap;

/// Kind of an entry in the ordered clause list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Where,
    WhereIn,
    Like,
    Join,
    GroupStart,
    GroupEnd,
}

/// One WHERE/JOIN/grouping fragment in emission order.
///
/// The conjunction is the full connective text prefixed to the fragment
/// (`"\nWHERE "`, `" AND "`, `" OR "`, or empty directly after an opening
/// paren); it is decided at append time, never at compile time.
#[derive(Debug, Clone)]
pub struct ClauseEntry {
    pub kind: ClauseKind,
    pub conjunction: String,
    pub fragment: String,
}

/// One HAVING fragment. The first entry carries `" HAVING "`, later
/// entries `" AND "` or `" OR "`.
#[derive(Debug, Clone)]
pub struct HavingEntry {
    pub conjunction: String,
    pub fragment: String,
}

/// Mutable container for all accumulated clause fragments, ordered clause
/// entries and bind values of one statement.
///
/// Invariant: `query_map` order equals emitted SQL order. Balancing of
/// `GroupStart`/`GroupEnd` entries is a caller responsibility and is not
/// enforced here.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub select_string: String,
    pub from_string: String,
    pub set_string: String,
    pub order_string: String,
    pub group_string: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Quoted column names for INSERT, in `set()` call order.
    pub set_keys: Vec<String>,
    /// Ordered field -> direction map backing `order_string`.
    pub order_fields: IndexMap<String, String>,
    /// Ordered quoted GROUP BY fields backing `group_string`.
    pub group_fields: Vec<String>,
    /// Bind values for SET/VALUES fragments.
    pub values: Vec<SqlValue>,
    /// Bind values for WHERE/LIKE/IN/HAVING fragments, in append order.
    pub where_values: Vec<SqlValue>,
    pub query_map: Vec<ClauseEntry>,
    pub having_map: Vec<HavingEntry>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last appended clause entry, if any.
    pub fn last_entry(&self) -> Option<&ClauseEntry> {
        self.query_map.last()
    }

    /// All bind values in execution order: WHERE stream after the
    /// SET/VALUES stream, matching placeholder order in compiled SQL.
    pub fn bind_values(&self) -> Vec<SqlValue> {
        let mut out = self.values.clone();
        out.extend(self.where_values.iter().cloned());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state = QueryState::new();
        assert!(state.select_string.is_empty());
        assert!(state.query_map.is_empty());
        assert!(state.having_map.is_empty());
        assert!(state.limit.is_none());
        assert!(state.bind_values().is_empty());
    }

    #[test]
    fn test_bind_values_order_set_before_where() {
        let mut state = QueryState::new();
        state.values.push(SqlValue::Int(1));
        state.where_values.push(SqlValue::Int(2));
        assert_eq!(
            state.bind_values(),
            vec![SqlValue::Int(1), SqlValue::Int(2)]
        );
    }
}
