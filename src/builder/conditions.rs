//! WHERE/HAVING condition building
//!
//! The conjunction of every appended entry is decided here, at append
//! time, from the type and position of prior entries. The compiler later
//! concatenates entries verbatim, so getting these connectives right is
//! what keeps nested grouping and mixed JOIN/WHERE statements valid.

use super::{LikeMatch, QueryBuilder};
use crate::state::{ClauseEntry, ClauseKind, HavingEntry};
use crate::value::SqlValue;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a conjunction that already introduced a WHERE clause
/// (optionally behind the leading newline the first entry carries).
static WHERE_CONJ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\n?WHERE").expect("static regex"));

impl QueryBuilder {
    /// Add a `WHERE field = value` condition (AND-joined).
    ///
    /// An operator-bearing key like `"id >"` splits on the first space
    /// into identifier and operator.
    pub fn where_<V: Into<SqlValue>>(&mut self, key: &str, value: V) -> &mut Self {
        self.where_string(vec![(key.to_string(), value.into())], "AND");
        self
    }

    /// Add a `WHERE field = value` condition (OR-joined).
    pub fn or_where<V: Into<SqlValue>>(&mut self, key: &str, value: V) -> &mut Self {
        self.where_string(vec![(key.to_string(), value.into())], "OR");
        self
    }

    /// Map form of [`where_`](Self::where_): every pair is appended in
    /// iteration order.
    pub fn where_many<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.where_string(pairs, "AND");
        self
    }

    /// Map form of [`or_where`](Self::or_where).
    pub fn or_where_many<K, V, I>(&mut self, pairs: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.where_string(pairs, "OR");
        self
    }

    /// `WHERE key IN (...)` with one placeholder per value.
    pub fn where_in<V: Into<SqlValue>>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        self.where_in_entry(key, values, "IN", "AND");
        self
    }

    pub fn or_where_in<V: Into<SqlValue>>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        self.where_in_entry(key, values, "IN", "OR");
        self
    }

    pub fn where_not_in<V: Into<SqlValue>>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        self.where_in_entry(key, values, "NOT IN", "AND");
        self
    }

    pub fn or_where_not_in<V: Into<SqlValue>>(&mut self, key: &str, values: Vec<V>) -> &mut Self {
        self.where_in_entry(key, values, "NOT IN", "OR");
        self
    }

    /// `WHERE field LIKE ?` with the value wrapped in `%` per `pos`.
    pub fn like(&mut self, field: &str, value: &str, pos: LikeMatch) -> &mut Self {
        self.like_entry(field, value, pos, "LIKE", "AND");
        self
    }

    pub fn or_like(&mut self, field: &str, value: &str, pos: LikeMatch) -> &mut Self {
        self.like_entry(field, value, pos, "LIKE", "OR");
        self
    }

    pub fn not_like(&mut self, field: &str, value: &str, pos: LikeMatch) -> &mut Self {
        self.like_entry(field, value, pos, "NOT LIKE", "AND");
        self
    }

    pub fn or_not_like(&mut self, field: &str, value: &str, pos: LikeMatch) -> &mut Self {
        self.like_entry(field, value, pos, "NOT LIKE", "OR");
        self
    }

    /// HAVING condition; same key-splitting rule as WHERE but with an
    /// independent conjunction list.
    pub fn having<V: Into<SqlValue>>(&mut self, key: &str, value: V) -> &mut Self {
        self.having_entry(key, value.into(), "AND");
        self
    }

    pub fn or_having<V: Into<SqlValue>>(&mut self, key: &str, value: V) -> &mut Self {
        self.having_entry(key, value.into(), "OR");
        self
    }

    /// Open a grouping paren. The entry directly after it gets an empty
    /// conjunction so no connective lands inside the paren.
    pub fn group_start(&mut self) -> &mut Self {
        self.group_entry("AND");
        self
    }

    pub fn or_group_start(&mut self) -> &mut Self {
        self.group_entry("OR");
        self
    }

    /// Close a grouping paren. Balancing against `group_start` is the
    /// caller's responsibility.
    pub fn group_end(&mut self) -> &mut Self {
        self.state.query_map.push(ClauseEntry {
            kind: ClauseKind::GroupEnd,
            conjunction: String::new(),
            fragment: ")".to_string(),
        });
        self
    }

    /// Build the `ident op ?` fragment from a clause key.
    fn split_key_fragment(&self, key: &str) -> String {
        match key.trim().split_once(' ') {
            Some((ident, op)) => {
                format!("{} {} ?", self.quoter.quote(ident.trim()), op.trim())
            }
            None => format!("{}=?", self.quoter.quote(key.trim())),
        }
    }

    /// Whether any existing entry already introduced a WHERE clause.
    fn has_where_conjunction(&self) -> bool {
        self.state
            .query_map
            .iter()
            .any(|e| WHERE_CONJ_RE.is_match(&e.conjunction))
    }

    /// Conjunction selection shared by where entries and group openers.
    fn next_conjunction(&self, default_conj: &str) -> String {
        if self.state.query_map.is_empty() || !self.has_where_conjunction() {
            "\nWHERE ".to_string()
        } else if self
            .state
            .last_entry()
            .map(|e| e.kind == ClauseKind::GroupStart)
            .unwrap_or(false)
        {
            String::new()
        } else {
            format!(" {} ", default_conj)
        }
    }

    fn where_string(&mut self, pairs: Vec<(String, SqlValue)>, default_conj: &str) {
        for (field, value) in pairs {
            self.state.where_values.push(value);
            let fragment = self.split_key_fragment(&field);
            let conjunction = self.next_conjunction(default_conj);
            self.state.query_map.push(ClauseEntry {
                kind: ClauseKind::Where,
                conjunction,
                fragment,
            });
        }
    }

    fn where_in_entry<V: Into<SqlValue>>(
        &mut self,
        key: &str,
        values: Vec<V>,
        in_keyword: &str,
        conj: &str,
    ) {
        let conjunction = if self.state.query_map.is_empty() {
            " WHERE ".to_string()
        } else {
            format!(" {} ", conj)
        };
        let placeholders = vec!["?"; values.len()].join(",");
        let fragment = format!(
            "{} {} ({})",
            self.quoter.quote(key),
            in_keyword,
            placeholders
        );
        for value in values {
            self.state.where_values.push(value.into());
        }
        self.state.query_map.push(ClauseEntry {
            kind: ClauseKind::WhereIn,
            conjunction,
            fragment,
        });
    }

    fn like_entry(
        &mut self,
        field: &str,
        value: &str,
        pos: LikeMatch,
        like_keyword: &str,
        conj: &str,
    ) {
        let conjunction = if self.state.query_map.is_empty() {
            " WHERE ".to_string()
        } else {
            format!(" {} ", conj)
        };
        let wrapped = match pos {
            LikeMatch::Before => format!("%{}", value),
            LikeMatch::After => format!("{}%", value),
            LikeMatch::Both => format!("%{}%", value),
        };
        let fragment = format!("{} {} ?", self.quoter.quote(field), like_keyword);
        self.state.where_values.push(SqlValue::Text(wrapped));
        self.state.query_map.push(ClauseEntry {
            kind: ClauseKind::Like,
            conjunction,
            fragment,
        });
    }

    fn having_entry(&mut self, key: &str, value: SqlValue, conj: &str) {
        let conjunction = if self.state.having_map.is_empty() {
            " HAVING ".to_string()
        } else {
            format!(" {} ", conj)
        };
        let fragment = self.split_key_fragment(key);
        // Having values share the WHERE bind stream; they compile after
        // the main clause entries, matching placeholder order.
        self.state.where_values.push(value);
        self.state.having_map.push(HavingEntry {
            conjunction,
            fragment,
        });
    }

    fn group_entry(&mut self, default_conj: &str) {
        let conjunction = self.next_conjunction(default_conj);
        self.state.query_map.push(ClauseEntry {
            kind: ClauseKind::GroupStart,
            conjunction,
            fragment: "(".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::QueryBuilder;
    use crate::connection::RecordingConnection;
    use crate::dialects::PostgresDialect;
    use crate::state::ClauseKind;
    use crate::value::SqlValue;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(
            Box::new(RecordingConnection::new()),
            Box::new(PostgresDialect::new()),
        )
    }

    #[test]
    fn test_first_where_gets_newline_where_conjunction() {
        let mut qb = builder();
        qb.where_("id", 1).where_("name", "a");
        let map = &qb.state().query_map;
        assert_eq!(map[0].conjunction, "\nWHERE ");
        assert_eq!(map[1].conjunction, " AND ");
    }

    #[test]
    fn test_or_where_conjunction() {
        let mut qb = builder();
        qb.where_("id", 1).or_where("id", 2);
        assert_eq!(qb.state().query_map[1].conjunction, " OR ");
    }

    #[test]
    fn test_where_after_join_still_opens_where() {
        let mut qb = builder();
        qb.from("orders");
        qb.join("users", "users.id=orders.user_id", "LEFT").unwrap();
        qb.where_("orders.total >", 100);
        let map = &qb.state().query_map;
        assert_eq!(map[0].kind, ClauseKind::Join);
        assert_eq!(map[1].conjunction, "\nWHERE ");
    }

    #[test]
    fn test_where_after_group_start_has_empty_conjunction() {
        let mut qb = builder();
        qb.group_start().where_("id", 1).group_end();
        let map = &qb.state().query_map;
        assert_eq!(map[0].kind, ClauseKind::GroupStart);
        assert_eq!(map[1].conjunction, "");
        assert_eq!(map[2].kind, ClauseKind::GroupEnd);
    }

    #[test]
    fn test_operator_bearing_key() {
        let mut qb = builder();
        qb.where_("id >", 5);
        assert_eq!(qb.state().query_map[0].fragment, r#""id" > ?"#);
    }

    #[test]
    fn test_plain_key_gets_equals() {
        let mut qb = builder();
        qb.where_("id", 5);
        assert_eq!(qb.state().query_map[0].fragment, r#""id"=?"#);
    }

    #[test]
    fn test_where_in_placeholders_and_values() {
        let mut qb = builder();
        qb.where_in("id", vec![1, 2, 3]);
        let entry = &qb.state().query_map[0];
        assert_eq!(entry.fragment, r#""id" IN (?,?,?)"#);
        assert_eq!(entry.conjunction, " WHERE ");
        assert_eq!(
            qb.state().where_values,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_where_many_records_values_in_iteration_order() {
        let mut qb = builder();
        qb.where_many(vec![("a", 1), ("b", 2)]);
        assert_eq!(
            qb.state().where_values,
            vec![SqlValue::Int(1), SqlValue::Int(2)]
        );
        assert_eq!(qb.state().query_map.len(), 2);
    }

    #[test]
    fn test_like_wraps_value() {
        use crate::builder::LikeMatch;
        let mut qb = builder();
        qb.like("name", "jo", LikeMatch::Both);
        assert_eq!(qb.state().query_map[0].fragment, r#""name" LIKE ?"#);
        assert_eq!(
            qb.state().where_values,
            vec![SqlValue::Text("%jo%".to_string())]
        );
    }

    #[test]
    fn test_having_first_entry_conjunction() {
        let mut qb = builder();
        qb.having("COUNT(id) >", 3).or_having("total <", 10);
        let map = &qb.state().having_map;
        assert_eq!(map[0].conjunction, " HAVING ");
        assert_eq!(map[1].conjunction, " OR ");
        assert_eq!(map[0].fragment, r#"COUNT("id") > ?"#);
    }
}
