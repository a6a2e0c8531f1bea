//! Identifier quoting per dialect escape characters
//!
//! Every other component quotes through this type. The algorithm follows
//! the clause-state compiler's needs: comma-separated field strings split
//! and rejoin, dotted paths quote per segment, and naively over-quoted
//! function calls are unwrapped so only their identifier arguments carry
//! escape characters.

use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a raw function-call capture into name and argument text.
static FUNCTION_ARGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_]+)\((.*)\)$").expect("static regex"));

/// Quotes and escapes identifiers and table names.
#[derive(Debug, Clone)]
pub struct IdentifierQuoter {
    open: char,
    close: char,
    /// Matches a whole quoted string that is really a function call whose
    /// body got segment-quoted, e.g. `"COUNT(a"."b)"`.
    over_quoted_fn: Regex,
}

impl IdentifierQuoter {
    pub fn new(open: char, close: char) -> Self {
        let pattern = format!(
            r"^{o}([A-Za-z0-9_]+)\((.*)\){c}$",
            o = regex::escape(&open.to_string()),
            c = regex::escape(&close.to_string()),
        );
        Self {
            open,
            close,
            over_quoted_fn: Regex::new(&pattern).expect("escape chars form a valid pattern"),
        }
    }

    /// Quote a single identifier string.
    ///
    /// Comma-separated multi-field strings (`"a,b"`) are split, quoted
    /// part-wise and rejoined. Dotted paths (`schema.table.column`) quote
    /// each trimmed segment individually.
    pub fn quote(&self, value: &str) -> String {
        if value.contains(',') {
            return value
                .split(',')
                .map(|part| self.quote(part))
                .collect::<Vec<_>>()
                .join(",");
        }

        let quoted = value
            .split('.')
            .map(|segment| self.quote_segment(segment.trim()))
            .collect::<Vec<_>>()
            .join(".");

        self.unwrap_function_call(&quoted)
    }

    /// Vectorized form of [`quote`](Self::quote): maps element-wise.
    pub fn quote_many<S: AsRef<str>>(&self, values: &[S]) -> Vec<String> {
        values.iter().map(|v| self.quote(v.as_ref())).collect()
    }

    /// Quote a table name, inserting the driver's table prefix first.
    ///
    /// The prefix lands in the last dot-segment only, and only if that
    /// segment does not already contain it, so double-prefixing a name is
    /// a no-op.
    pub fn quote_table(&self, name: &str, prefix: &str) -> String {
        let mut parts: Vec<String> = name.split('.').map(|s| s.trim().to_string()).collect();
        if !prefix.is_empty() {
            if let Some(last) = parts.last_mut() {
                if !last.contains(prefix) {
                    *last = format!("{}{}", prefix, last);
                }
            }
        }
        self.quote(&parts.join("."))
    }

    fn quote_segment(&self, segment: &str) -> String {
        if segment.is_empty() || segment == "*" {
            return segment.to_string();
        }
        if segment.chars().all(|c| c.is_ascii_digit()) {
            return segment.to_string();
        }
        if segment.starts_with(self.open) || segment.ends_with(self.close) {
            return segment.to_string();
        }
        format!("{}{}{}", self.open, segment, self.close)
    }

    /// Detect a quoted string that is really a function call and rebuild
    /// it with a bare name and parentheses, re-quoting only the inner
    /// identifier arguments.
    fn unwrap_function_call(&self, quoted: &str) -> String {
        let caps = match self.over_quoted_fn.captures(quoted) {
            Some(caps) => caps,
            None => return quoted.to_string(),
        };
        let name = &caps[1];
        let inner: String = caps[2]
            .chars()
            .filter(|c| *c != self.open && *c != self.close)
            .collect();

        let args = inner
            .split(',')
            .map(|arg| {
                let arg = arg.trim();
                // Argument text that still looks like a nested call or a
                // literal passes through; identifiers get re-quoted.
                if FUNCTION_ARGS_RE.is_match(arg) {
                    arg.to_string()
                } else {
                    arg.split('.')
                        .map(|segment| self.quote_segment(segment.trim()))
                        .collect::<Vec<_>>()
                        .join(".")
                }
            })
            .collect::<Vec<_>>()
            .join(",");

        format!("{}({})", name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoter() -> IdentifierQuoter {
        IdentifierQuoter::new('"', '"')
    }

    #[test]
    fn test_simple_identifier() {
        assert_eq!(quoter().quote("users"), r#""users""#);
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(quoter().quote("a.b"), r#""a"."b""#);
        assert_eq!(quoter().quote("db.users.id"), r#""db"."users"."id""#);
    }

    #[test]
    fn test_comma_separated_fields() {
        assert_eq!(quoter().quote("a,b"), r#""a","b""#);
        assert_eq!(quoter().quote("a, b"), r#""a","b""#);
    }

    #[test]
    fn test_quote_many_maps_element_wise() {
        let out = quoter().quote_many(&["a", "b,c"]);
        assert_eq!(out, vec![r#""a""#.to_string(), r#""b","c""#.to_string()]);
    }

    #[test]
    fn test_numeric_segment_not_quoted() {
        assert_eq!(quoter().quote("users.0"), r#""users".0"#);
        assert_eq!(quoter().quote("42"), "42");
    }

    #[test]
    fn test_already_quoted_segment_untouched() {
        assert_eq!(quoter().quote(r#""users""#), r#""users""#);
    }

    #[test]
    fn test_star_untouched() {
        assert_eq!(quoter().quote("*"), "*");
        assert_eq!(quoter().quote("users.*"), r#""users".*"#);
    }

    #[test]
    fn test_function_call_name_left_bare() {
        assert_eq!(quoter().quote("COUNT(a.b)"), r#"COUNT("a"."b")"#);
        assert_eq!(quoter().quote("COUNT(*)"), "COUNT(*)");
        assert_eq!(quoter().quote("MAX(price)"), r#"MAX("price")"#);
    }

    #[test]
    fn test_backtick_escape_chars() {
        let q = IdentifierQuoter::new('`', '`');
        assert_eq!(q.quote("a.b"), "`a`.`b`");
        assert_eq!(q.quote("COUNT(a.b)"), "COUNT(`a`.`b`)");
    }

    #[test]
    fn test_table_prefix_inserted_into_last_segment() {
        let q = quoter();
        assert_eq!(q.quote_table("users", "app_"), r#""app_users""#);
        assert_eq!(q.quote_table("db.users", "app_"), r#""db"."app_users""#);
    }

    #[test]
    fn test_table_prefix_idempotent() {
        let q = quoter();
        assert_eq!(q.quote_table("app_users", "app_"), r#""app_users""#);
    }

    #[test]
    fn test_table_without_prefix() {
        assert_eq!(quoter().quote_table("users", ""), r#""users""#);
    }
}
