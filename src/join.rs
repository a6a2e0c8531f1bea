//! Join-condition tokenizer
//!
//! Raw join conditions like `"orders.user_id = users.id"` arrive as one
//! string. They are tokenized into function calls, identifiers and
//! operators, and only the identifier tokens are quoted; everything else
//! passes through verbatim. Malformed input (anything between tokens that
//! is not whitespace) is rejected rather than compiled into wrong SQL.

use crate::error::{Error, Result};
use crate::quote::IdentifierQuoter;
use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+\([^)]*\)").expect("static regex"));

static IDENTIFIERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*").expect("static regex"));

// Two-character forms first, each with its single-character variant
// (`>=?` also takes a bare `>`). `<>` precedes `<=?` so it tokenizes as
// one operator.
static OPERATORS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r">=?|<>|<=?|!=?|&&?|\|\|?|\bAND\b|\bNOT\b|\bXOR\b|\bOR\b|[=~^/%+-]")
        .expect("static regex")
});

/// One alternation per token category; function calls win over operators,
/// operators over identifiers, so `AND` never tokenizes as an identifier.
static COMBINED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[A-Za-z0-9_]+\([^)]*\)|>=?|<>|<=?|!=?|&&?|\|\|?|\bAND\b|\bNOT\b|\bXOR\b|\bOR\b|[=~^/%+-]|[A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*",
    )
    .expect("static regex")
});

const KEYWORD_OPERATORS: [&str; 4] = ["AND", "OR", "NOT", "XOR"];

/// Token streams extracted from one join condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJoin {
    pub functions: Vec<String>,
    pub identifiers: Vec<String>,
    pub operators: Vec<String>,
    /// Every token in original left-to-right order.
    pub combined: Vec<String>,
}

/// Tokenizes raw join-condition strings and quotes identifier tokens.
pub struct JoinConditionParser;

impl JoinConditionParser {
    /// Run the independent token passes over one condition string.
    pub fn parse(condition: &str) -> ParsedJoin {
        let functions = FUNCTIONS_RE
            .find_iter(condition)
            .map(|m| m.as_str().to_string())
            .collect();
        let identifiers = IDENTIFIERS_RE
            .find_iter(condition)
            .map(|m| m.as_str().to_string())
            // Bare SQL keywords also match the identifier pattern; they
            // belong to the operator category and must never be quoted.
            .filter(|t| !KEYWORD_OPERATORS.contains(&t.to_uppercase().as_str()))
            .collect();
        let operators = OPERATORS_RE
            .find_iter(condition)
            .map(|m| m.as_str().to_string())
            .collect();
        let combined = COMBINED_RE
            .find_iter(condition)
            .map(|m| m.as_str().to_string())
            .collect();

        ParsedJoin {
            functions,
            identifiers,
            operators,
            combined,
        }
    }

    /// Compile a join condition into quoted SQL text.
    ///
    /// Walks the combined token stream: identifier tokens that are not
    /// purely numeric are quoted, operators and function calls pass
    /// through verbatim, and the original inter-token text is preserved.
    pub fn compile(condition: &str, quoter: &IdentifierQuoter) -> Result<String> {
        let parsed = Self::parse(condition);
        if parsed.combined.is_empty() && !condition.trim().is_empty() {
            return Err(Error::InvalidJoinCondition(condition.to_string()));
        }

        let mut out = String::new();
        let mut last = 0;
        for m in COMBINED_RE.find_iter(condition) {
            let gap = &condition[last..m.start()];
            if !gap.trim().is_empty() {
                return Err(Error::InvalidJoinCondition(condition.to_string()));
            }
            out.push_str(gap);

            let token = m.as_str();
            let numeric = token.chars().all(|c| c.is_ascii_digit());
            if !numeric && parsed.identifiers.iter().any(|i| i == token) {
                out.push_str(&quoter.quote(token));
            } else {
                out.push_str(token);
            }
            last = m.end();
        }
        if !condition[last..].trim().is_empty() {
            return Err(Error::InvalidJoinCondition(condition.to_string()));
        }
        out.push_str(&condition[last..]);

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoter() -> IdentifierQuoter {
        IdentifierQuoter::new('"', '"')
    }

    #[test]
    fn test_parse_simple_equality() {
        let parsed = JoinConditionParser::parse("table1.field1=table2.field2");
        assert_eq!(parsed.identifiers, vec!["table1.field1", "table2.field2"]);
        assert_eq!(parsed.operators, vec!["="]);
        assert_eq!(
            parsed.combined,
            vec!["table1.field1", "=", "table2.field2"]
        );
        assert!(parsed.functions.is_empty());
    }

    #[test]
    fn test_parse_with_function() {
        let parsed = JoinConditionParser::parse("LOWER(a.name)=b.name");
        assert_eq!(parsed.functions, vec!["LOWER(a.name)"]);
        assert_eq!(parsed.combined, vec!["LOWER(a.name)", "=", "b.name"]);
    }

    #[test]
    fn test_parse_keyword_not_an_identifier() {
        let parsed = JoinConditionParser::parse("a.x = b.y AND a.z = 1");
        assert_eq!(parsed.identifiers, vec!["a.x", "b.y", "a.z", "1"]);
        assert!(parsed.operators.contains(&"AND".to_string()));
    }

    #[test]
    fn test_compile_quotes_identifiers() {
        let sql =
            JoinConditionParser::compile("table1.field1=table2.field2", &quoter()).unwrap();
        assert_eq!(sql, r#""table1"."field1"="table2"."field2""#);
    }

    #[test]
    fn test_compile_preserves_spacing_and_keywords() {
        let sql = JoinConditionParser::compile("a.x = b.y AND a.z = 1", &quoter()).unwrap();
        assert_eq!(sql, r#""a"."x" = "b"."y" AND "a"."z" = 1"#);
    }

    #[test]
    fn test_compile_leaves_functions_verbatim() {
        let sql = JoinConditionParser::compile("LOWER(a.name)=b.name", &quoter()).unwrap();
        assert_eq!(sql, r#"LOWER(a.name)="b"."name""#);
    }

    #[test]
    fn test_compile_numeric_token_not_quoted() {
        let sql = JoinConditionParser::compile("a.id=1", &quoter()).unwrap();
        assert_eq!(sql, r#""a"."id"=1"#);
    }

    #[test]
    fn test_single_character_comparison_operators() {
        let sql = JoinConditionParser::compile("a.num > b.num", &quoter()).unwrap();
        assert_eq!(sql, r#""a"."num" > "b"."num""#);

        let parsed = JoinConditionParser::parse("a.x < b.y");
        assert_eq!(parsed.operators, vec!["<"]);
        assert_eq!(parsed.combined, vec!["a.x", "<", "b.y"]);
    }

    #[test]
    fn test_not_equal_variants_tokenize_whole() {
        let parsed = JoinConditionParser::parse("a.x != b.y");
        assert_eq!(parsed.operators, vec!["!="]);
        let parsed = JoinConditionParser::parse("a.x <> b.y");
        assert_eq!(parsed.operators, vec!["<>"]);
    }

    #[test]
    fn test_compile_rejects_malformed_condition() {
        let result = JoinConditionParser::compile("a.id = (b.id)", &quoter());
        assert!(matches!(result, Err(Error::InvalidJoinCondition(_))));
    }
}
