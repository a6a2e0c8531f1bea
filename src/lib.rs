//! sqlforge - a multi-dialect SQL query builder
//!
//! sqlforge turns chained clause calls into dialect-correct SQL with
//! positional `?` placeholders and an ordered bind list:
//! - Chainable WHERE/LIKE/IN/HAVING conditions with grouping parens
//! - Identifier quoting per dialect, table-prefix aware
//! - MySQL, PostgreSQL and SQLite dialects behind one trait
//! - Batch insert/update statement generation
//! - A concurrent driver/connection registry
//!
//! ```
//! use sqlforge::{QueryBuilder, RecordingConnection, PostgresDialect};
//!
//! let mut db = QueryBuilder::new(
//!     Box::new(RecordingConnection::new()),
//!     Box::new(PostgresDialect::new()),
//! );
//! let compiled = db
//!     .select("id")
//!     .select("name")
//!     .from("users")
//!     .where_("status", "active")
//!     .order_by("name", "ASC")
//!     .limit(10)
//!     .get_compiled_select(None, true)
//!     .unwrap();
//! assert!(compiled.sql.starts_with("SELECT \"id\", \"name\" \nFROM \"users\""));
//! ```

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod builder;
pub mod connection;
pub mod dialects;
pub mod error;
pub mod join;
pub mod params;
pub mod quote;
pub mod registry;
pub mod state;
pub mod value;

pub use builder::{CompiledQuery, LikeMatch, QueryBuilder};
pub use connection::{Connection, ExecResult, MetadataKind, RecordingConnection, Row, StatementLog};
pub use dialects::{create_dialect, Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use error::{Error, Result};
pub use join::{JoinConditionParser, ParsedJoin};
pub use params::{ConnectionParams, ParsedParams};
pub use quote::IdentifierQuoter;
pub use registry::{ConnectionRegistry, Driver};
pub use state::QueryState;
pub use value::SqlValue;
