//! # Directory Query
//!
//! Builds LDAP search filters from typed expression trees and turns raw
//! directory entries back into typed attribute maps.
//!
//! A [`schema::ObjectSchema`] maps domain attribute names (`username`,
//! `disabled`) to directory names (`sAMAccountName`, `userAccountControl`)
//! and names the converter that moves each value between its typed form and
//! its directory encoding. The same schema drives both directions:
//!
//! - [`query::QueryCompiler`] resolves an [`expression::Expression`] against
//!   the schema and serializes it to an RFC 4515 filter string.
//! - [`hydrator::Hydrator`] maps a [`entry::RawEntry`] back to domain names
//!   and typed values.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_directory_query::prelude::*;
//!
//! let registry = Arc::new(ConverterRegistry::with_builtins());
//! let compiler = QueryCompiler::new(Arc::clone(&registry), QueryConfig::new())?
//!     .with_schema(user_schema);
//!
//! // `disabled` is a flag alias: `false` compiles to
//! // `(!(userAccountControl:1.2.840.113556.1.4.803:=2))`.
//! let f = FilterBuilder::new();
//! let request = compiler.compile(&f.and([
//!     f.eq("disabled", false),
//!     f.starts_with("username", "adm"),
//! ]))?;
//!
//! let users = compiler.hydrator(None).hydrate_all(&entries)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`error`] - Error type and result alias
//! - [`value`] - Typed and raw attribute values
//! - [`converter`] - Value converters and their registry
//! - [`expression`] - Filter expression tree and escaping
//! - [`filter`] - Predicate shorthand over the expression tree
//! - [`schema`] - Object schemas and their serializable definitions
//! - [`config`] - Search defaults
//! - [`query`] - Compilation to search requests
//! - [`entry`] - Raw directory entries
//! - [`hydrator`] - Raw entries to typed attribute maps

pub mod config;
pub mod converter;
pub mod entry;
pub mod error;
pub mod expression;
pub mod filter;
pub mod hydrator;
pub mod query;
pub mod schema;
pub mod value;

/// Prelude module for convenient imports.
///
/// ```
/// use xavyo_directory_query::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{QueryError, QueryResult};

    // Values
    pub use crate::value::{AttributeValue, RawValue, ValueSource};

    // Converters
    pub use crate::converter::{names, AttributeConverter, ConverterRegistry, SharedConverter};

    // Expressions
    pub use crate::expression::{
        oid, Comparison, ComparisonOperator, Expression, Logical, LogicalKind, MatchingRule,
        ResolveContext, Wildcard, WildcardKind,
    };
    pub use crate::filter::FilterBuilder;

    // Schema
    pub use crate::schema::{ObjectSchema, ObjectSchemaDefinition};

    // Configuration
    pub use crate::config::{QueryConfig, SearchScope};

    // Query and hydration
    pub use crate::entry::{CountedValues, RawEntry};
    pub use crate::hydrator::{HydratedEntry, Hydrator};
    pub use crate::query::{QueryCompiler, SearchRequest};
}
