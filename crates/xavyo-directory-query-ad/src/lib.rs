//! # Active Directory Query
//!
//! Active Directory flavor of `xavyo-directory-query`.
//!
//! ## Features
//!
//! - AD predicate vocabulary (disabled, locked, nested membership, group
//!   scope and kind)
//! - `userAccountControl` and `groupType` bitfields
//! - `groupType` flag converters
//! - Default user and group object schemas
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_directory_query::prelude::*;
//! use xavyo_directory_query_ad::{ad_registry, user_schema, AdFilterBuilder};
//!
//! let compiler = QueryCompiler::new(Arc::new(ad_registry()?), QueryConfig::new())?
//!     .with_schema(Arc::new(user_schema()?));
//!
//! let f = AdFilterBuilder::new();
//! let request = compiler.compile(&f.and([
//!     f.account_is_enabled(),
//!     f.is_recursively_member_of("CN=Admins,OU=Groups,DC=corp,DC=local"),
//! ]))?;
//! ```

pub mod converter;
pub mod filter;
pub mod group_type;
pub mod schema;
pub mod user_account_control;

// Re-exports
pub use converter::{ad_registry, register_converters};
pub use filter::AdFilterBuilder;
pub use schema::{default_schemas, group_definition, group_schema, user_definition, user_schema};
pub use user_account_control::UserAccountControl;
