//! Query configuration
//!
//! Defaults applied when a schema does not carry its own base DN, scope or
//! page size, plus the strict-schema switch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// Largest page size a directory is asked for.
pub const MAX_PAGE_SIZE: u32 = 100_000;

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Immediate children of the base entry.
    OneLevel,
    /// The base entry and its whole subtree.
    #[default]
    Subtree,
}

impl SearchScope {
    /// Get the scope name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Base => "base",
            SearchScope::OneLevel => "one_level",
            SearchScope::Subtree => "subtree",
        }
    }
}

impl FromStr for SearchScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(SearchScope::Base),
            "one" | "onelevel" | "one_level" => Ok(SearchScope::OneLevel),
            "sub" | "subtree" => Ok(SearchScope::Subtree),
            _ => Err(QueryError::InvalidConfiguration {
                message: format!("unknown search scope '{s}'"),
            }),
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SearchScope> for ldap3::Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => ldap3::Scope::Base,
            SearchScope::OneLevel => ldap3::Scope::OneLevel,
            SearchScope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// Settings for compiling queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Search base used when the schema has none.
    #[serde(default)]
    pub base_dn: String,

    /// Scope used when the schema has none.
    #[serde(default)]
    pub scope: SearchScope,

    /// Page size hint used when the schema has none. `None` disables paging.
    #[serde(default = "default_page_size")]
    pub page_size: Option<u32>,

    /// Fail on attributes the schema does not map instead of passing them
    /// through as directory names.
    #[serde(default)]
    pub strict_schema: bool,
}

fn default_page_size() -> Option<u32> {
    Some(1000)
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_dn: String::new(),
            scope: SearchScope::default(),
            page_size: default_page_size(),
            strict_schema: false,
        }
    }
}

impl QueryConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default base DN.
    #[must_use]
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// Set the default scope.
    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the default page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enable or disable strict schema mode.
    #[must_use]
    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> QueryResult<()> {
        if !self.base_dn.is_empty() && !self.base_dn.contains('=') {
            return Err(QueryError::InvalidConfiguration {
                message: format!("base_dn '{}' is not a distinguished name", self.base_dn),
            });
        }

        match self.page_size {
            Some(0) => Err(QueryError::InvalidConfiguration {
                message: "page_size must be greater than zero".to_string(),
            }),
            Some(size) if size > MAX_PAGE_SIZE => Err(QueryError::InvalidConfiguration {
                message: format!("page_size must not exceed {MAX_PAGE_SIZE}"),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryConfig::default();
        assert_eq!(config.scope, SearchScope::Subtree);
        assert_eq!(config.page_size, Some(1000));
        assert!(!config.strict_schema);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: QueryConfig =
            serde_json::from_str(r#"{"base_dn": "dc=example,dc=com", "scope": "one_level"}"#)
                .unwrap();
        assert_eq!(config.base_dn, "dc=example,dc=com");
        assert_eq!(config.scope, SearchScope::OneLevel);
        assert_eq!(config.page_size, Some(1000));
    }

    #[test]
    fn test_config_validation() {
        let bad_dn = QueryConfig::new().with_base_dn("example.com");
        assert_eq!(bad_dn.validate().unwrap_err().error_code(), "INVALID_CONFIG");

        let zero_page = QueryConfig::new().with_page_size(Some(0));
        assert!(zero_page.validate().is_err());

        let huge_page = QueryConfig::new().with_page_size(Some(MAX_PAGE_SIZE + 1));
        assert!(huge_page.validate().is_err());

        let no_paging = QueryConfig::new()
            .with_base_dn("dc=corp,dc=local")
            .with_page_size(None);
        assert!(no_paging.validate().is_ok());
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("sub".parse::<SearchScope>().unwrap(), SearchScope::Subtree);
        assert_eq!("ONE".parse::<SearchScope>().unwrap(), SearchScope::OneLevel);
        assert_eq!("base".parse::<SearchScope>().unwrap(), SearchScope::Base);
        assert!("children".parse::<SearchScope>().is_err());
        assert_eq!(SearchScope::OneLevel.to_string(), "one_level");
    }

    #[test]
    fn test_scope_into_ldap3() {
        assert!(matches!(
            ldap3::Scope::from(SearchScope::Base),
            ldap3::Scope::Base
        ));
        assert!(matches!(
            ldap3::Scope::from(SearchScope::Subtree),
            ldap3::Scope::Subtree
        ));
    }
}
