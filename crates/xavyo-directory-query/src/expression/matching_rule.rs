//! Extensible-match filters (`attr:oid:=value`).

use regex::Regex;
use std::sync::LazyLock;

use super::escape::escape_value;
use super::operand::Operand;
use super::ResolveContext;
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, ValueSource};

/// Well-known matching rule identifiers.
pub mod oid {
    /// `LDAP_MATCHING_RULE_BIT_AND`
    pub const BITWISE_AND: &str = "1.2.840.113556.1.4.803";
    /// `LDAP_MATCHING_RULE_BIT_OR`
    pub const BITWISE_OR: &str = "1.2.840.113556.1.4.804";
    /// `LDAP_MATCHING_RULE_IN_CHAIN`, transitive evaluation of DN-valued links.
    pub const IN_CHAIN: &str = "1.2.840.113556.1.4.1941";
}

/// Numeric OID or a descriptor name.
static MATCHING_RULE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-2](?:\.(?:0|[1-9][0-9]*))+|[A-Za-z][A-Za-z0-9-]*)$")
        .expect("MATCHING_RULE_ID_RE is a valid regex pattern")
});

#[derive(Debug, Clone)]
pub struct MatchingRule {
    operand: Operand,
    oid: String,
}

impl MatchingRule {
    /// Create an extensible match.
    ///
    /// # Errors
    /// `InvalidArgument` if `oid` is neither a numeric OID nor a descriptor.
    pub fn new(
        attribute: impl Into<String>,
        oid: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> QueryResult<Self> {
        Self::with_value(attribute, oid, ValueSource::Literal(value.into()))
    }

    /// Create an extensible match with any value source.
    pub fn with_value(
        attribute: impl Into<String>,
        oid: impl Into<String>,
        value: ValueSource,
    ) -> QueryResult<Self> {
        let oid = oid.into();
        if !MATCHING_RULE_ID_RE.is_match(&oid) {
            return Err(QueryError::invalid_argument(format!(
                "'{oid}' is not a valid matching rule identifier"
            )));
        }
        Ok(Self {
            operand: Operand::new(attribute, value),
            oid,
        })
    }

    /// Build a match for one of the [`oid`] constants.
    pub(crate) fn well_known(
        attribute: impl Into<String>,
        oid: &'static str,
        value: ValueSource,
    ) -> Self {
        Self {
            operand: Operand::new(attribute, value),
            oid: oid.to_string(),
        }
    }

    #[must_use]
    pub fn oid(&self) -> &str {
        &self.oid
    }

    #[must_use]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub(crate) fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        self.operand.resolve(ctx)?;
        if self.oid != oid::BITWISE_AND {
            self.operand.reject_flag(&self.oid)?;
        }
        Ok(())
    }

    pub(crate) fn to_filter(&self) -> QueryResult<String> {
        let attribute = self.operand.checked_attribute()?;
        if let Some(flag) = self.operand.flag_match() {
            return flag.to_filter(attribute);
        }
        let value = self.operand.filter_value()?;
        Ok(format!(
            "({}:{}:={})",
            attribute,
            self.oid,
            escape_value(value.as_bytes())
        ))
    }
}
