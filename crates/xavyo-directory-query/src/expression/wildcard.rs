//! Substring, pattern and presence filters.

use std::fmt;
use std::str::FromStr;

use super::escape::{escape_like_value, escape_value};
use super::operand::Operand;
use super::ResolveContext;
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, ValueSource};

/// Where the `*` markers go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `*value*`
    Contains,
    /// `value*`
    StartsWith,
    /// `*value`
    EndsWith,
    /// The value is a pattern; its `*` characters are kept.
    Like,
    /// `*`, value ignored.
    Present,
}

impl WildcardKind {
    /// Get the variant name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WildcardKind::Contains => "CONTAINS",
            WildcardKind::StartsWith => "STARTS_WITH",
            WildcardKind::EndsWith => "ENDS_WITH",
            WildcardKind::Like => "LIKE",
            WildcardKind::Present => "PRESENT",
        }
    }
}

impl FromStr for WildcardKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONTAINS" => Ok(WildcardKind::Contains),
            "STARTS_WITH" => Ok(WildcardKind::StartsWith),
            "ENDS_WITH" => Ok(WildcardKind::EndsWith),
            "LIKE" => Ok(WildcardKind::Like),
            "PRESENT" => Ok(WildcardKind::Present),
            _ => Err(QueryError::invalid_argument(format!(
                "unsupported wildcard '{s}', expected one of CONTAINS STARTS_WITH ENDS_WITH LIKE PRESENT"
            ))),
        }
    }
}

impl fmt::Display for WildcardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An equality filter whose value carries `*` substring markers.
#[derive(Debug, Clone)]
pub struct Wildcard {
    operand: Operand,
    kind: WildcardKind,
}

impl Wildcard {
    /// Create a wildcard filter from a variant name.
    ///
    /// # Errors
    /// `InvalidArgument` for an unknown variant name.
    pub fn new(
        attribute: impl Into<String>,
        kind: &str,
        value: impl Into<AttributeValue>,
    ) -> QueryResult<Self> {
        let kind = kind.parse()?;
        Ok(Self::with_kind(
            attribute,
            kind,
            ValueSource::Literal(value.into()),
        ))
    }

    /// Create a wildcard filter from a typed variant.
    #[must_use]
    pub fn with_kind(attribute: impl Into<String>, kind: WildcardKind, value: ValueSource) -> Self {
        let operand = match kind {
            WildcardKind::Present => {
                Operand::new(attribute, ValueSource::Literal(AttributeValue::Null)).without_converter()
            }
            _ => Operand::new(attribute, value),
        };
        Self { operand, kind }
    }

    /// `(<attr>=*)`
    #[must_use]
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::with_kind(
            attribute,
            WildcardKind::Present,
            ValueSource::Literal(AttributeValue::Null),
        )
    }

    #[must_use]
    pub fn kind(&self) -> WildcardKind {
        self.kind
    }

    #[must_use]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub(crate) fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        self.operand.resolve(ctx)?;
        self.operand.reject_flag(self.kind.as_str())
    }

    pub(crate) fn to_filter(&self) -> QueryResult<String> {
        let attribute = self.operand.checked_attribute()?;
        let pattern = match self.kind {
            WildcardKind::Present => "*".to_string(),
            WildcardKind::Like => escape_like_value(self.operand.filter_value()?.as_bytes()),
            kind => {
                let escaped = escape_value(self.operand.filter_value()?.as_bytes());
                match kind {
                    WildcardKind::Contains => format!("*{escaped}*"),
                    WildcardKind::StartsWith => format!("{escaped}*"),
                    _ => format!("*{escaped}"),
                }
            }
        };
        Ok(format!("({attribute}={pattern})"))
    }
}
