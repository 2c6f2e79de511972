//! Simple item filters: equality, approximate match and ordering.

use std::fmt;
use std::str::FromStr;

use super::escape::escape_value;
use super::operand::Operand;
use super::ResolveContext;
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, ValueSource};

/// Filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// `=`
    Equal,
    /// `~=`
    Approx,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
}

impl ComparisonOperator {
    /// Every accepted symbol.
    pub const SYMBOLS: [&'static str; 4] = ["=", "~=", "<=", ">="];

    /// Get the filter symbol.
    #[must_use]
    pub fn as_symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::Approx => "~=",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::GreaterOrEqual => ">=",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(ComparisonOperator::Equal),
            "~=" => Ok(ComparisonOperator::Approx),
            "<=" => Ok(ComparisonOperator::LessOrEqual),
            ">=" => Ok(ComparisonOperator::GreaterOrEqual),
            other => Err(QueryError::invalid_argument(format!(
                "unsupported comparison operator '{other}', expected one of {}",
                Self::SYMBOLS.join(" ")
            ))),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// `(<attr><op><value>)`
#[derive(Debug, Clone)]
pub struct Comparison {
    operand: Operand,
    operator: ComparisonOperator,
}

impl Comparison {
    /// Create a comparison from an operator symbol.
    ///
    /// # Errors
    /// `InvalidArgument` if `symbol` is not one of `=`, `~=`, `<=`, `>=`.
    pub fn new(
        attribute: impl Into<String>,
        symbol: &str,
        value: impl Into<AttributeValue>,
    ) -> QueryResult<Self> {
        let operator = symbol.parse()?;
        Ok(Self::with_operator(
            attribute,
            operator,
            ValueSource::Literal(value.into()),
        ))
    }

    /// Create a comparison from a typed operator.
    #[must_use]
    pub fn with_operator(
        attribute: impl Into<String>,
        operator: ComparisonOperator,
        value: ValueSource,
    ) -> Self {
        Self {
            operand: Operand::new(attribute, value),
            operator,
        }
    }

    #[must_use]
    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    /// Get the filter symbol.
    #[must_use]
    pub fn operator_symbol(&self) -> &'static str {
        self.operator.as_symbol()
    }

    #[must_use]
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub(crate) fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        self.operand.resolve(ctx)?;
        if self.operator != ComparisonOperator::Equal {
            self.operand.reject_flag(self.operator.as_symbol())?;
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
            "({}{}{})",
            attribute,
            self.operator.as_symbol(),
            escape_value(value.as_bytes())
        ))
    }
}
