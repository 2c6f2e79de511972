//! Filter builder
//!
//! Shorthand constructors for [`Expression`] trees. Nothing here adds
//! serialization behaviour; every method returns plain comparison, wildcard,
//! matching-rule or composite nodes.

use crate::error::QueryResult;
use crate::expression::{
    oid, Comparison, ComparisonOperator, Expression, Logical, MatchingRule, Wildcard, WildcardKind,
};
use crate::value::{AttributeValue, ValueSource};

/// Builds filter expressions from predicate vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterBuilder;

impl FilterBuilder {
    /// Create a new filter builder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn compare(
        &self,
        attribute: &str,
        operator: ComparisonOperator,
        value: impl Into<AttributeValue>,
    ) -> Expression {
        Comparison::with_operator(attribute, operator, ValueSource::Literal(value.into())).into()
    }

    fn wildcard(
        &self,
        attribute: &str,
        kind: WildcardKind,
        value: impl Into<AttributeValue>,
    ) -> Expression {
        Wildcard::with_kind(attribute, kind, ValueSource::Literal(value.into())).into()
    }

    /// `(attr=value)`
    #[must_use]
    pub fn eq(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.compare(attribute, ComparisonOperator::Equal, value)
    }

    /// `(attr=value)` with the value computed when the filter is compiled.
    #[must_use]
    pub fn eq_deferred<F>(&self, attribute: &str, value: F) -> Expression
    where
        F: Fn() -> AttributeValue + Send + Sync + 'static,
    {
        Comparison::with_operator(
            attribute,
            ComparisonOperator::Equal,
            ValueSource::deferred(value),
        )
        .into()
    }

    /// `(attr~=value)`
    #[must_use]
    pub fn aeq(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.compare(attribute, ComparisonOperator::Approx, value)
    }

    /// `(attr>=value)`
    #[must_use]
    pub fn gte(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.compare(attribute, ComparisonOperator::GreaterOrEqual, value)
    }

    /// `(attr<=value)`
    #[must_use]
    pub fn lte(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.compare(attribute, ComparisonOperator::LessOrEqual, value)
    }

    /// Strictly greater: `(&(!(attr<=value))(attr=*))`.
    ///
    /// The presence test keeps entries without the attribute out, since
    /// ordering matches are undefined for them.
    #[must_use]
    pub fn gt(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        let not_lte = Logical::not_leaf(self.lte(attribute, value));
        Logical::and([not_lte.into(), self.present(attribute)]).into()
    }

    /// Strictly less: `(&(!(attr>=value))(attr=*))`.
    #[must_use]
    pub fn lt(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        let not_gte = Logical::not_leaf(self.gte(attribute, value));
        Logical::and([not_gte.into(), self.present(attribute)]).into()
    }

    /// `(attr=value*)`
    #[must_use]
    pub fn starts_with(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.wildcard(attribute, WildcardKind::StartsWith, value)
    }

    /// `(attr=*value)`
    #[must_use]
    pub fn ends_with(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.wildcard(attribute, WildcardKind::EndsWith, value)
    }

    /// `(attr=*value*)`
    #[must_use]
    pub fn contains(&self, attribute: &str, value: impl Into<AttributeValue>) -> Expression {
        self.wildcard(attribute, WildcardKind::Contains, value)
    }

    /// `(attr=pattern)` where `*` in `pattern` is a wildcard.
    #[must_use]
    pub fn like(&self, attribute: &str, pattern: impl Into<AttributeValue>) -> Expression {
        self.wildcard(attribute, WildcardKind::Like, pattern)
    }

    /// `(attr=*)`
    #[must_use]
    pub fn present(&self, attribute: &str) -> Expression {
        Wildcard::present(attribute).into()
    }

    /// `(!(attr=*))`
    #[must_use]
    pub fn not_present(&self, attribute: &str) -> Expression {
        Logical::not_leaf(self.present(attribute)).into()
    }

    /// Every bit of `mask` is set.
    #[must_use]
    pub fn bitwise_and(&self, attribute: &str, mask: impl Into<AttributeValue>) -> Expression {
        MatchingRule::well_known(attribute, oid::BITWISE_AND, ValueSource::Literal(mask.into()))
            .into()
    }

    /// Not every bit of `mask` is set: `(!(attr:1.2.840.113556.1.4.803:=mask))`.
    #[must_use]
    pub fn not_bitwise_and(&self, attribute: &str, mask: impl Into<AttributeValue>) -> Expression {
        Logical::not_leaf(self.bitwise_and(attribute, mask)).into()
    }

    /// Any bit of `mask` is set.
    #[must_use]
    pub fn bitwise_or(&self, attribute: &str, mask: impl Into<AttributeValue>) -> Expression {
        MatchingRule::well_known(attribute, oid::BITWISE_OR, ValueSource::Literal(mask.into()))
            .into()
    }

    /// `attribute` links to `dn` directly or through any chain of links.
    #[must_use]
    pub fn in_chain(&self, attribute: &str, dn: impl Into<AttributeValue>) -> Expression {
        MatchingRule::well_known(attribute, oid::IN_CHAIN, ValueSource::Literal(dn.into())).into()
    }

    /// `(attr:oid:=value)`
    ///
    /// # Errors
    /// `InvalidArgument` for a malformed matching rule identifier.
    pub fn match_rule(
        &self,
        attribute: &str,
        rule: &str,
        value: impl Into<AttributeValue>,
    ) -> QueryResult<Expression> {
        MatchingRule::new(attribute, rule, value).map(Into::into)
    }

    /// AND of all children.
    #[must_use]
    pub fn and(&self, children: impl IntoIterator<Item = Expression>) -> Expression {
        Logical::and(children).into()
    }

    /// OR of all children.
    #[must_use]
    pub fn or(&self, children: impl IntoIterator<Item = Expression>) -> Expression {
        Logical::or(children).into()
    }

    /// Negate a leaf.
    ///
    /// # Errors
    /// `QuerySyntax` if `child` is a composite.
    pub fn not(&self, child: Expression) -> QueryResult<Expression> {
        Logical::not(child).map(Into::into)
    }

    /// Object-class selector: `(objectClass=c)` for one class, an OR for more.
    #[must_use]
    pub fn from<S: AsRef<str>>(&self, object_classes: impl IntoIterator<Item = S>) -> Expression {
        Logical::from_classes(
            object_classes
                .into_iter()
                .map(|class| self.eq("objectClass", class.as_ref())),
        )
        .into()
    }
}
