//! Filter expression tree
//!
//! An [`Expression`] is built from domain attribute names, resolved against an
//! [`ObjectSchema`] and a [`ConverterRegistry`], and then serialized into an
//! RFC 4515 filter string.
//!
//! Resolution translates each leaf's attribute to its directory name, settles
//! deferred values and runs the schema's converter on the comparison value.
//! A boolean compared against a flag converter serializes as a bitwise-and
//! test, negated for `false`.
//! A resolved tree is tied to the schema it was resolved against; resolve a
//! clone when the same tree is compiled for several schemas.

mod comparison;
mod escape;
mod logical;
mod matching_rule;
mod operand;
mod wildcard;

use std::fmt;

use crate::converter::ConverterRegistry;
use crate::error::QueryResult;
use crate::schema::ObjectSchema;

pub use comparison::{Comparison, ComparisonOperator};
pub use escape::{escape_like_value, escape_value, validate_attribute_name};
pub use logical::{Logical, LogicalKind};
pub use matching_rule::{oid, MatchingRule};
pub use operand::{FlagMatch, Operand};
pub use wildcard::{Wildcard, WildcardKind};

/// What an expression is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    registry: &'a ConverterRegistry,
    schema: Option<&'a ObjectSchema>,
    strict: bool,
}

impl<'a> ResolveContext<'a> {
    /// Resolve without a schema: attribute names pass through untouched and no
    /// converter runs.
    #[must_use]
    pub fn new(registry: &'a ConverterRegistry) -> Self {
        Self {
            registry,
            schema: None,
            strict: false,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &'a ObjectSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Reject attributes the schema does not map.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &'a ConverterRegistry {
        self.registry
    }

    #[must_use]
    pub fn schema(&self) -> Option<&'a ObjectSchema> {
        self.schema
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

/// A search filter node.
#[derive(Debug, Clone)]
pub enum Expression {
    Comparison(Comparison),
    Wildcard(Wildcard),
    MatchingRule(MatchingRule),
    Logical(Logical),
}

impl Expression {
    /// Check if this node holds children.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Expression::Logical(_))
    }

    /// The leaf's shared attribute/value state, `None` for composites.
    #[must_use]
    pub fn operand(&self) -> Option<&Operand> {
        match self {
            Expression::Comparison(c) => Some(c.operand()),
            Expression::Wildcard(w) => Some(w.operand()),
            Expression::MatchingRule(m) => Some(m.operand()),
            Expression::Logical(_) => None,
        }
    }

    /// The composite node, `None` for leaves.
    #[must_use]
    pub fn as_logical(&self) -> Option<&Logical> {
        match self {
            Expression::Logical(l) => Some(l),
            _ => None,
        }
    }

    /// Resolve this node and every descendant.
    ///
    /// # Errors
    /// `ConverterNotFound` when the schema names an unregistered converter,
    /// `ConversionFailed` when a converter rejects a value and
    /// `UnmappedAttribute` in strict mode.
    pub fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        match self {
            Expression::Comparison(c) => c.resolve(ctx),
            Expression::Wildcard(w) => w.resolve(ctx),
            Expression::MatchingRule(m) => m.resolve(ctx),
            Expression::Logical(l) => l.resolve(ctx),
        }
    }

    /// Serialize to RFC 4515 filter syntax.
    ///
    /// # Errors
    /// `QuerySyntax` for invalid attribute names and empty composites,
    /// `InvalidArgument` for values with no single directory form.
    pub fn to_filter(&self) -> QueryResult<String> {
        match self {
            Expression::Comparison(c) => c.to_filter(),
            Expression::Wildcard(w) => w.to_filter(),
            Expression::MatchingRule(m) => m.to_filter(),
            Expression::Logical(l) => l.to_filter(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_filter() {
            Ok(filter) => f.write_str(&filter),
            Err(_) => f.write_str("<invalid filter>"),
        }
    }
}

impl From<Comparison> for Expression {
    fn from(node: Comparison) -> Self {
        Expression::Comparison(node)
    }
}

impl From<Wildcard> for Expression {
    fn from(node: Wildcard) -> Self {
        Expression::Wildcard(node)
    }
}

impl From<MatchingRule> for Expression {
    fn from(node: MatchingRule) -> Self {
        Expression::MatchingRule(node)
    }
}

impl From<Logical> for Expression {
    fn from(node: Logical) -> Self {
        Expression::Logical(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::names;
    use crate::value::{AttributeValue, RawValue, ValueSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn user_schema() -> ObjectSchema {
        ObjectSchema::new("ad", "user")
            .with_attribute_map([
                ("username", "sAMAccountName"),
                ("disabled", "userAccountControl"),
                ("created", "whenCreated"),
            ])
            .with_converter_map([
                ("disabled", names::UAC_DISABLED),
                ("created", names::WINDOWS_GENERALIZED_TIME),
            ])
    }

    #[test]
    fn test_unresolved_uses_domain_name() {
        let expr: Expression = Comparison::new("username", "=", "jdoe").unwrap().into();
        assert_eq!(expr.to_filter().unwrap(), "(username=jdoe)");
        assert_eq!(expr.operand().unwrap().translated_attribute(), "");
    }

    #[test]
    fn test_resolve_translates_and_converts() {
        let registry = ConverterRegistry::with_builtins();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        let mut expr: Expression = Logical::and([
            Comparison::new("username", "=", "jdoe").unwrap().into(),
            Comparison::new("disabled", "=", true).unwrap().into(),
        ])
        .into();
        expr.resolve(&ctx).unwrap();

        assert_eq!(
            expr.to_filter().unwrap(),
            "(&(sAMAccountName=jdoe)(userAccountControl:1.2.840.113556.1.4.803:=2))"
        );
        let leaf = expr.as_logical().unwrap().children()[1].operand().unwrap();
        assert!(leaf.converter_was_used());
        assert_eq!(leaf.converted_value(), Some(&RawValue::from("2")));
        assert_eq!(leaf.flag_match().map(|flag| flag.mask), Some(0x2));
    }

    #[test]
    fn test_flag_equality_tests_the_bit() {
        let registry = ConverterRegistry::with_builtins();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        let mut enabled: Expression = Comparison::new("disabled", "=", false).unwrap().into();
        enabled.resolve(&ctx).unwrap();
        assert_eq!(
            enabled.to_filter().unwrap(),
            "(!(userAccountControl:1.2.840.113556.1.4.803:=2))"
        );

        let mut bit_clear: Expression =
            MatchingRule::new("disabled", oid::BITWISE_AND, false).unwrap().into();
        bit_clear.resolve(&ctx).unwrap();
        assert_eq!(
            bit_clear.to_filter().unwrap(),
            "(!(userAccountControl:1.2.840.113556.1.4.803:=2))"
        );

        // A raw bitfield still compares as a number.
        let mut raw: Expression = Comparison::new("disabled", "=", 514i64).unwrap().into();
        raw.resolve(&ctx).unwrap();
        assert_eq!(raw.to_filter().unwrap(), "(userAccountControl=514)");
    }

    #[test]
    fn test_flag_rejects_non_bit_filters() {
        let registry = ConverterRegistry::with_builtins();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        let rejected: [Expression; 3] = [
            Comparison::new("disabled", ">=", true).unwrap().into(),
            Wildcard::new("disabled", "STARTS_WITH", true).unwrap().into(),
            MatchingRule::new("disabled", oid::BITWISE_OR, true).unwrap().into(),
        ];
        for mut expr in rejected {
            let err = expr.resolve(&ctx).unwrap_err();
            assert_eq!(err.error_code(), "CONVERSION_FAILED", "{expr:?}");
        }
    }

    #[test]
    fn test_resolve_without_converter_keeps_raw_value() {
        let registry = ConverterRegistry::with_builtins();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        let mut expr: Expression = Comparison::new("mail", "=", "a@b.c").unwrap().into();
        expr.resolve(&ctx).unwrap();
        let operand = expr.operand().unwrap();
        assert_eq!(operand.translated_attribute(), "mail");
        assert!(!operand.converter_was_used());
        assert_eq!(expr.to_filter().unwrap(), "(mail=a@b.c)");
    }

    #[test]
    fn test_resolve_strict_rejects_unmapped() {
        let registry = ConverterRegistry::with_builtins();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry)
            .with_schema(&schema)
            .strict(true);

        let mut expr: Expression = Comparison::new("nickname", "=", "jd").unwrap().into();
        let err = expr.resolve(&ctx).unwrap_err();
        assert_eq!(err.error_code(), "UNMAPPED_ATTRIBUTE");
    }

    #[test]
    fn test_resolve_unknown_converter() {
        let registry = ConverterRegistry::new();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        let mut expr: Expression = Comparison::new("disabled", "=", true).unwrap().into();
        let err = expr.resolve(&ctx).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CONVERTER");
    }

    #[test]
    fn test_deferred_value_evaluated_once() {
        let registry = ConverterRegistry::with_builtins();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let value = ValueSource::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            AttributeValue::from("late")
        });

        let mut expr: Expression =
            Comparison::with_operator("cn", ComparisonOperator::Equal, value).into();
        let ctx = ResolveContext::new(&registry);
        expr.resolve(&ctx).unwrap();
        expr.resolve(&ctx).unwrap();

        assert_eq!(expr.to_filter().unwrap(), "(cn=late)");
        assert_eq!(expr.to_filter().unwrap(), "(cn=late)");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_present_skips_converter() {
        let registry = ConverterRegistry::new();
        let schema = user_schema();
        let ctx = ResolveContext::new(&registry).with_schema(&schema);

        // No registry entry for uac_disabled; presence never asks for it.
        let mut expr: Expression = Wildcard::present("disabled").into();
        expr.resolve(&ctx).unwrap();
        assert_eq!(expr.to_filter().unwrap(), "(userAccountControl=*)");
    }

    #[test]
    fn test_display_matches_filter() {
        let expr: Expression = Comparison::new("cn", "=", "x").unwrap().into();
        assert_eq!(expr.to_string(), "(cn=x)");

        let empty: Expression = Logical::new(LogicalKind::Or).into();
        assert_eq!(empty.to_string(), "<invalid filter>");
    }
}
