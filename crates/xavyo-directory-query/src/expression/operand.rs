//! Attribute/value state shared by every leaf node.

use tracing::debug;

use super::escape::validate_attribute_name;
use super::matching_rule::{oid, MatchingRule};
use super::{Expression, Logical, ResolveContext};
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, RawValue, ValueSource};

/// A boolean compared against a flag converter, which the directory can only
/// answer with a bitwise-and test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagMatch {
    pub converter: String,
    pub mask: u32,
    pub set: bool,
}

impl FlagMatch {
    /// `(attr:1.2.840.113556.1.4.803:=mask)`, negated when the flag must be
    /// clear.
    pub(crate) fn to_filter(&self, attribute: &str) -> QueryResult<String> {
        let test: Expression = MatchingRule::well_known(
            attribute,
            oid::BITWISE_AND,
            ValueSource::Literal(AttributeValue::Integer(i64::from(self.mask))),
        )
        .into();
        if self.set {
            test.to_filter()
        } else {
            Logical::not_leaf(test).to_filter()
        }
    }
}

/// The attribute and value a leaf node compares against, plus the state
/// produced by resolving it against a schema.
#[derive(Debug, Clone)]
pub struct Operand {
    attribute: String,
    translated_attribute: String,
    value: ValueSource,
    converted_value: Option<RawValue>,
    converter_was_used: bool,
    use_converter: bool,
    flag: Option<FlagMatch>,
}

impl Operand {
    pub(crate) fn new(attribute: impl Into<String>, value: ValueSource) -> Self {
        Self {
            attribute: attribute.into(),
            translated_attribute: String::new(),
            value,
            converted_value: None,
            converter_was_used: false,
            use_converter: true,
            flag: None,
        }
    }

    pub(crate) fn without_converter(mut self) -> Self {
        self.use_converter = false;
        self
    }

    /// The domain attribute name as given.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The directory attribute name, empty until resolved against a schema.
    #[must_use]
    pub fn translated_attribute(&self) -> &str {
        &self.translated_attribute
    }

    /// The name written into the filter.
    #[must_use]
    pub fn filter_attribute(&self) -> &str {
        if self.translated_attribute.is_empty() {
            &self.attribute
        } else {
            &self.translated_attribute
        }
    }

    /// The raw comparison value.
    #[must_use]
    pub fn value(&self) -> &ValueSource {
        &self.value
    }

    #[must_use]
    pub fn converted_value(&self) -> Option<&RawValue> {
        self.converted_value.as_ref()
    }

    #[must_use]
    pub fn converter_was_used(&self) -> bool {
        self.converter_was_used
    }

    #[must_use]
    pub fn use_converter(&self) -> bool {
        self.use_converter
    }

    /// The bit test a flag converter turned this operand into, if any.
    #[must_use]
    pub fn flag_match(&self) -> Option<&FlagMatch> {
        self.flag.as_ref()
    }

    /// Fail when a flag converter ran for a filter that cannot express a bit
    /// test.
    pub(crate) fn reject_flag(&self, filter: &str) -> QueryResult<()> {
        match &self.flag {
            Some(flag) => Err(QueryError::conversion(
                flag.converter.clone(),
                format!(
                    "'{}' is a flag and only supports equality or bitwise-and, not {filter}",
                    self.attribute
                ),
            )),
            None => Ok(()),
        }
    }

    /// Translate the attribute, settle a deferred value and apply the schema's
    /// converter.
    ///
    /// Any state from an earlier resolution is discarded first.
    pub(crate) fn resolve(&mut self, ctx: &ResolveContext<'_>) -> QueryResult<()> {
        self.translated_attribute.clear();
        self.converted_value = None;
        self.converter_was_used = false;
        self.flag = None;
        self.value.settle();

        let Some(schema) = ctx.schema() else {
            return Ok(());
        };

        self.translated_attribute = if ctx.is_strict() {
            schema.attribute_to_directory_strict(&self.attribute)?
        } else {
            schema.attribute_to_directory(&self.attribute)
        }
        .to_string();

        if !self.use_converter {
            return Ok(());
        }

        if let Some(name) = schema.converter_for(&self.attribute) {
            let converter = ctx.registry().get(name)?;
            let value = self.value.evaluate();
            if let (Some(mask), AttributeValue::Boolean(set)) = (converter.flag_mask(), &value) {
                self.flag = Some(FlagMatch {
                    converter: name.to_string(),
                    mask,
                    set: *set,
                });
            }
            let converted = converter.to_directory(&value)?;
            debug!(
                attribute = %self.attribute,
                converter = %name,
                "Converted filter value"
            );
            self.converted_value = Some(converted);
            self.converter_was_used = true;
        }
        Ok(())
    }

    /// The value serialization uses: the converted value when a converter ran,
    /// otherwise the raw value in plain directory form.
    pub(crate) fn filter_value(&self) -> QueryResult<RawValue> {
        match (&self.converted_value, self.converter_was_used) {
            (Some(converted), true) => Ok(converted.clone()),
            _ => self.value.evaluate().to_raw(),
        }
    }

    pub(crate) fn checked_attribute(&self) -> QueryResult<&str> {
        let name = self.filter_attribute();
        validate_attribute_name(name)?;
        Ok(name)
    }
}

