//! Entry hydration
//!
//! Turns raw directory entries back into domain attribute maps: directory
//! names are fanned out to every selected domain alias, each alias gets its
//! own converter, and single values collapse to scalars.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::converter::ConverterRegistry;
use crate::entry::RawEntry;
use crate::error::{QueryError, QueryResult};
use crate::schema::ObjectSchema;
use crate::value::{AttributeValue, RawValue};

/// A hydrated search result, keyed by the names the caller selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HydratedEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    attributes: IndexMap<String, AttributeValue>,
}

impl HydratedEntry {
    #[must_use]
    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    /// Get a value by its exact key.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Get a value by key in any case.
    #[must_use]
    pub fn get_ignore_case(&self, name: &str) -> Option<&AttributeValue> {
        let name = name.to_lowercase();
        self.attributes
            .iter()
            .find(|(key, _)| key.to_lowercase() == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Keys in output order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, AttributeValue> {
        &self.attributes
    }

    #[must_use]
    pub fn into_attributes(self) -> IndexMap<String, AttributeValue> {
        self.attributes
    }

    /// JSON form: `{"dn": ..., "attributes": {...}}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

/// Selected names keyed by their lowercase form, plus the keys filled so far.
struct Projection<'a> {
    selected: IndexMap<String, &'a str>,
    filled: HashSet<String>,
}

impl<'a> Projection<'a> {
    fn new(selection: &'a [String]) -> Self {
        let mut selected = IndexMap::with_capacity(selection.len());
        for name in selection {
            selected.entry(name.to_lowercase()).or_insert(name.as_str());
        }
        Self {
            selected,
            filled: HashSet::with_capacity(selection.len()),
        }
    }

    /// The selected name matching `name` in any case, in the case it was
    /// selected, unless that key is already filled.
    fn claim(&mut self, name: &str) -> Option<&'a str> {
        let key = name.to_lowercase();
        let requested = *self.selected.get(&key)?;
        self.filled.insert(key).then_some(requested)
    }

    /// Selected names nothing was found for.
    fn missing(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.selected
            .iter()
            .filter(|(key, _)| !self.filled.contains(*key))
            .map(|(_, requested)| *requested)
    }
}

/// Converts raw entries into [`HydratedEntry`] values.
#[derive(Debug, Clone)]
pub struct Hydrator {
    registry: Arc<ConverterRegistry>,
    schema: Option<Arc<ObjectSchema>>,
    selected: Option<Vec<String>>,
}

impl Hydrator {
    /// Create a hydrator with no schema (pass-through mode).
    #[must_use]
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self {
            registry,
            schema: None,
            selected: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Arc<ObjectSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Select attributes explicitly instead of using the schema's default
    /// projection. Names are returned in the case given here.
    #[must_use]
    pub fn with_selected<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.selected = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn schema(&self) -> Option<&ObjectSchema> {
        self.schema.as_deref()
    }

    /// The active selection: the explicit list, or the schema default.
    #[must_use]
    pub fn selection(&self) -> &[String] {
        match (&self.selected, &self.schema) {
            (Some(selected), _) => selected.as_slice(),
            (None, Some(schema)) => schema.attributes_to_select(),
            (None, None) => &[],
        }
    }

    /// Hydrate one entry.
    ///
    /// # Errors
    /// `ConverterNotFound` when the schema declares a converter the registry
    /// does not hold, `ConversionFailed` when a converter rejects a value.
    pub fn hydrate(&self, entry: &RawEntry) -> QueryResult<HydratedEntry> {
        let Some(schema) = self.schema.as_deref() else {
            return Ok(pass_through(entry));
        };

        let mut projection = Projection::new(self.selection());
        let mut hydrated = HydratedEntry {
            dn: entry.dn().map(str::to_string),
            attributes: IndexMap::new(),
        };

        for (directory_name, values) in entry.normalized() {
            for alias in schema.names_mapped_to(directory_name) {
                if let Some(requested) = projection.claim(alias) {
                    self.add_converted(&mut hydrated, schema, requested, values)?;
                }
            }
            if let Some(requested) = projection.claim(directory_name) {
                self.add_converted(&mut hydrated, schema, requested, values)?;
            }
        }

        for requested in projection.missing() {
            if let Some(default) = schema.default_value(requested) {
                hydrated
                    .attributes
                    .insert(requested.to_string(), default.clone());
            }
        }

        Ok(hydrated)
    }

    /// Hydrate many entries, keeping their order.
    ///
    /// Stops at the first entry that fails.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn hydrate_all(&self, entries: &[RawEntry]) -> QueryResult<Vec<HydratedEntry>> {
        let hydrated = entries
            .iter()
            .map(|entry| self.hydrate(entry))
            .collect::<QueryResult<Vec<_>>>()?;
        debug!(count = hydrated.len(), "Hydrated directory entries");
        Ok(hydrated)
    }

    /// Add `values` under `key`, applying the converter declared for `key`.
    fn add_converted(
        &self,
        hydrated: &mut HydratedEntry,
        schema: &ObjectSchema,
        key: &str,
        values: &[RawValue],
    ) -> QueryResult<()> {
        let converted = match schema.converter_for(key) {
            Some(name) => {
                let converter = self.registry.get(name)?;
                values
                    .iter()
                    .map(|value| {
                        converter.from_directory(value).map_err(|e| match e {
                            QueryError::ConversionFailed { converter, message } => {
                                QueryError::ConversionFailed {
                                    converter,
                                    message: format!("{key}: {message}"),
                                }
                            }
                            other => other,
                        })
                    })
                    .collect::<QueryResult<Vec<_>>>()?
            }
            None => values
                .iter()
                .cloned()
                .map(RawValue::into_attribute_value)
                .collect(),
        };

        hydrated
            .attributes
            .insert(key.to_string(), collapse(converted));
        Ok(())
    }
}

fn collapse(mut values: Vec<AttributeValue>) -> AttributeValue {
    if values.len() == 1 {
        values.remove(0)
    } else {
        AttributeValue::Array(values)
    }
}

fn pass_through(entry: &RawEntry) -> HydratedEntry {
    let attributes = entry
        .normalized()
        .map(|(name, values)| {
            let values = values
                .iter()
                .cloned()
                .map(RawValue::into_attribute_value)
                .collect();
            (name.to_string(), collapse(values))
        })
        .collect();
    HydratedEntry {
        dn: entry.dn().map(str::to_string),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::names;
    use chrono::{TimeZone, Utc};

    fn registry() -> Arc<ConverterRegistry> {
        Arc::new(ConverterRegistry::with_builtins())
    }

    fn schema() -> Arc<ObjectSchema> {
        Arc::new(
            ObjectSchema::new("ad", "user")
                .with_attribute_map([
                    ("username", "sAMAccountName"),
                    ("created", "whenCreated"),
                    ("createdInt", "whenCreated"),
                    ("groups", "memberOf"),
                ])
                .with_converter_map([
                    ("created", names::GENERALIZED_TIME),
                    ("createdInt", names::INT),
                ])
                .with_attributes_to_select(["username", "groups"]),
        )
    }

    fn entry() -> RawEntry {
        RawEntry::from_pairs([
            ("sAMAccountName", vec!["jdoe"]),
            ("whenCreated", vec!["19960622123421Z"]),
            ("memberOf", vec!["CN=A,DC=corp", "CN=B,DC=corp"]),
            ("givenname", vec!["John"]),
        ])
        .with_dn("CN=jdoe,DC=corp")
    }

    #[test]
    fn test_alias_fan_out() {
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["created", "createdInt"]);
        let result = hydrator.hydrate(&entry()).unwrap();

        assert_eq!(
            result.get("created"),
            Some(&AttributeValue::DateTime(
                Utc.with_ymd_and_hms(1996, 6, 22, 12, 34, 21).unwrap()
            ))
        );
        assert_eq!(
            result.get("createdInt"),
            Some(&AttributeValue::Integer(19_960_622_123_421))
        );
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_requested_case_preserved() {
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["GivenName", "USERNAME"]);
        let result = hydrator.hydrate(&entry()).unwrap();

        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, ["USERNAME", "GivenName"]);
        assert_eq!(result.get("GivenName"), Some(&AttributeValue::from("John")));
    }

    #[test]
    fn test_default_selection_and_collapse() {
        let hydrator = Hydrator::new(registry()).with_schema(schema());
        let result = hydrator.hydrate(&entry()).unwrap();

        assert_eq!(result.dn(), Some("CN=jdoe,DC=corp"));
        assert_eq!(result.get("username"), Some(&AttributeValue::from("jdoe")));
        assert_eq!(
            result.get("groups"),
            Some(&AttributeValue::Array(vec![
                "CN=A,DC=corp".into(),
                "CN=B,DC=corp".into()
            ]))
        );
        assert!(result.get("givenname").is_none());
        assert!(result.get("created").is_none());
    }

    #[test]
    fn test_case_variant_selection_fills_once() {
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["Username", "USERNAME", "username"]);
        let result = hydrator.hydrate(&entry()).unwrap();

        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, ["Username"]);
    }

    #[test]
    fn test_non_ascii_names_fold_like_schema() {
        let schema = Arc::new(
            ObjectSchema::new("ldap", "person")
                .with_attribute_map([("Größe", "height")])
                .with_default_values([("ÄMTER", AttributeValue::from("none"))]),
        );
        let raw = RawEntry::from_pairs([("height", vec!["180"])]);
        let result = Hydrator::new(registry())
            .with_schema(schema)
            .with_selected(["GRÖSSE", "größe", "ämter"])
            .hydrate(&raw)
            .unwrap();

        assert_eq!(result.get("größe"), Some(&AttributeValue::from("180")));
        assert_eq!(result.get("ämter"), Some(&AttributeValue::from("none")));
        assert!(result.get("GRÖSSE").is_none());
    }

    #[test]
    fn test_native_and_alias_both_selected() {
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["created", "whenCreated"]);
        let result = hydrator.hydrate(&entry()).unwrap();

        assert!(matches!(result.get("created"), Some(AttributeValue::DateTime(_))));
        assert_eq!(
            result.get("whenCreated"),
            Some(&AttributeValue::from("19960622123421Z"))
        );
    }

    #[test]
    fn test_missing_converter_is_an_error() {
        let hydrator = Hydrator::new(Arc::new(ConverterRegistry::new()))
            .with_schema(schema())
            .with_selected(["created"]);
        let err = hydrator.hydrate(&entry()).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CONVERTER");
    }

    #[test]
    fn test_conversion_failure_names_attribute() {
        let raw = RawEntry::from_pairs([("whenCreated", vec!["yesterday"])]);
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["created"]);
        let err = hydrator.hydrate(&raw).unwrap_err();
        assert!(err.to_string().contains("created:"), "{err}");
    }

    #[test]
    fn test_pass_through_without_schema() {
        let hydrator = Hydrator::new(registry());
        let result = hydrator.hydrate(&entry()).unwrap();
        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(
            keys,
            ["sAMAccountName", "whenCreated", "memberOf", "givenname"]
        );
        assert_eq!(result.get("givenname"), Some(&AttributeValue::from("John")));
    }

    #[test]
    fn test_default_values_fill_missing() {
        let schema = Arc::new(
            ObjectSchema::new("ad", "user")
                .with_attribute_map([("department", "department")])
                .with_default_values([("department", AttributeValue::from("unassigned"))]),
        );
        let hydrator = Hydrator::new(registry())
            .with_schema(schema)
            .with_selected(["Department"]);
        let result = hydrator.hydrate(&entry()).unwrap();
        assert_eq!(
            result.get("Department"),
            Some(&AttributeValue::from("unassigned"))
        );
    }

    #[test]
    fn test_hydrate_all_preserves_order() {
        let hydrator = Hydrator::new(registry())
            .with_schema(schema())
            .with_selected(["username"]);
        let entries = vec![
            RawEntry::from_pairs([("sAMAccountName", vec!["b"])]),
            RawEntry::from_pairs([("sAMAccountName", vec!["a"])]),
        ];
        let results = hydrator.hydrate_all(&entries).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.get("username").cloned()).collect();
        assert_eq!(
            names,
            [Some(AttributeValue::from("b")), Some(AttributeValue::from("a"))]
        );
    }
}
