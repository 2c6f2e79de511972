//! Object schemas
//!
//! An [`ObjectSchema`] describes one object type in one directory: which
//! directory attribute each domain name maps to, which converter applies to
//! each domain name, what is selected by default and how searches for the type
//! are scoped.
//!
//! Lookups are case-insensitive. The declared maps keep their case and order;
//! folded indexes are derived from them and rebuilt whenever a map is replaced.
//! Several domain names may map onto one directory attribute, each with its own
//! converter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::SearchScope;
use crate::error::{QueryError, QueryResult};
use crate::expression::{Comparison, ComparisonOperator, Expression, Logical};
use crate::value::{AttributeValue, ValueSource};

/// Domain-to-directory description of one object type.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    schema_name: String,
    object_type: String,
    attribute_map: IndexMap<String, String>,
    converter_map: IndexMap<String, String>,
    attributes_to_select: Vec<String>,
    required_attributes: Vec<String>,
    default_values: IndexMap<String, AttributeValue>,
    repository: Option<String>,
    rdn: Vec<String>,
    base_dn: Option<String>,
    scope: Option<SearchScope>,
    page_size: Option<u32>,
    filter: Option<Expression>,

    // Derived, rebuilt from the maps above.
    attribute_index: HashMap<String, String>,
    alias_index: HashMap<String, Vec<String>>,
    converter_index: HashMap<String, String>,
    default_index: HashMap<String, String>,
}

impl ObjectSchema {
    /// Create an empty schema for `object_type` in `schema_name`.
    #[must_use]
    pub fn new(schema_name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            object_type: object_type.into(),
            attribute_map: IndexMap::new(),
            converter_map: IndexMap::new(),
            attributes_to_select: Vec::new(),
            required_attributes: Vec::new(),
            default_values: IndexMap::new(),
            repository: None,
            rdn: Vec::new(),
            base_dn: None,
            scope: None,
            page_size: None,
            filter: None,
            attribute_index: HashMap::new(),
            alias_index: HashMap::new(),
            converter_index: HashMap::new(),
            default_index: HashMap::new(),
        }
    }

    // Builders

    /// Set the domain -> directory attribute map.
    #[must_use]
    pub fn with_attribute_map<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_attribute_map(map);
        self
    }

    /// Set the domain name -> converter name map.
    #[must_use]
    pub fn with_converter_map<K, V>(mut self, map: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_converter_map(map);
        self
    }

    /// Set the default projection.
    #[must_use]
    pub fn with_attributes_to_select<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes_to_select = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_required_attributes<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set values filled in for selected attributes an entry does not carry.
    #[must_use]
    pub fn with_default_values<K: Into<String>>(
        mut self,
        values: impl IntoIterator<Item = (K, AttributeValue)>,
    ) -> Self {
        self.set_default_values(values);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Set the relative distinguished name attribute(s).
    #[must_use]
    pub fn with_rdn<S: Into<String>>(mut self, rdn: impl IntoIterator<Item = S>) -> Self {
        self.rdn = rdn.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = Some(base_dn.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the filter that scopes every search to this object type.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<Expression>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    // Setters. Each replaces the map and rebuilds its index.

    pub fn set_attribute_map<K, V>(&mut self, map: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attribute_map = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        self.attribute_index.clear();
        self.alias_index.clear();
        for (domain, directory) in &self.attribute_map {
            self.attribute_index
                .insert(domain.to_lowercase(), directory.clone());
            self.alias_index
                .entry(directory.to_lowercase())
                .or_default()
                .push(domain.clone());
        }
    }

    pub fn set_converter_map<K, V>(&mut self, map: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.converter_map = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.converter_index = self
            .converter_map
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
    }

    pub fn set_default_values<K: Into<String>>(
        &mut self,
        values: impl IntoIterator<Item = (K, AttributeValue)>,
    ) {
        self.default_values = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.default_index = self
            .default_values
            .keys()
            .map(|k| (k.to_lowercase(), k.clone()))
            .collect();
    }

    // Lookups

    /// Translate a domain name to its directory name.
    ///
    /// Unmapped names are assumed to already be directory names and are
    /// returned unchanged.
    #[must_use]
    pub fn attribute_to_directory<'a>(&'a self, name: &'a str) -> &'a str {
        self.attribute_index
            .get(&name.to_lowercase())
            .map_or(name, String::as_str)
    }

    /// Translate a domain name, failing when the schema does not map it.
    pub fn attribute_to_directory_strict(&self, name: &str) -> QueryResult<&str> {
        self.attribute_index
            .get(&name.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| {
                debug!(attribute = %name, schema = %self.id(), "Unmapped attribute in strict mode");
                QueryError::UnmappedAttribute {
                    attribute: name.to_string(),
                    schema: self.id(),
                }
            })
    }

    /// Check if a domain name is mapped.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_index.contains_key(&name.to_lowercase())
    }

    /// Every domain name mapped onto `directory_name`, in declaration order.
    #[must_use]
    pub fn names_mapped_to(&self, directory_name: &str) -> &[String] {
        self.alias_index
            .get(&directory_name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn has_names_mapped_to(&self, directory_name: &str) -> bool {
        !self.names_mapped_to(directory_name).is_empty()
    }

    /// The converter declared for a domain name.
    #[must_use]
    pub fn converter_for(&self, name: &str) -> Option<&str> {
        self.converter_index
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    /// The default value declared for a name.
    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&AttributeValue> {
        self.default_index
            .get(&name.to_lowercase())
            .and_then(|key| self.default_values.get(key))
    }

    /// Translate names to directory names, dropping case-insensitive duplicates.
    #[must_use]
    pub fn directory_attributes<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut seen = HashSet::with_capacity(names.len());
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let directory = self.attribute_to_directory(name.as_ref());
            if seen.insert(directory.to_lowercase()) {
                out.push(directory.to_string());
            }
        }
        out
    }

    // Getters

    /// `schema_name/object_type`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}", self.schema_name, self.object_type)
    }

    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    #[must_use]
    pub fn attribute_map(&self) -> &IndexMap<String, String> {
        &self.attribute_map
    }

    #[must_use]
    pub fn converter_map(&self) -> &IndexMap<String, String> {
        &self.converter_map
    }

    #[must_use]
    pub fn attributes_to_select(&self) -> &[String] {
        &self.attributes_to_select
    }

    #[must_use]
    pub fn required_attributes(&self) -> &[String] {
        &self.required_attributes
    }

    #[must_use]
    pub fn default_values(&self) -> &IndexMap<String, AttributeValue> {
        &self.default_values
    }

    #[must_use]
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    #[must_use]
    pub fn rdn(&self) -> &[String] {
        &self.rdn
    }

    #[must_use]
    pub fn base_dn(&self) -> Option<&str> {
        self.base_dn.as_deref()
    }

    #[must_use]
    pub fn scope(&self) -> Option<SearchScope> {
        self.scope
    }

    #[must_use]
    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }
}

/// Serializable schema description, as produced by a schema-file loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchemaDefinition {
    pub schema_name: String,
    pub object_type: String,

    /// `objectClass` values; several are OR-ed together.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_class: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_category: Option<String>,

    /// Domain name -> directory name.
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Domain name -> converter name.
    #[serde(default)]
    pub converters: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes_to_select: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_attributes: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub default_values: IndexMap<String, AttributeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rdn: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ObjectSchemaDefinition {
    /// Build the scoping filter from `object_class` and `object_category`.
    #[must_use]
    pub fn scoping_filter(&self) -> Option<Expression> {
        let eq = |attr: &str, value: &str| -> Expression {
            Comparison::with_operator(
                attr,
                ComparisonOperator::Equal,
                ValueSource::Literal(value.into()),
            )
            .into()
        };

        let classes = (!self.object_class.is_empty()).then(|| -> Expression {
            Logical::from_classes(self.object_class.iter().map(|c| eq("objectClass", c))).into()
        });
        let category = self
            .object_category
            .as_deref()
            .map(|c| eq("objectCategory", c));

        match (classes, category) {
            (Some(classes), Some(category)) => Some(Logical::and([category, classes]).into()),
            (classes, category) => classes.or(category),
        }
    }
}

impl TryFrom<ObjectSchemaDefinition> for ObjectSchema {
    type Error = QueryError;

    fn try_from(def: ObjectSchemaDefinition) -> QueryResult<Self> {
        if def.schema_name.trim().is_empty() || def.object_type.trim().is_empty() {
            return Err(QueryError::InvalidConfiguration {
                message: "schema_name and object_type are required".to_string(),
            });
        }
        if let Some(size) = def.page_size.filter(|s| *s == 0) {
            return Err(QueryError::InvalidConfiguration {
                message: format!(
                    "page_size {size} for {}/{} must be positive",
                    def.schema_name, def.object_type
                ),
            });
        }

        let filter = def.scoping_filter();
        let mut schema = ObjectSchema::new(def.schema_name, def.object_type)
            .with_attribute_map(def.attributes)
            .with_converter_map(def.converters)
            .with_attributes_to_select(def.attributes_to_select)
            .with_required_attributes(def.required_attributes)
            .with_default_values(def.default_values)
            .with_rdn(def.rdn);

        schema.repository = def.repository;
        schema.base_dn = def.base_dn;
        schema.scope = def.scope;
        schema.page_size = def.page_size;
        schema.filter = filter;

        debug!(
            schema = %schema.id(),
            attributes = schema.attribute_map.len(),
            converters = schema.converter_map.len(),
            "Loaded object schema"
        );
        Ok(schema)
    }
}
