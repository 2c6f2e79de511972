//! Query compilation
//!
//! Binds a converter registry, a config and an optional schema, and turns
//! expressions into [`SearchRequest`]s ready for a transport.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::{QueryConfig, SearchScope};
use crate::converter::ConverterRegistry;
use crate::error::QueryResult;
use crate::expression::{Expression, Logical, ResolveContext};
use crate::hydrator::Hydrator;
use crate::schema::ObjectSchema;

/// Everything a transport needs to run one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub filter: String,
    pub base_dn: String,
    pub scope: SearchScope,
    /// Directory attribute names to return. Empty means all.
    pub attributes: Vec<String>,
    pub page_size: Option<u32>,
}

impl SearchRequest {
    /// The scope as the `ldap3` client expects it.
    #[must_use]
    pub fn ldap_scope(&self) -> ldap3::Scope {
        self.scope.into()
    }

    /// Attribute list in the form `ldap3` search calls take.
    #[must_use]
    pub fn attribute_refs(&self) -> Vec<&str> {
        self.attributes.iter().map(String::as_str).collect()
    }

    /// JSON form, for logging or handing to an out-of-process transport.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::json!({}))
    }
}

/// Compiles expressions against one schema.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    registry: Arc<ConverterRegistry>,
    config: QueryConfig,
    schema: Option<Arc<ObjectSchema>>,
}

impl QueryCompiler {
    /// Create a compiler.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `config` does not validate.
    pub fn new(registry: Arc<ConverterRegistry>, config: QueryConfig) -> QueryResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            config,
            schema: None,
        })
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Arc<ObjectSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn schema(&self) -> Option<&ObjectSchema> {
        self.schema.as_deref()
    }

    /// Compile `expression` selecting the schema's default attributes.
    pub fn compile(&self, expression: &Expression) -> QueryResult<SearchRequest> {
        let selected = self
            .schema
            .as_deref()
            .map(ObjectSchema::attributes_to_select)
            .unwrap_or_default();
        self.compile_selecting(expression, selected)
    }

    /// Compile `expression` selecting the given domain attributes.
    ///
    /// The expression is cloned and resolved, AND-ed with the schema's scoping
    /// filter and serialized. The original is left untouched.
    #[instrument(skip(self, expression, selected))]
    pub fn compile_selecting<S: AsRef<str>>(
        &self,
        expression: &Expression,
        selected: &[S],
    ) -> QueryResult<SearchRequest> {
        let schema = self.schema.as_deref();

        let mut ctx = ResolveContext::new(&self.registry).strict(self.config.strict_schema);
        if let Some(schema) = schema {
            ctx = ctx.with_schema(schema);
        }

        let mut resolved = expression.clone();
        resolved.resolve(&ctx)?;

        // The scoping filter names directory attributes, so strict mode does
        // not apply to it.
        if let Some(scoping) = schema.and_then(ObjectSchema::filter) {
            let mut scoping = scoping.clone();
            scoping.resolve(&ctx.strict(false))?;
            resolved = Logical::and([scoping, resolved]).into();
        }
        let filter = resolved.to_filter()?;

        let attributes = match schema {
            Some(schema) => schema.directory_attributes(selected),
            None => selected.iter().map(|s| s.as_ref().to_string()).collect(),
        };

        let request = SearchRequest {
            filter,
            base_dn: schema
                .and_then(ObjectSchema::base_dn)
                .unwrap_or(&self.config.base_dn)
                .to_string(),
            scope: schema
                .and_then(ObjectSchema::scope)
                .unwrap_or(self.config.scope),
            attributes,
            page_size: schema
                .and_then(ObjectSchema::page_size)
                .or(self.config.page_size),
        };

        debug!(
            filter = %request.filter,
            base_dn = %request.base_dn,
            scope = %request.scope,
            attributes = request.attributes.len(),
            "Compiled search request"
        );
        Ok(request)
    }

    /// A hydrator bound to this compiler's registry and schema.
    #[must_use]
    pub fn hydrator(&self, selected: Option<Vec<String>>) -> Hydrator {
        let mut hydrator = Hydrator::new(Arc::clone(&self.registry));
        if let Some(schema) = &self.schema {
            hydrator = hydrator.with_schema(Arc::clone(schema));
        }
        if let Some(selected) = selected {
            hydrator = hydrator.with_selected(selected);
        }
        hydrator
    }
}
