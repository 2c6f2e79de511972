//! Attribute converters and the converter registry.
//!
//! A converter is a stateless, bidirectional transform between a domain value
//! and its directory representation. Converters are looked up by name through a
//! [`ConverterRegistry`], which is built once (usually with
//! [`ConverterRegistry::with_builtins`]), optionally extended, and then shared
//! read-only behind an `Arc`.

mod standard;
mod windows;

use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, RawValue};

pub use standard::{BoolConverter, GeneralizedTimeConverter, IntConverter};
pub use windows::{
    FlagConverter, WindowsGeneralizedTimeConverter, WindowsGuidConverter, WindowsSidConverter,
    WindowsTimeConverter,
};

/// Bidirectional value transform between domain and directory form.
pub trait AttributeConverter: Send + Sync {
    /// Convert a domain value into the form the directory stores.
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue>;

    /// Convert a stored directory value into its domain form.
    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue>;

    /// The bit a boolean domain value stands for, when this converter exposes
    /// one bit of an integer bitfield. Filters then test the bit instead of
    /// comparing the whole attribute.
    fn flag_mask(&self) -> Option<u32> {
        None
    }
}

/// Shared handle to a registered converter.
pub type SharedConverter = Arc<dyn AttributeConverter>;

static CONVERTER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("CONVERTER_NAME_RE is a valid regex pattern")
});

/// Name-keyed table of converters. Lookups are case-insensitive.
///
/// `Default` holds every built-in; [`ConverterRegistry::new`] starts empty.
#[derive(Clone)]
pub struct ConverterRegistry {
    /// Lowercased name -> (name as registered, converter).
    converters: IndexMap<String, (String, SharedConverter)>,
}

impl ConverterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: IndexMap::new(),
        }
    }

    /// Create a registry holding every built-in converter.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, converter) in builtin_converters() {
            registry
                .converters
                .insert(name.to_lowercase(), (name.to_string(), converter));
        }
        registry
    }

    /// Register a converter under a new name.
    ///
    /// # Errors
    /// `ConverterAlreadyRegistered` if the name is taken, `InvalidConverter` if
    /// the name is not a valid converter identifier.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        converter: impl AttributeConverter + 'static,
    ) -> QueryResult<()> {
        self.register_shared(name, Arc::new(converter))
    }

    /// Register an already shared converter under a new name.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        converter: SharedConverter,
    ) -> QueryResult<()> {
        let name = name.into();
        if !CONVERTER_NAME_RE.is_match(&name) {
            return Err(QueryError::InvalidConverter {
                name,
                message: "converter names must start with a letter and contain only \
                          letters, digits and underscores"
                    .to_string(),
            });
        }

        let key = name.to_lowercase();
        if self.converters.contains_key(&key) {
            return Err(QueryError::ConverterAlreadyRegistered { name });
        }

        debug!(converter = %name, "Registered attribute converter");
        self.converters.insert(key, (name, converter));
        Ok(())
    }

    /// Look up a converter by name.
    pub fn get(&self, name: &str) -> QueryResult<SharedConverter> {
        self.converters
            .get(&name.to_lowercase())
            .map(|(_, converter)| Arc::clone(converter))
            .ok_or_else(|| QueryError::converter_not_found(name))
    }

    /// Check if a converter is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(&name.to_lowercase())
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.converters.values().map(|(name, _)| name.as_str())
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Convert a domain value to directory form with the named converter.
    pub fn to_directory(&self, name: &str, value: &AttributeValue) -> QueryResult<RawValue> {
        self.get(name)?.to_directory(value)
    }

    /// Convert a directory value to domain form with the named converter.
    pub fn from_directory(&self, name: &str, value: &RawValue) -> QueryResult<AttributeValue> {
        self.get(name)?.from_directory(value)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Built-in converter names.
pub mod names {
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const GENERALIZED_TIME: &str = "generalized_time";
    pub const WINDOWS_TIME: &str = "windows_time";
    pub const WINDOWS_GENERALIZED_TIME: &str = "windows_generalized_time";
    pub const WINDOWS_GUID: &str = "windows_guid";
    pub const WINDOWS_SID: &str = "windows_sid";
    pub const UAC_DISABLED: &str = "uac_disabled";
    pub const UAC_LOCKED: &str = "uac_locked";
    pub const UAC_PASSWORD_NOT_REQUIRED: &str = "uac_password_not_required";
    pub const UAC_PASSWORD_NEVER_EXPIRES: &str = "uac_password_never_expires";
    pub const UAC_SMARTCARD_REQUIRED: &str = "uac_smartcard_required";
    pub const UAC_TRUSTED_FOR_DELEGATION: &str = "uac_trusted_for_delegation";
}

fn builtin_converters() -> Vec<(&'static str, SharedConverter)> {
    vec![
        (names::BOOL, Arc::new(BoolConverter)),
        (names::INT, Arc::new(IntConverter)),
        (names::GENERALIZED_TIME, Arc::new(GeneralizedTimeConverter)),
        (names::WINDOWS_TIME, Arc::new(WindowsTimeConverter)),
        (
            names::WINDOWS_GENERALIZED_TIME,
            Arc::new(WindowsGeneralizedTimeConverter),
        ),
        (names::WINDOWS_GUID, Arc::new(WindowsGuidConverter)),
        (names::WINDOWS_SID, Arc::new(WindowsSidConverter)),
        (
            names::UAC_DISABLED,
            Arc::new(FlagConverter::new(names::UAC_DISABLED, 0x0002)),
        ),
        (
            names::UAC_LOCKED,
            Arc::new(FlagConverter::new(names::UAC_LOCKED, 0x0010)),
        ),
        (
            names::UAC_PASSWORD_NOT_REQUIRED,
            Arc::new(FlagConverter::new(names::UAC_PASSWORD_NOT_REQUIRED, 0x0020)),
        ),
        (
            names::UAC_PASSWORD_NEVER_EXPIRES,
            Arc::new(FlagConverter::new(
                names::UAC_PASSWORD_NEVER_EXPIRES,
                0x0001_0000,
            )),
        ),
        (
            names::UAC_SMARTCARD_REQUIRED,
            Arc::new(FlagConverter::new(names::UAC_SMARTCARD_REQUIRED, 0x0004_0000)),
        ),
        (
            names::UAC_TRUSTED_FOR_DELEGATION,
            Arc::new(FlagConverter::new(
                names::UAC_TRUSTED_FOR_DELEGATION,
                0x0008_0000,
            )),
        ),
    ]
}
