//! AD converters on top of the core built-ins.

use tracing::debug;
use xavyo_directory_query::converter::{ConverterRegistry, FlagConverter};
use xavyo_directory_query::error::QueryResult;

use crate::group_type;

/// Converter names registered by [`register_converters`].
pub mod names {
    pub const GROUP_SECURITY: &str = "group_security";
    pub const GROUP_GLOBAL: &str = "group_global";
    pub const GROUP_DOMAIN_LOCAL: &str = "group_domain_local";
    pub const GROUP_UNIVERSAL: &str = "group_universal";
}

/// Register the `groupType` flag converters.
///
/// # Errors
/// `ConverterAlreadyRegistered` if any of the names is already taken.
pub fn register_converters(registry: &mut ConverterRegistry) -> QueryResult<()> {
    for (name, mask) in [
        (names::GROUP_SECURITY, group_type::SECURITY_ENABLED),
        (names::GROUP_GLOBAL, group_type::GLOBAL),
        (names::GROUP_DOMAIN_LOCAL, group_type::DOMAIN_LOCAL),
        (names::GROUP_UNIVERSAL, group_type::UNIVERSAL),
    ] {
        registry.register(name, FlagConverter::new(name, mask))?;
    }
    debug!(converters = registry.len(), "Registered AD converters");
    Ok(())
}

/// Core built-ins plus the AD converters.
///
/// # Errors
/// Only if the built-in names collide, which they do not.
pub fn ad_registry() -> QueryResult<ConverterRegistry> {
    let mut registry = ConverterRegistry::with_builtins();
    register_converters(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xavyo_directory_query::value::{AttributeValue, RawValue};

    #[test]
    fn test_group_flags_read_signed_values() {
        let registry = ad_registry().unwrap();
        let security_global = RawValue::from("-2147483646");

        assert_eq!(
            registry
                .from_directory(names::GROUP_SECURITY, &security_global)
                .unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            registry
                .from_directory(names::GROUP_GLOBAL, &security_global)
                .unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            registry
                .from_directory(names::GROUP_UNIVERSAL, &security_global)
                .unwrap(),
            AttributeValue::Boolean(false)
        );
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = ad_registry().unwrap();
        let err = register_converters(&mut registry).unwrap_err();
        assert_eq!(err.error_code(), "CONVERTER_ALREADY_REGISTERED");
    }
}
