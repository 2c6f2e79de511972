//! `groupType` bitfield.
//!
//! Stored as a signed 32-bit integer, so security groups read back negative.

use xavyo_directory_query::value::AttributeValue;

/// Group created by the system.
pub const BUILTIN_LOCAL: u32 = 0x0000_0001;
/// Global scope.
pub const GLOBAL: u32 = 0x0000_0002;
/// Domain-local scope.
pub const DOMAIN_LOCAL: u32 = 0x0000_0004;
/// Universal scope.
pub const UNIVERSAL: u32 = 0x0000_0008;
/// Application basic group.
pub const APP_BASIC: u32 = 0x0000_0010;
/// Application query group.
pub const APP_QUERY: u32 = 0x0000_0020;
/// Security group. Clear for distribution groups.
pub const SECURITY_ENABLED: u32 = 0x8000_0000;

fn bits(group_type: i32) -> u32 {
    group_type as u32
}

#[must_use]
pub fn is_security_group(group_type: i32) -> bool {
    bits(group_type) & SECURITY_ENABLED != 0
}

#[must_use]
pub fn is_distribution_group(group_type: i32) -> bool {
    !is_security_group(group_type)
}

/// Scope name: `global`, `domain_local`, `universal` or `unknown`.
#[must_use]
pub fn scope_name(group_type: i32) -> &'static str {
    let bits = bits(group_type);
    if bits & GLOBAL != 0 {
        "global"
    } else if bits & DOMAIN_LOCAL != 0 {
        "domain_local"
    } else if bits & UNIVERSAL != 0 {
        "universal"
    } else {
        "unknown"
    }
}

/// Read a `groupType` from a raw or hydrated attribute value.
#[must_use]
pub fn parse(value: &AttributeValue) -> Option<i32> {
    match value {
        AttributeValue::Integer(i) => i32::try_from(*i)
            .ok()
            .or_else(|| u32::try_from(*i).ok().map(|u| u as i32)),
        AttributeValue::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<u32>().ok().map(|u| u as i32))
        }
        _ => None,
    }
}

/// Compose a `groupType` value from its security flag and scope bit.
#[must_use]
pub fn compose(security: bool, scope: u32) -> i32 {
    let value = if security {
        scope | SECURITY_ENABLED
    } else {
        scope
    };
    value as i32
}
