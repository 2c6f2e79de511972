//! Integration tests for the AD flavor: compile against the default schemas
//! and hydrate entries shaped like `ldap3` search results.

use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use xavyo_directory_query::prelude::*;
use xavyo_directory_query_ad::converter::names as ad_names;
use xavyo_directory_query_ad::{
    ad_registry, group_schema, user_schema, AdFilterBuilder, UserAccountControl,
};

// =============================================================================
// Test Helpers
// =============================================================================

const GUID: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
const GUID_BYTES: [u8; 16] = [
    0xff, 0x19, 0x96, 0x6f, 0x86, 0x8b, 0x11, 0xd0, 0xb4, 0x2d, 0x00, 0xc0, 0x4f, 0xc9, 0x64, 0xff,
];

const SID: &str = "S-1-5-21-1-2-3-500";
const SID_BYTES: [u8; 28] = [
    0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, // revision, count, authority
    0x15, 0x00, 0x00, 0x00, // 21
    0x01, 0x00, 0x00, 0x00, // 1
    0x02, 0x00, 0x00, 0x00, // 2
    0x03, 0x00, 0x00, 0x00, // 3
    0xf4, 0x01, 0x00, 0x00, // 500
];

fn user_compiler() -> QueryCompiler {
    QueryCompiler::new(
        Arc::new(ad_registry().unwrap()),
        QueryConfig::new().with_base_dn("DC=corp,DC=local"),
    )
    .unwrap()
    .with_schema(Arc::new(user_schema().unwrap()))
}

fn group_compiler() -> QueryCompiler {
    QueryCompiler::new(
        Arc::new(ad_registry().unwrap()),
        QueryConfig::new().with_base_dn("DC=corp,DC=local"),
    )
    .unwrap()
    .with_schema(Arc::new(group_schema().unwrap()))
}

fn text_attrs(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(name, values)| {
            (
                (*name).to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

fn user_entry() -> RawEntry {
    let attrs = text_attrs(&[
        ("sAMAccountName", &["jdoe"]),
        ("userPrincipalName", &["jdoe@corp.local"]),
        ("mail", &["john.doe@corp.local"]),
        ("givenName", &["John"]),
        ("sn", &["Doe"]),
        ("userAccountControl", &["514"]),
        ("whenCreated", &["20240115120000.0Z"]),
        ("lastLogonTimestamp", &["133497936000000000"]),
        ("accountExpires", &["9223372036854775807"]),
        (
            "memberOf",
            &[
                "CN=Admins,OU=Groups,DC=corp,DC=local",
                "CN=VPN,OU=Groups,DC=corp,DC=local",
            ],
        ),
    ]);
    let mut bin_attrs = HashMap::new();
    bin_attrs.insert("objectGUID".to_string(), vec![GUID_BYTES.to_vec()]);
    bin_attrs.insert("objectSid".to_string(), vec![SID_BYTES.to_vec()]);

    RawEntry::from(ldap3::SearchEntry {
        dn: "CN=John Doe,OU=People,DC=corp,DC=local".to_string(),
        attrs,
        bin_attrs,
    })
}

// =============================================================================
// Compilation
// =============================================================================

#[test]
fn test_compile_alias_with_flag_converter() {
    let f = AdFilterBuilder::new();
    let request = user_compiler().compile(&f.eq("disabled", true)).unwrap();

    assert_eq!(
        request.filter,
        "(&(&(objectCategory=person)(objectClass=user))\
         (userAccountControl:1.2.840.113556.1.4.803:=2))"
    );
    assert_eq!(request.base_dn, "DC=corp,DC=local");
    assert_eq!(
        request.attributes,
        [
            "objectGUID",
            "distinguishedName",
            "sAMAccountName",
            "userPrincipalName",
            "mail",
            "displayName",
            "givenName",
            "sn",
            "userAccountControl",
            "memberOf",
            "whenCreated",
            "whenChanged",
        ]
    );
}

#[test]
fn test_flag_alias_agrees_with_hydration() {
    let f = AdFilterBuilder::new();
    let compiler = user_compiler();

    assert_eq!(
        compiler.compile(&f.eq("disabled", false)).unwrap().filter,
        "(&(&(objectCategory=person)(objectClass=user))\
         (!(userAccountControl:1.2.840.113556.1.4.803:=2)))"
    );
    assert_eq!(
        compiler.compile(&f.bitwise_and("disabled", false)).unwrap().filter,
        compiler.compile(&f.eq("disabled", false)).unwrap().filter
    );
    assert_eq!(
        compiler.compile(&f.eq("disabled", true)).unwrap().filter,
        compiler.compile(&f.account_is_disabled()).unwrap().filter
    );
    assert_eq!(
        compiler.compile(&f.eq("disabled", false)).unwrap().filter,
        compiler.compile(&f.account_is_enabled()).unwrap().filter
    );

    // The entry the filter selects hydrates with the flag set.
    let hydrated = compiler
        .hydrator(Some(vec!["disabled".to_string()]))
        .hydrate(&user_entry())
        .unwrap();
    assert_eq!(hydrated.get("disabled"), Some(&AttributeValue::Boolean(true)));
}

#[test]
fn test_group_flag_alias() {
    let f = AdFilterBuilder::new();
    let request = group_compiler().compile(&f.eq("security", false)).unwrap();
    assert_eq!(
        request.filter,
        "(&(objectClass=group)(!(groupType:1.2.840.113556.1.4.803:=2147483648)))"
    );
    assert_eq!(
        request.filter,
        group_compiler().compile(&f.is_distribution_group()).unwrap().filter
    );
}

#[test]
fn test_compile_ad_predicates() {
    let f = AdFilterBuilder::new();
    let expr = f.and([
        f.account_is_enabled(),
        f.is_recursively_member_of("CN=Admins,OU=Groups,DC=corp,DC=local"),
        f.gte("created", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
    ]);
    let request = user_compiler().compile(&expr).unwrap();

    assert_eq!(
        request.filter,
        "(&(&(objectCategory=person)(objectClass=user))\
         (&(!(userAccountControl:1.2.840.113556.1.4.803:=2))\
         (memberOf:1.2.840.113556.1.4.1941:=CN=Admins,OU=Groups,DC=corp,DC=local)\
         (whenCreated>=20240101000000.0Z)))"
    );
}

#[test]
fn test_compile_guid_lookup_escapes_binary() {
    let f = AdFilterBuilder::new();
    let request = user_compiler().compile(&f.eq("guid", GUID)).unwrap();

    assert_eq!(
        request.filter,
        "(&(&(objectCategory=person)(objectClass=user))\
         (objectGUID=\\ff\\19\\96o\\86\\8b\\11\\d0\\b4-\\00\\c0O\\c9d\\ff))"
    );
}

#[test]
fn test_compile_group_predicates() {
    let f = AdFilterBuilder::new();
    let expr = f.and([f.is_security_group(), f.is_universal_group()]);
    let request = group_compiler().compile(&expr).unwrap();

    assert_eq!(
        request.filter,
        "(&(objectClass=group)(&(groupType:1.2.840.113556.1.4.803:=2147483648)\
         (groupType:1.2.840.113556.1.4.803:=8)))"
    );
}

#[test]
fn test_group_flag_round_trips() {
    let registry = ad_registry().unwrap();
    for name in [
        ad_names::GROUP_SECURITY,
        ad_names::GROUP_GLOBAL,
        ad_names::GROUP_DOMAIN_LOCAL,
        ad_names::GROUP_UNIVERSAL,
    ] {
        for value in [AttributeValue::Boolean(true), AttributeValue::Boolean(false)] {
            let raw = registry.to_directory(name, &value).unwrap();
            let back = registry.from_directory(name, &raw).unwrap();
            assert_eq!(back, value, "round trip through {name}");
        }
    }
}

// =============================================================================
// Hydration
// =============================================================================

#[test]
fn test_hydrate_user_defaults() {
    let hydrated = user_compiler()
        .hydrator(None)
        .hydrate(&user_entry())
        .unwrap();

    assert_eq!(hydrated.dn(), Some("CN=John Doe,OU=People,DC=corp,DC=local"));
    assert_eq!(hydrated.get("guid"), Some(&AttributeValue::from(GUID)));
    assert_eq!(hydrated.get("username"), Some(&AttributeValue::from("jdoe")));
    assert_eq!(hydrated.get("disabled"), Some(&AttributeValue::Boolean(true)));
    assert_eq!(
        hydrated.get("created"),
        Some(&AttributeValue::DateTime(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
        ))
    );
    assert_eq!(
        hydrated.get("member_of_dns"),
        Some(&AttributeValue::Array(vec![
            AttributeValue::from("CN=Admins,OU=Groups,DC=corp,DC=local"),
            AttributeValue::from("CN=VPN,OU=Groups,DC=corp,DC=local"),
        ]))
    );
    assert!(!hydrated.contains_key("sid"));
    assert!(!hydrated.contains_key("created_int"));
}

#[test]
fn test_hydrate_user_alias_fan_out() {
    let hydrated = user_compiler()
        .hydrator(Some(
            [
                "created",
                "created_int",
                "account_control",
                "disabled",
                "password_never_expires",
                "sid",
                "last_logon",
                "account_expires",
            ]
            .map(String::from)
            .to_vec(),
        ))
        .hydrate(&user_entry())
        .unwrap();

    assert_eq!(
        hydrated.get("created_int"),
        Some(&AttributeValue::Integer(20_240_115_120_000))
    );
    assert_eq!(
        hydrated.get("account_control"),
        Some(&AttributeValue::Integer(514))
    );
    assert_eq!(
        hydrated.get("password_never_expires"),
        Some(&AttributeValue::Boolean(false))
    );
    assert_eq!(hydrated.get("sid"), Some(&AttributeValue::from(SID)));
    assert_eq!(
        hydrated.get("last_logon"),
        Some(&AttributeValue::DateTime(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
        ))
    );
    assert_eq!(hydrated.get("account_expires"), Some(&AttributeValue::Null));

    let uac = UserAccountControl::from_attribute(hydrated.get("account_control").unwrap()).unwrap();
    assert!(uac.is_disabled());
    assert!(!uac.password_never_expires());
}

#[test]
fn test_hydrate_group() {
    let entry = RawEntry::from_pairs([
        ("cn", vec!["Admins"]),
        ("groupType", vec!["-2147483646"]),
        ("whenCreated", vec!["20230301080000.0Z"]),
    ])
    .with_dn("CN=Admins,OU=Groups,DC=corp,DC=local");

    let hydrated = group_compiler()
        .hydrator(Some(
            ["name", "security", "global", "universal", "group_type", "members"]
                .map(String::from)
                .to_vec(),
        ))
        .hydrate(&entry)
        .unwrap();

    assert_eq!(hydrated.get("name"), Some(&AttributeValue::from("Admins")));
    assert_eq!(hydrated.get("security"), Some(&AttributeValue::Boolean(true)));
    assert_eq!(hydrated.get("global"), Some(&AttributeValue::Boolean(true)));
    assert_eq!(hydrated.get("universal"), Some(&AttributeValue::Boolean(false)));
    assert_eq!(
        hydrated.get("group_type"),
        Some(&AttributeValue::Integer(-2_147_483_646))
    );
    assert_eq!(hydrated.get("members"), Some(&AttributeValue::Array(vec![])));
}

#[test]
fn test_hydrate_all_keeps_order() {
    let second = RawEntry::from_pairs([("sAMAccountName", vec!["asmith"])]);
    let hydrated = user_compiler()
        .hydrator(Some(vec!["username".to_string()]))
        .hydrate_all(&[user_entry(), second])
        .unwrap();

    let names: Vec<_> = hydrated
        .iter()
        .map(|entry| entry.get("username").cloned())
        .collect();
    assert_eq!(
        names,
        [Some(AttributeValue::from("jdoe")), Some(AttributeValue::from("asmith"))]
    );
}
