//! Default Active Directory object schemas.
//!
//! Users and groups are described as [`ObjectSchemaDefinition`]s so they can
//! be serialized, tweaked and loaded like any schema file.
//!
//! The user schema exposes `whenCreated` twice: `created` as a date-time and
//! `created_int` as its raw `YYYYMMDDHHMMSS` integer.

use indexmap::IndexMap;
use xavyo_directory_query::converter::names as core;
use xavyo_directory_query::error::QueryResult;
use xavyo_directory_query::schema::{ObjectSchema, ObjectSchemaDefinition};
use xavyo_directory_query::value::AttributeValue;

use crate::converter::names as ad;

pub const SCHEMA_NAME: &str = "ad";

fn pairs(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// `user` objects in the `person` category.
#[must_use]
pub fn user_definition() -> ObjectSchemaDefinition {
    ObjectSchemaDefinition {
        schema_name: SCHEMA_NAME.to_string(),
        object_type: "user".to_string(),
        object_class: strings(&["user"]),
        object_category: Some("person".to_string()),
        attributes: pairs(&[
            ("guid", "objectGUID"),
            ("sid", "objectSid"),
            ("dn", "distinguishedName"),
            ("username", "sAMAccountName"),
            ("upn", "userPrincipalName"),
            ("email", "mail"),
            ("display_name", "displayName"),
            ("first_name", "givenName"),
            ("last_name", "sn"),
            ("department", "department"),
            ("job_title", "title"),
            ("company", "company"),
            ("employee_id", "employeeID"),
            ("employee_number", "employeeNumber"),
            ("phone", "telephoneNumber"),
            ("manager_dn", "manager"),
            ("member_of_dns", "memberOf"),
            ("account_control", "userAccountControl"),
            ("disabled", "userAccountControl"),
            ("password_never_expires", "userAccountControl"),
            ("smartcard_required", "userAccountControl"),
            ("locked_out_at", "lockoutTime"),
            ("password_last_set", "pwdLastSet"),
            ("last_logon", "lastLogonTimestamp"),
            ("account_expires", "accountExpires"),
            ("created", "whenCreated"),
            ("created_int", "whenCreated"),
            ("modified", "whenChanged"),
            ("usn_changed", "uSNChanged"),
        ]),
        converters: pairs(&[
            ("guid", core::WINDOWS_GUID),
            ("sid", core::WINDOWS_SID),
            ("account_control", core::INT),
            ("disabled", core::UAC_DISABLED),
            ("password_never_expires", core::UAC_PASSWORD_NEVER_EXPIRES),
            ("smartcard_required", core::UAC_SMARTCARD_REQUIRED),
            ("locked_out_at", core::WINDOWS_TIME),
            ("password_last_set", core::WINDOWS_TIME),
            ("last_logon", core::WINDOWS_TIME),
            ("account_expires", core::WINDOWS_TIME),
            ("created", core::WINDOWS_GENERALIZED_TIME),
            ("created_int", core::INT),
            ("modified", core::WINDOWS_GENERALIZED_TIME),
            ("usn_changed", core::INT),
        ]),
        attributes_to_select: strings(&[
            "guid",
            "dn",
            "username",
            "upn",
            "email",
            "display_name",
            "first_name",
            "last_name",
            "disabled",
            "member_of_dns",
            "created",
            "modified",
        ]),
        required_attributes: strings(&["username"]),
        default_values: [("member_of_dns".to_string(), AttributeValue::Array(Vec::new()))]
            .into_iter()
            .collect(),
        repository: Some("users".to_string()),
        rdn: strings(&["cn"]),
        ..Default::default()
    }
}

/// `group` objects.
#[must_use]
pub fn group_definition() -> ObjectSchemaDefinition {
    ObjectSchemaDefinition {
        schema_name: SCHEMA_NAME.to_string(),
        object_type: "group".to_string(),
        object_class: strings(&["group"]),
        attributes: pairs(&[
            ("guid", "objectGUID"),
            ("sid", "objectSid"),
            ("dn", "distinguishedName"),
            ("name", "cn"),
            ("sam_account_name", "sAMAccountName"),
            ("description", "description"),
            ("email", "mail"),
            ("managed_by_dn", "managedBy"),
            ("members", "member"),
            ("member_of_dns", "memberOf"),
            ("group_type", "groupType"),
            ("security", "groupType"),
            ("global", "groupType"),
            ("domain_local", "groupType"),
            ("universal", "groupType"),
            ("created", "whenCreated"),
            ("modified", "whenChanged"),
            ("usn_changed", "uSNChanged"),
        ]),
        converters: pairs(&[
            ("guid", core::WINDOWS_GUID),
            ("sid", core::WINDOWS_SID),
            ("group_type", core::INT),
            ("security", ad::GROUP_SECURITY),
            ("global", ad::GROUP_GLOBAL),
            ("domain_local", ad::GROUP_DOMAIN_LOCAL),
            ("universal", ad::GROUP_UNIVERSAL),
            ("created", core::WINDOWS_GENERALIZED_TIME),
            ("modified", core::WINDOWS_GENERALIZED_TIME),
            ("usn_changed", core::INT),
        ]),
        attributes_to_select: strings(&[
            "guid",
            "dn",
            "name",
            "sam_account_name",
            "description",
            "members",
            "security",
            "created",
        ]),
        required_attributes: strings(&["name"]),
        default_values: [("members".to_string(), AttributeValue::Array(Vec::new()))]
            .into_iter()
            .collect(),
        repository: Some("groups".to_string()),
        rdn: strings(&["cn"]),
        ..Default::default()
    }
}

/// The user schema, ready for compilation and hydration.
///
/// # Errors
/// Never for the built-in definition; kept fallible to match
/// `ObjectSchema::try_from`.
pub fn user_schema() -> QueryResult<ObjectSchema> {
    ObjectSchema::try_from(user_definition())
}

/// The group schema, ready for compilation and hydration.
///
/// # Errors
/// See [`user_schema`].
pub fn group_schema() -> QueryResult<ObjectSchema> {
    ObjectSchema::try_from(group_definition())
}

/// Every default AD schema.
///
/// # Errors
/// See [`user_schema`].
pub fn default_schemas() -> QueryResult<Vec<ObjectSchema>> {
    Ok(vec![user_schema()?, group_schema()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ad_registry;

    #[test]
    fn test_user_scoping_filter() {
        let filter = user_definition().scoping_filter().unwrap();
        assert_eq!(
            filter.to_filter().unwrap(),
            "(&(objectCategory=person)(objectClass=user))"
        );
    }

    #[test]
    fn test_group_scoping_filter() {
        let schema = group_schema().unwrap();
        assert_eq!(
            schema.filter().unwrap().to_filter().unwrap(),
            "(objectClass=group)"
        );
    }

    #[test]
    fn test_created_aliases() {
        let schema = user_schema().unwrap();
        assert_eq!(schema.names_mapped_to("whenCreated"), ["created", "created_int"]);
        assert_eq!(
            schema.names_mapped_to("userAccountControl"),
            [
                "account_control",
                "disabled",
                "password_never_expires",
                "smartcard_required"
            ]
        );
    }

    #[test]
    fn test_every_converter_is_registered() {
        let registry = ad_registry().unwrap();
        for schema in default_schemas().unwrap() {
            for (attribute, converter) in schema.converter_map() {
                assert!(
                    registry.contains(converter),
                    "{}: {attribute} uses unknown converter {converter}",
                    schema.id()
                );
            }
        }
    }

    #[test]
    fn test_definition_json_round_trip() {
        let json = serde_json::to_value(user_definition()).unwrap();
        let parsed: ObjectSchemaDefinition = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.attributes, user_definition().attributes);
        assert_eq!(parsed.converters, user_definition().converters);
        assert_eq!(serde_json::to_value(parsed).unwrap(), json);
    }
}
