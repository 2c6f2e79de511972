//! Active Directory predicates.
//!
//! [`AdFilterBuilder`] dereferences to [`FilterBuilder`], so every generic
//! predicate is available next to the AD-specific ones below. Attribute names
//! are directory-native; with a schema bound, aliases such as `disabled` can be
//! used through the generic predicates instead.

use std::ops::Deref;

use xavyo_directory_query::expression::Expression;
use xavyo_directory_query::filter::FilterBuilder;
use xavyo_directory_query::value::AttributeValue;

use crate::group_type;
use crate::user_account_control::{ACCOUNTDISABLE, DONT_EXPIRE_PASSWORD};

const USER_ACCOUNT_CONTROL: &str = "userAccountControl";
const GROUP_TYPE: &str = "groupType";

/// Filter builder with Active Directory vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdFilterBuilder {
    inner: FilterBuilder,
}

impl AdFilterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FilterBuilder::new(),
        }
    }

    /// `ACCOUNTDISABLE` is set.
    #[must_use]
    pub fn account_is_disabled(&self) -> Expression {
        self.bitwise_and(USER_ACCOUNT_CONTROL, ACCOUNTDISABLE)
    }

    /// `ACCOUNTDISABLE` is clear.
    #[must_use]
    pub fn account_is_enabled(&self) -> Expression {
        self.not_bitwise_and(USER_ACCOUNT_CONTROL, ACCOUNTDISABLE)
    }

    /// The account is currently locked out.
    ///
    /// AD does not maintain the `LOCKOUT` bit of `userAccountControl`; a
    /// non-zero `lockoutTime` is what marks a locked account.
    #[must_use]
    pub fn account_is_locked(&self) -> Expression {
        self.gte("lockoutTime", 1i64)
    }

    #[must_use]
    pub fn password_never_expires(&self) -> Expression {
        self.bitwise_and(USER_ACCOUNT_CONTROL, DONT_EXPIRE_PASSWORD)
    }

    /// The user must change the password at next logon.
    #[must_use]
    pub fn password_must_change(&self) -> Expression {
        self.eq("pwdLastSet", 0i64)
    }

    /// Member of `group_dn` directly or through nested groups.
    #[must_use]
    pub fn is_recursively_member_of(&self, group_dn: impl Into<AttributeValue>) -> Expression {
        self.in_chain("memberOf", group_dn)
    }

    /// Group containing `dn` directly or through nested groups.
    #[must_use]
    pub fn has_member_recursively(&self, dn: impl Into<AttributeValue>) -> Expression {
        self.in_chain("member", dn)
    }

    /// Exchange mail-enabled object.
    #[must_use]
    pub fn mail_enabled(&self) -> Expression {
        self.present("mailNickname")
    }

    #[must_use]
    pub fn is_security_group(&self) -> Expression {
        self.bitwise_and(GROUP_TYPE, group_type::SECURITY_ENABLED)
    }

    #[must_use]
    pub fn is_distribution_group(&self) -> Expression {
        self.not_bitwise_and(GROUP_TYPE, group_type::SECURITY_ENABLED)
    }

    #[must_use]
    pub fn is_global_group(&self) -> Expression {
        self.bitwise_and(GROUP_TYPE, group_type::GLOBAL)
    }

    #[must_use]
    pub fn is_domain_local_group(&self) -> Expression {
        self.bitwise_and(GROUP_TYPE, group_type::DOMAIN_LOCAL)
    }

    #[must_use]
    pub fn is_universal_group(&self) -> Expression {
        self.bitwise_and(GROUP_TYPE, group_type::UNIVERSAL)
    }
}

impl Deref for AdFilterBuilder {
    type Target = FilterBuilder;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
