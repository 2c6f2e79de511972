//! `userAccountControl` bitfield.
//!
//! Active Directory packs account state into one 32-bit integer. The flags
//! here are the ones predicates and schemas in this crate refer to.

use std::fmt;

use xavyo_directory_query::value::AttributeValue;

/// Logon script is executed.
pub const SCRIPT: u32 = 0x0001;
/// Account is disabled.
pub const ACCOUNTDISABLE: u32 = 0x0002;
/// Home directory is required.
pub const HOMEDIR_REQUIRED: u32 = 0x0008;
/// Account is locked out.
pub const LOCKOUT: u32 = 0x0010;
/// No password is required.
pub const PASSWD_NOTREQD: u32 = 0x0020;
/// User cannot change the password.
pub const PASSWD_CANT_CHANGE: u32 = 0x0040;
/// Typical user account.
pub const NORMAL_ACCOUNT: u32 = 0x0200;
/// Computer account for a workstation or member server.
pub const WORKSTATION_TRUST_ACCOUNT: u32 = 0x1000;
/// Password never expires.
pub const DONT_EXPIRE_PASSWORD: u32 = 0x0001_0000;
/// Smart card is required for logon.
pub const SMARTCARD_REQUIRED: u32 = 0x0004_0000;
/// Trusted for Kerberos delegation.
pub const TRUSTED_FOR_DELEGATION: u32 = 0x0008_0000;
/// Password has expired.
pub const PASSWORD_EXPIRED: u32 = 0x0080_0000;

/// Parsed `userAccountControl` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserAccountControl {
    pub value: u32,
}

impl UserAccountControl {
    #[must_use]
    pub const fn from_value(value: u32) -> Self {
        Self { value }
    }

    /// Read the bitfield from a raw or hydrated attribute value.
    ///
    /// Accepts integers and decimal strings. Anything else yields `None`.
    #[must_use]
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Integer(i) => u32::try_from(*i).ok().map(Self::from_value),
            AttributeValue::String(s) => s.trim().parse::<u32>().ok().map(Self::from_value),
            _ => None,
        }
    }

    /// Check whether every bit of `flag` is set.
    #[must_use]
    pub const fn has(&self, flag: u32) -> bool {
        self.value & flag == flag
    }

    #[must_use]
    pub const fn with(self, flag: u32) -> Self {
        Self {
            value: self.value | flag,
        }
    }

    #[must_use]
    pub const fn without(self, flag: u32) -> Self {
        Self {
            value: self.value & !flag,
        }
    }

    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.has(ACCOUNTDISABLE)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_disabled()
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.has(LOCKOUT)
    }

    #[must_use]
    pub const fn password_never_expires(&self) -> bool {
        self.has(DONT_EXPIRE_PASSWORD)
    }

    #[must_use]
    pub const fn password_not_required(&self) -> bool {
        self.has(PASSWD_NOTREQD)
    }

    /// Set `ACCOUNTDISABLE`, keeping every other flag.
    #[must_use]
    pub const fn disable(self) -> Self {
        self.with(ACCOUNTDISABLE)
    }

    /// Clear `ACCOUNTDISABLE`, keeping every other flag.
    #[must_use]
    pub const fn enable(self) -> Self {
        self.without(ACCOUNTDISABLE)
    }
}

impl From<u32> for UserAccountControl {
    fn from(value: u32) -> Self {
        Self::from_value(value)
    }
}

impl From<UserAccountControl> for u32 {
    fn from(uac: UserAccountControl) -> Self {
        uac.value
    }
}

impl From<UserAccountControl> for AttributeValue {
    fn from(uac: UserAccountControl) -> Self {
        AttributeValue::Integer(i64::from(uac.value))
    }
}

impl fmt::Display for UserAccountControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.value)
    }
}
