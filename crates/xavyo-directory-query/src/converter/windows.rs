//! Active Directory encodings: FILETIME timestamps, GUIDs, SIDs and
//! `userAccountControl`-style flag bits.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::standard::{leading_integer, parse_generalized_time, require_text, to_generalized_time};
use super::{names, AttributeConverter};
use crate::error::{QueryError, QueryResult};
use crate::value::{AttributeValue, RawValue};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;
/// AD stores "never" as 0 or as the largest 64-bit value.
const FILETIME_NEVER: i64 = i64::MAX;

/// FILETIME values (100ns ticks since 1601), used by `pwdLastSet`,
/// `accountExpires`, `lastLogonTimestamp` and `lockoutTime`.
///
/// `0` and `0x7FFFFFFFFFFFFFFF` mean "never" and read as null.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsTimeConverter;

impl AttributeConverter for WindowsTimeConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        let ticks = match value {
            AttributeValue::Null => 0,
            AttributeValue::Integer(i) => *i,
            AttributeValue::DateTime(dt) => {
                let secs = dt.timestamp() + FILETIME_EPOCH_OFFSET_SECS;
                secs.checked_mul(FILETIME_TICKS_PER_SEC)
                    .and_then(|t| t.checked_add(i64::from(dt.timestamp_subsec_nanos() / 100)))
                    .ok_or_else(|| {
                        QueryError::conversion(names::WINDOWS_TIME, "date-time is out of range")
                    })?
            }
            other => {
                return Err(QueryError::conversion(
                    names::WINDOWS_TIME,
                    format!("cannot convert a {} value", other.kind()),
                ))
            }
        };
        Ok(RawValue::Text(ticks.to_string()))
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(names::WINDOWS_TIME, value)?;
        let ticks: i64 = text.trim().parse().map_err(|_| {
            QueryError::conversion(names::WINDOWS_TIME, format!("'{text}' is not a FILETIME"))
        })?;
        if ticks == 0 || ticks == FILETIME_NEVER {
            return Ok(AttributeValue::Null);
        }

        let secs = ticks.div_euclid(FILETIME_TICKS_PER_SEC) - FILETIME_EPOCH_OFFSET_SECS;
        let nanos = u32::try_from(ticks.rem_euclid(FILETIME_TICKS_PER_SEC) * 100).unwrap_or(0);
        DateTime::<Utc>::from_timestamp(secs, nanos)
            .map(AttributeValue::DateTime)
            .ok_or_else(|| {
                QueryError::conversion(names::WINDOWS_TIME, format!("FILETIME {ticks} is out of range"))
            })
    }
}

/// AD flavour of generalized time, written with a `.0Z` suffix (`whenCreated`,
/// `whenChanged`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsGeneralizedTimeConverter;

impl AttributeConverter for WindowsGeneralizedTimeConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        to_generalized_time(names::WINDOWS_GENERALIZED_TIME, value, "%Y%m%d%H%M%S.0Z")
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(names::WINDOWS_GENERALIZED_TIME, value)?;
        parse_generalized_time(text)
            .map(AttributeValue::DateTime)
            .ok_or_else(|| {
                QueryError::conversion(
                    names::WINDOWS_GENERALIZED_TIME,
                    format!("'{text}' is not a generalized time"),
                )
            })
    }
}

/// `objectGUID`: 16 bytes in Microsoft mixed-endian order, read as the
/// canonical hyphenated string.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsGuidConverter;

impl AttributeConverter for WindowsGuidConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        match value {
            AttributeValue::String(s) => {
                let guid = Uuid::parse_str(s.trim()).map_err(|e| {
                    QueryError::conversion(names::WINDOWS_GUID, format!("'{s}' is not a GUID: {e}"))
                })?;
                Ok(RawValue::Binary(guid.to_bytes_le().to_vec()))
            }
            AttributeValue::Binary(bytes) if bytes.len() == 16 => Ok(RawValue::Binary(bytes.clone())),
            other => Err(QueryError::conversion(
                names::WINDOWS_GUID,
                format!("cannot convert a {} value", other.kind()),
            )),
        }
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        match value {
            RawValue::Binary(bytes) => {
                let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    QueryError::conversion(
                        names::WINDOWS_GUID,
                        format!("expected 16 bytes, got {}", bytes.len()),
                    )
                })?;
                Ok(AttributeValue::String(
                    Uuid::from_bytes_le(raw).hyphenated().to_string(),
                ))
            }
            // Some directory clients hand GUIDs back already formatted.
            RawValue::Text(text) => Uuid::parse_str(text.trim())
                .map(|guid| AttributeValue::String(guid.hyphenated().to_string()))
                .map_err(|e| {
                    QueryError::conversion(names::WINDOWS_GUID, format!("'{text}' is not a GUID: {e}"))
                }),
        }
    }
}

/// `objectSid`: binary security identifier, read as `S-1-5-21-...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsSidConverter;

impl AttributeConverter for WindowsSidConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        match value {
            AttributeValue::String(s) => encode_sid(s).map(RawValue::Binary),
            AttributeValue::Binary(bytes) => {
                decode_sid(bytes)?;
                Ok(RawValue::Binary(bytes.clone()))
            }
            other => Err(QueryError::conversion(
                names::WINDOWS_SID,
                format!("cannot convert a {} value", other.kind()),
            )),
        }
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        match value {
            RawValue::Binary(bytes) => decode_sid(bytes).map(AttributeValue::String),
            RawValue::Text(text) if text.starts_with("S-") => {
                encode_sid(text)?;
                Ok(AttributeValue::String(text.clone()))
            }
            RawValue::Text(text) => decode_sid(text.as_bytes()).map(AttributeValue::String),
        }
    }
}

/// Decode a binary SID: revision, sub-authority count, 48-bit big-endian
/// identifier authority, then little-endian 32-bit sub-authorities.
fn decode_sid(bytes: &[u8]) -> QueryResult<String> {
    let invalid = |msg: &str| QueryError::conversion(names::WINDOWS_SID, msg.to_string());

    if bytes.len() < 8 {
        return Err(invalid("SID is shorter than its 8 byte header"));
    }
    let revision = bytes[0];
    let count = usize::from(bytes[1]);
    if bytes.len() != 8 + count * 4 {
        return Err(invalid("SID length does not match its sub-authority count"));
    }

    let authority = bytes[2..8]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

    let mut sid = format!("S-{revision}-{authority}");
    for chunk in bytes[8..].chunks_exact(4) {
        let sub = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sid.push('-');
        sid.push_str(&sub.to_string());
    }
    Ok(sid)
}

fn encode_sid(sid: &str) -> QueryResult<Vec<u8>> {
    let invalid = || QueryError::conversion(names::WINDOWS_SID, format!("'{sid}' is not a SID"));

    let mut parts = sid.trim().split('-');
    if !parts.next().is_some_and(|p| p.eq_ignore_ascii_case("S")) {
        return Err(invalid());
    }
    let revision: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let authority: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if authority >= 1 << 48 {
        return Err(invalid());
    }
    let subs = parts
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<QueryResult<Vec<_>>>()?;
    let count = u8::try_from(subs.len()).map_err(|_| invalid())?;

    let mut bytes = Vec::with_capacity(8 + subs.len() * 4);
    bytes.push(revision);
    bytes.push(count);
    bytes.extend_from_slice(&authority.to_be_bytes()[2..]);
    for sub in subs {
        bytes.extend_from_slice(&sub.to_le_bytes());
    }
    Ok(bytes)
}

/// A single bit of an integer bitfield exposed as a boolean.
///
/// Writing `true` yields the mask and `false` yields `0`. Filters never
/// compare against these directly: a boolean on a flag attribute compiles to
/// a bitwise-and test on the mask.
#[derive(Debug, Clone, Copy)]
pub struct FlagConverter {
    name: &'static str,
    mask: u32,
}

impl FlagConverter {
    /// Create a flag converter for the given bit mask.
    #[must_use]
    pub const fn new(name: &'static str, mask: u32) -> Self {
        Self { name, mask }
    }

    /// The bit mask tested by this converter.
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.mask
    }
}

impl AttributeConverter for FlagConverter {
    fn to_directory(&self, value: &AttributeValue) -> QueryResult<RawValue> {
        match value {
            AttributeValue::Boolean(true) => Ok(RawValue::Text(self.mask.to_string())),
            AttributeValue::Boolean(false) => Ok(RawValue::Text("0".to_string())),
            AttributeValue::Integer(i) => Ok(RawValue::Text(i.to_string())),
            other => Err(QueryError::conversion(
                self.name,
                format!("cannot convert a {} value", other.kind()),
            )),
        }
    }

    fn flag_mask(&self) -> Option<u32> {
        Some(self.mask)
    }

    fn from_directory(&self, value: &RawValue) -> QueryResult<AttributeValue> {
        let text = require_text(self.name, value)?;
        let bits = leading_integer(text)
            .ok_or_else(|| QueryError::conversion(self.name, format!("'{text}' is not a bitfield")))?;
        // groupType is stored signed; only the low 32 bits matter.
        let bits = bits as u32;
        Ok(AttributeValue::Boolean(bits & self.mask == self.mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const SAMPLE_SID: &str = "S-1-5-21-3623811015-3361044348-30300820-1013";

    #[test]
    fn test_windows_time_from_directory() {
        let c = WindowsTimeConverter;
        // 2024-01-15T12:00:00Z
        let value = c
            .from_directory(&RawValue::from("133497936000000000"))
            .unwrap();
        assert_eq!(
            value,
            AttributeValue::DateTime(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_windows_time_never() {
        let c = WindowsTimeConverter;
        assert_eq!(c.from_directory(&RawValue::from("0")).unwrap(), AttributeValue::Null);
        assert_eq!(
            c.from_directory(&RawValue::from("9223372036854775807")).unwrap(),
            AttributeValue::Null
        );
        assert_eq!(c.to_directory(&AttributeValue::Null).unwrap(), RawValue::from("0"));
    }

    #[test]
    fn test_windows_generalized_time_suffix() {
        let c = WindowsGeneralizedTimeConverter;
        let dt = Utc.with_ymd_and_hms(2024, 6, 20, 15, 30, 45).unwrap();
        assert_eq!(
            c.to_directory(&dt.into()).unwrap(),
            RawValue::from("20240620153045.0Z")
        );
        assert_eq!(
            c.from_directory(&RawValue::from("20240620153045.0Z")).unwrap(),
            AttributeValue::DateTime(dt)
        );
    }

    #[test]
    fn test_guid_mixed_endian() {
        let c = WindowsGuidConverter;
        let bytes = vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
            0x0F, 0x10,
        ];
        let value = c.from_directory(&RawValue::Binary(bytes.clone())).unwrap();
        assert_eq!(
            value,
            AttributeValue::String("04030201-0605-0807-090a-0b0c0d0e0f10".to_string())
        );
        assert_eq!(c.to_directory(&value).unwrap(), RawValue::Binary(bytes));
    }

    #[test]
    fn test_guid_rejects_wrong_length() {
        let c = WindowsGuidConverter;
        assert!(c.from_directory(&RawValue::Binary(vec![1, 2, 3])).is_err());
        assert!(c.to_directory(&"not-a-guid".into()).is_err());
    }

    #[test]
    fn test_sid_round_trip() {
        let c = WindowsSidConverter;
        let raw = c.to_directory(&SAMPLE_SID.into()).unwrap();
        let RawValue::Binary(bytes) = &raw else {
            panic!("expected binary SID");
        };
        assert_eq!(bytes.len(), 8 + 5 * 4);
        assert_eq!(&bytes[..8], &[1, 5, 0, 0, 0, 0, 0, 5]);
        assert_eq!(
            c.from_directory(&raw).unwrap(),
            AttributeValue::String(SAMPLE_SID.to_string())
        );
    }

    #[test]
    fn test_sid_rejects_malformed() {
        let c = WindowsSidConverter;
        assert!(c.to_directory(&"X-1-5".into()).is_err());
        assert!(c.to_directory(&"S-1-5-abc".into()).is_err());
        assert!(c.from_directory(&RawValue::Binary(vec![1, 2, 0, 0])).is_err());
        // Header claims two sub-authorities but carries one.
        assert!(c
            .from_directory(&RawValue::Binary(vec![1, 2, 0, 0, 0, 0, 0, 5, 1, 0, 0, 0]))
            .is_err());
    }

    #[test]
    fn test_flag_converter() {
        let disabled = FlagConverter::new("uac_disabled", 0x2);
        assert_eq!(
            disabled.from_directory(&RawValue::from("514")).unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            disabled.from_directory(&RawValue::from("512")).unwrap(),
            AttributeValue::Boolean(false)
        );
        assert_eq!(disabled.to_directory(&true.into()).unwrap(), RawValue::from("2"));
        assert_eq!(disabled.to_directory(&false.into()).unwrap(), RawValue::from("0"));
        assert_eq!(disabled.flag_mask(), Some(0x2));
    }

    #[test]
    fn test_flag_converter_signed_group_type() {
        let security = FlagConverter::new("security", 0x8000_0000);
        assert_eq!(
            security.from_directory(&RawValue::from("-2147483646")).unwrap(),
            AttributeValue::Boolean(true)
        );
    }

    proptest! {
        #[test]
        fn test_windows_time_round_trip(secs in 0i64..4_102_444_800i64, hundreds in 0u32..10_000_000u32) {
            let c = WindowsTimeConverter;
            let dt = DateTime::from_timestamp(secs, hundreds * 100).unwrap();
            let raw = c.to_directory(&AttributeValue::DateTime(dt)).unwrap();
            prop_assert_eq!(c.from_directory(&raw).unwrap(), AttributeValue::DateTime(dt));
        }

        #[test]
        fn test_guid_round_trip(bytes in any::<[u8; 16]>()) {
            let c = WindowsGuidConverter;
            let value = c.from_directory(&RawValue::Binary(bytes.to_vec())).unwrap();
            prop_assert_eq!(c.to_directory(&value).unwrap(), RawValue::Binary(bytes.to_vec()));
        }

        #[test]
        fn test_sid_string_round_trip(subs in proptest::collection::vec(any::<u32>(), 0..8)) {
            let c = WindowsSidConverter;
            let mut sid = "S-1-5".to_string();
            for sub in &subs {
                sid.push_str(&format!("-{sub}"));
            }
            let raw = c.to_directory(&AttributeValue::String(sid.clone())).unwrap();
            prop_assert_eq!(c.from_directory(&raw).unwrap(), AttributeValue::String(sid));
        }
    }
}
