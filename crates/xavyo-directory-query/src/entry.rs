//! Raw directory entries
//!
//! What a transport hands back for one search result: a DN and an ordered
//! list of attributes, each with its raw values. Attribute names are matched
//! case-insensitively.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::RawValue;

/// Values as some directory client APIs return them: an explicit count plus
/// an indexed list that may carry trailing bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedValues {
    pub count: usize,
    pub values: Vec<RawValue>,
}

impl CountedValues {
    #[must_use]
    pub fn new(count: usize, values: Vec<RawValue>) -> Self {
        Self { count, values }
    }
}

/// One raw search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    /// Lowercased name -> (name as first seen, values).
    attributes: IndexMap<String, (String, Vec<RawValue>)>,
}

impl RawEntry {
    /// Create an empty entry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the distinguished name.
    #[must_use]
    pub fn with_dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = Some(dn.into());
        self
    }

    /// Build an entry from ordered `(name, values)` pairs.
    #[must_use]
    pub fn from_pairs<N, I, V>(pairs: impl IntoIterator<Item = (N, I)>) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        let mut entry = Self::new();
        for (name, values) in pairs {
            entry.insert(name, values.into_iter().map(Into::into).collect());
        }
        entry
    }

    /// Build an entry from counted value lists.
    ///
    /// Values beyond each declared count are dropped, as are `count` and
    /// positional keys.
    #[must_use]
    pub fn from_counted<N: Into<String>>(
        dn: Option<String>,
        attributes: impl IntoIterator<Item = (N, CountedValues)>,
    ) -> Self {
        let mut entry = Self {
            dn,
            attributes: IndexMap::new(),
        };
        for (name, counted) in attributes {
            let name = name.into();
            if is_bookkeeping_key(&name) {
                continue;
            }
            let mut values = counted.values;
            values.truncate(counted.count);
            entry.insert(name, values);
        }
        entry
    }

    /// Append values, merging with an existing attribute of the same name in
    /// any case.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<RawValue>) {
        let name = name.into();
        self.attributes
            .entry(name.to_lowercase())
            .or_insert_with(|| (name, Vec::new()))
            .1
            .extend(values);
    }

    #[must_use]
    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    /// Get an attribute's values by name, in any case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[RawValue]> {
        self.attributes
            .get(&name.to_lowercase())
            .map(|(_, values)| values.as_slice())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_lowercase())
    }

    /// All attributes as stored, bookkeeping included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawValue])> {
        self.attributes
            .values()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Attributes with bookkeeping keys removed.
    pub fn normalized(&self) -> impl Iterator<Item = (&str, &[RawValue])> {
        self.iter().filter(|(name, _)| !is_bookkeeping_key(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// `count`, `dn` and purely numeric (positional) keys are not attributes.
fn is_bookkeeping_key(name: &str) -> bool {
    name.is_empty()
        || name.eq_ignore_ascii_case("count")
        || name.eq_ignore_ascii_case("dn")
        || name.bytes().all(|b| b.is_ascii_digit())
}

impl From<ldap3::SearchEntry> for RawEntry {
    fn from(entry: ldap3::SearchEntry) -> Self {
        let mut attributes: Vec<(String, Vec<RawValue>)> = entry
            .attrs
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().map(RawValue::Text).collect::<Vec<_>>()))
            .chain(
                entry
                    .bin_attrs
                    .into_iter()
                    .map(|(name, values)| {
                        (name, values.into_iter().map(RawValue::Binary).collect::<Vec<_>>())
                    }),
            )
            .collect();
        // The search result maps are unordered.
        attributes.sort_by_key(|(name, _)| name.to_lowercase());

        let mut raw = RawEntry::new().with_dn(entry.dn);
        for (name, values) in attributes {
            raw.insert(name, values);
        }
        raw
    }
}
