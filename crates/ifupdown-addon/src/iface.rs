//! Interface configuration records.
//!
//! An interface object carries the user-supplied attributes of one
//! `iface` stanza as an ordered key/value list. Addons only ever rewrite
//! keys; values are opaque to the base.

use serde::{Deserialize, Deserializer, Serialize};

/// Ordered attribute map of one interface.
///
/// Entries keep their insertion order. Inserting a key that is already
/// present replaces the value in place, so the key keeps the position of
/// its first occurrence. Deserialization follows the same rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IfaceConfig<V = Vec<String>> {
    entries: Vec<(String, V)>,
}

impl<V> Default for IfaceConfig<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> IfaceConfig<V> {
    /// Creates an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, returning the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Gets the value for an attribute, if present.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Gets a mutable reference to the value for an attribute.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Checks if an attribute exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Attribute names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IfaceConfig<Vec<String>> {
    /// Appends a value to a multi-valued attribute, creating it if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(values) => values.push(value.into()),
            None => {
                self.entries.push((key, vec![value.into()]));
            }
        }
    }

    /// First value of an attribute.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for IfaceConfig<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = IfaceConfig::new();
        for (k, v) in iter {
            config.insert(k, v);
        }
        config
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for IfaceConfig<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<(String, V)>::deserialize(deserializer).map(|entries| entries.into_iter().collect())
    }
}

impl<V> IntoIterator for IfaceConfig<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Anything exposing a mutable, ordered attribute map.
///
/// The orchestrator hands batches of these to [`crate::Addon::translate`].
pub trait ConfigRecord {
    /// Attribute value type; never inspected by the addon base.
    type Value;

    fn config(&self) -> &IfaceConfig<Self::Value>;

    fn config_mut(&mut self) -> &mut IfaceConfig<Self::Value>;
}

/// One `iface` stanza as parsed from an interfaces file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Interface name (e.g. "eth0", "br0").
    pub name: String,
    /// Address family ("inet", "inet6"), if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr_family: Option<String>,
    /// Configuration method ("static", "dhcp", "manual"), if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Whether the interface is listed in an `auto` stanza.
    #[serde(default)]
    pub auto: bool,
    /// User-supplied attributes; repeated attributes accumulate values.
    #[serde(default)]
    pub config: IfaceConfig<Vec<String>>,
}

impl Interface {
    /// Creates an interface with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds an attribute value (builder style).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.append(key, value);
        self
    }
}

impl ConfigRecord for Interface {
    type Value = Vec<String>;

    fn config(&self) -> &IfaceConfig<Vec<String>> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut IfaceConfig<Vec<String>> {
        &mut self.config
    }
}
