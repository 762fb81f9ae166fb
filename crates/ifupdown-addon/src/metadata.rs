//! Static addon metadata.
//!
//! Every addon type may describe the attributes it understands: a help
//! string per attribute, accepted values and, most importantly for the
//! base, the alternative spellings (aliases) users may write instead of
//! the canonical name.
//!
//! Metadata is declared once per addon type, typically in a
//! `once_cell::sync::Lazy` static, or loaded from a YAML/JSON document:
//!
//! ```
//! use ifupdown_addon::AddonMetadata;
//!
//! let metadata = AddonMetadata::from_yaml(
//!     r#"
//! mhelp: link settings
//! attrs:
//!   mtu:
//!     help: interface mtu
//!     aliases: [link-mtu]
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(metadata.attrs.get("mtu").unwrap().aliases, vec!["link-mtu"]);
//! ```

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AddonError, AddonResult};

/// Description of one canonical attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Human readable help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Alternative spellings accepted in user configuration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Accepted values, when the attribute is an enumeration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validvals: Vec<String>,
    /// Value used when the attribute is not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Usage examples.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl AttributeDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Adds one alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds several aliases, in order.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the accepted values.
    pub fn validvals<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validvals = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds a usage example.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example.push(example.into());
        self
    }

    /// Marks the attribute as mandatory.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Canonical attribute name -> descriptor, in declaration order.
///
/// Declaration order is significant: it decides which attribute wins when
/// two of them claim the same alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    entries: Vec<(String, AttributeDescriptor)>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute. Redeclaring a name replaces its descriptor
    /// without moving it.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: AttributeDescriptor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.entries.push((name, descriptor)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Canonical names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AttributeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, descriptor) in &self.entries {
            map.serialize_entry(name, descriptor)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = AttributeTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to attribute descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = AttributeTable::new();
                while let Some((name, descriptor)) =
                    access.next_entry::<String, AttributeDescriptor>()?
                {
                    table.insert(name, descriptor);
                }
                Ok(table)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(AttributeTable::new())
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Per-addon-type metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonMetadata {
    /// Module help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mhelp: Option<String>,
    /// Recognized attributes.
    #[serde(default)]
    pub attrs: AttributeTable,
}

impl AddonMetadata {
    /// Creates metadata with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the module help text.
    pub fn help(mut self, mhelp: impl Into<String>) -> Self {
        self.mhelp = Some(mhelp.into());
        self
    }

    /// Declares an attribute (builder style).
    pub fn attr(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.attrs.insert(name, descriptor);
        self
    }

    /// Parses metadata from a YAML document.
    pub fn from_yaml(yaml: &str) -> AddonResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| AddonError::metadata(e.to_string()))
    }

    /// Parses metadata from a JSON document.
    pub fn from_json(json: &str) -> AddonResult<Self> {
        serde_json::from_str(json).map_err(|e| AddonError::metadata(e.to_string()))
    }

    /// Loads metadata from a file. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn from_file(path: &Path) -> AddonResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AddonError::io(path, e))?;

        let parsed = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        };

        parsed.map_err(|e| match e {
            AddonError::Metadata { message } => {
                AddonError::metadata(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_builder() {
        let metadata = AddonMetadata::new()
            .help("bond configuration")
            .attr(
                "bond-slaves",
                AttributeDescriptor::new().help("bond slaves").alias("bond-ports"),
            )
            .attr(
                "bond-mode",
                AttributeDescriptor::new()
                    .validvals(["balance-rr", "802.3ad"])
                    .default_value("balance-rr"),
            );

        assert_eq!(metadata.mhelp.as_deref(), Some("bond configuration"));
        assert_eq!(
            metadata.attrs.names().collect::<Vec<_>>(),
            vec!["bond-slaves", "bond-mode"]
        );
        assert_eq!(
            metadata.attrs.get("bond-slaves").unwrap().aliases,
            vec!["bond-ports".to_string()]
        );
        assert!(metadata.attrs.get("bond-mode").unwrap().aliases.is_empty());
    }

    #[test]
    fn test_redeclare_keeps_position() {
        let mut table = AttributeTable::new();
        table.insert("a", AttributeDescriptor::new());
        table.insert("b", AttributeDescriptor::new());
        table.insert("a", AttributeDescriptor::new().alias("x"));

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.get("a").unwrap().aliases, vec!["x".to_string()]);
    }

    #[test]
    fn test_yaml_preserves_declaration_order() {
        let metadata = AddonMetadata::from_yaml(
            r#"
attrs:
  zeta:
    aliases: [z]
  alpha:
    aliases: [a1, a2]
  mid: {}
"#,
        )
        .unwrap();

        assert_eq!(
            metadata.attrs.names().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
        assert_eq!(
            metadata.attrs.get("alpha").unwrap().aliases,
            vec!["a1".to_string(), "a2".to_string()]
        );
    }

    #[test]
    fn test_missing_attrs_is_empty() {
        let metadata = AddonMetadata::from_yaml("mhelp: nothing here\n").unwrap();
        assert!(metadata.attrs.is_empty());

        let metadata = AddonMetadata::from_json("{}").unwrap();
        assert_eq!(metadata, AddonMetadata::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = AddonMetadata::from_yaml("attrs: [1, 2").unwrap_err();
        assert!(matches!(err, AddonError::Metadata { .. }));
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let metadata = AddonMetadata::new()
            .attr("mtu", AttributeDescriptor::new().alias("link-mtu"))
            .attr("hwaddress", AttributeDescriptor::new());

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.find("mtu").unwrap() < json.find("hwaddress").unwrap());
        assert_eq!(AddonMetadata::from_json(&json).unwrap(), metadata);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("link.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(br#"{"attrs": {"mtu": {"aliases": ["link-mtu"]}}}"#)
            .unwrap();
        let metadata = AddonMetadata::from_file(&json_path).unwrap();
        assert!(metadata.attrs.contains("mtu"));

        let yaml_path = dir.path().join("link.yaml");
        std::fs::write(&yaml_path, "attrs:\n  mtu:\n    aliases: [link-mtu]\n").unwrap();
        assert_eq!(AddonMetadata::from_file(&yaml_path).unwrap(), metadata);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AddonMetadata::from_file(Path::new("/nonexistent/addon.yaml")).unwrap_err();
        assert!(matches!(err, AddonError::Io { .. }));
    }
}
