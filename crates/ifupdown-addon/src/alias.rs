//! Alias resolution.
//!
//! Users may spell an attribute in more than one way (`link-mtu` for
//! `mtu`, `bond-ports` for `bond-slaves`, ...). Each addon builds an
//! [`AliasIndex`] from its metadata once, at construction, and rewrites
//! the keys of incoming interface records to canonical names before any
//! attribute-dependent processing happens.
//!
//! # Collisions
//!
//! When two canonical attributes list the same alias, [`AliasIndex::build`]
//! keeps the attribute declared *last* and records the collision in
//! [`AliasIndex::conflicts`]. [`AliasIndex::build_strict`] refuses such
//! metadata instead.
//!
//! When rewriting makes two keys of one record collapse onto the same
//! canonical name, the resulting entry stays at the position of the first
//! occurrence and carries the value of the last one.

use std::collections::HashMap;

use crate::error::{AddonError, AddonResult};
use crate::iface::{ConfigRecord, IfaceConfig};
use crate::metadata::AddonMetadata;

/// One alias claimed by two canonical attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    /// Attribute that held the alias before being overridden.
    pub first: String,
    /// Attribute the alias resolves to.
    pub second: String,
}

/// Alias -> canonical attribute name.
///
/// Immutable once built; owned by exactly one addon instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasIndex {
    aliases: HashMap<String, String>,
    conflicts: Vec<AliasConflict>,
}

impl AliasIndex {
    /// Builds the index, letting the last declared attribute win on
    /// collisions.
    pub fn build(metadata: &AddonMetadata) -> Self {
        let mut aliases = HashMap::new();
        let mut conflicts = Vec::new();

        for (attribute, descriptor) in metadata.attrs.iter() {
            for alias in &descriptor.aliases {
                if let Some(previous) = aliases.insert(alias.clone(), attribute.to_string()) {
                    if previous != attribute {
                        conflicts.push(AliasConflict {
                            alias: alias.clone(),
                            first: previous,
                            second: attribute.to_string(),
                        });
                    }
                }
            }
        }

        Self { aliases, conflicts }
    }

    /// Builds the index, rejecting aliases claimed twice or spelled like a
    /// canonical attribute.
    pub fn build_strict(metadata: &AddonMetadata) -> AddonResult<Self> {
        let index = Self::build(metadata);

        if let Some(conflict) = index.conflicts.first() {
            return Err(AddonError::DuplicateAlias {
                alias: conflict.alias.clone(),
                first: conflict.first.clone(),
                second: conflict.second.clone(),
            });
        }

        for (attribute, descriptor) in metadata.attrs.iter() {
            if let Some(alias) = descriptor
                .aliases
                .iter()
                .find(|alias| metadata.attrs.contains(alias))
            {
                return Err(AddonError::AliasShadowsAttribute {
                    alias: alias.clone(),
                    attribute: attribute.to_string(),
                });
            }
        }

        Ok(index)
    }

    /// Builds the index for optional metadata; `None` yields an empty index.
    pub fn from_optional(metadata: Option<&AddonMetadata>) -> Self {
        metadata.map(Self::build).unwrap_or_default()
    }

    /// Canonical name for an alias, if `key` is one.
    pub fn canonical_for(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Canonical name for `key`, or `key` itself when it is not an alias.
    pub fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.canonical_for(key).unwrap_or(key)
    }

    pub fn contains_alias(&self, key: &str) -> bool {
        self.aliases.contains_key(key)
    }

    /// Collisions seen while building, in discovery order.
    pub fn conflicts(&self) -> &[AliasConflict] {
        &self.conflicts
    }

    /// `(alias, canonical)` pairs sorted by alias.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut pairs: Vec<_> = self
            .aliases
            .iter()
            .map(|(alias, canonical)| (alias.as_str(), canonical.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Rewrites the keys of one attribute map, preserving order.
    pub fn translate_config<V>(&self, config: IfaceConfig<V>) -> IfaceConfig<V> {
        if self.aliases.is_empty() {
            return config;
        }

        config
            .into_iter()
            .map(|(key, value)| match self.aliases.get(&key) {
                Some(canonical) => (canonical.clone(), value),
                None => (key, value),
            })
            .collect()
    }

    /// Rewrites every record of a batch in place.
    pub fn translate<'r, R, I>(&self, records: I)
    where
        R: ConfigRecord + 'r,
        I: IntoIterator<Item = &'r mut R>,
    {
        for record in records {
            let config = std::mem::take(record.config_mut());
            *record.config_mut() = self.translate_config(config);
        }
    }
}
