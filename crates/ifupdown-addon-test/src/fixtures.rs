//! Test fixtures for common addon patterns
//!
//! Provides reusable metadata, addon modules and interface records

use ifupdown_addon::{
    Addon, AddonMetadata, AddonModule, AddonResult, AttributeDescriptor, Interface,
};
use once_cell::sync::Lazy;

/// Metadata fixtures modelled on real addons
pub mod metadata_fixtures {
    use super::*;

    /// Link settings with a single `link-mtu` alias for `mtu`
    pub fn link() -> AddonMetadata {
        AddonMetadata::new()
            .help("link settings")
            .attr(
                "mtu",
                AttributeDescriptor::new()
                    .help("interface mtu")
                    .alias("link-mtu")
                    .example("mtu 9000"),
            )
            .attr(
                "hwaddress",
                AttributeDescriptor::new()
                    .help("hardware address")
                    .alias("link-address"),
            )
    }

    /// Bond settings, several attributes accepting underscore spellings
    pub fn bond() -> AddonMetadata {
        AddonMetadata::new()
            .help("bond configuration")
            .attr(
                "bond-slaves",
                AttributeDescriptor::new()
                    .help("bond slaves")
                    .alias("bond-ports")
                    .required(),
            )
            .attr(
                "bond-mode",
                AttributeDescriptor::new()
                    .validvals(["balance-rr", "active-backup", "802.3ad"])
                    .default_value("balance-rr"),
            )
            .attr(
                "bond-xmit-hash-policy",
                AttributeDescriptor::new().alias("bond-xmit_hash_policy"),
            )
            .attr(
                "bond-lacp-rate",
                AttributeDescriptor::new().alias("bond-lacp_rate"),
            )
            .attr(
                "bond-min-links",
                AttributeDescriptor::new().alias("bond-min_links"),
            )
            .attr(
                "bond-ad-actor-sys-prio",
                AttributeDescriptor::new().alias("bond-ad-sys-priority"),
            )
            .attr(
                "bond-ad-actor-system",
                AttributeDescriptor::new().alias("bond-ad-sys-mac-addr"),
            )
    }

    /// Two attributes claiming the same alias
    pub fn conflicting() -> AddonMetadata {
        AddonMetadata::new()
            .attr("a", AttributeDescriptor::new().alias("x"))
            .attr("b", AttributeDescriptor::new().alias("x"))
    }

    /// Attributes without aliases
    pub fn no_aliases() -> AddonMetadata {
        AddonMetadata::new()
            .attr("address", AttributeDescriptor::new())
            .attr("gateway", AttributeDescriptor::new())
    }
}

static LINK_METADATA: Lazy<AddonMetadata> = Lazy::new(metadata_fixtures::link);
static BOND_METADATA: Lazy<AddonMetadata> = Lazy::new(metadata_fixtures::bond);

/// Addon module with [`metadata_fixtures::link`] metadata
pub struct LinkAddon {
    pub base: Addon,
}

impl AddonModule for LinkAddon {
    const NAME: &'static str = "link";

    fn metadata() -> Option<&'static AddonMetadata> {
        Some(&LINK_METADATA)
    }
}

impl LinkAddon {
    pub fn new() -> AddonResult<Self> {
        Ok(Self {
            base: Addon::new::<Self>()?,
        })
    }
}

/// Addon module with [`metadata_fixtures::bond`] metadata
pub struct BondAddon {
    pub base: Addon,
}

impl AddonModule for BondAddon {
    const NAME: &'static str = "bond";

    fn metadata() -> Option<&'static AddonMetadata> {
        Some(&BOND_METADATA)
    }
}

impl BondAddon {
    pub fn new() -> AddonResult<Self> {
        Ok(Self {
            base: Addon::new::<Self>()?,
        })
    }
}

/// Addon module declaring no metadata at all
pub struct PlainAddon {
    pub base: Addon,
}

impl AddonModule for PlainAddon {
    const NAME: &'static str = "plain";
}

impl PlainAddon {
    pub fn new() -> AddonResult<Self> {
        Ok(Self {
            base: Addon::new::<Self>()?,
        })
    }
}

/// Common interface record fixtures
pub mod iface_fixtures {
    use super::*;

    /// Interface with the given attributes, one value each, in order
    pub fn iface(name: &str, attrs: &[(&str, &str)]) -> Interface {
        attrs
            .iter()
            .fold(Interface::new(name), |iface, (k, v)| iface.with_attr(*k, *v))
    }

    /// Physical port using the `link-mtu` alias
    pub fn port_with_link_mtu(name: &str, mtu: &str) -> Interface {
        iface(name, &[("link-mtu", mtu), ("mode", "trunk")])
    }

    /// Bond written with legacy underscore spellings
    pub fn legacy_bond(name: &str) -> Interface {
        iface(
            name,
            &[
                ("bond-ports", "swp1 swp2"),
                ("bond-mode", "802.3ad"),
                ("bond-xmit_hash_policy", "layer3+4"),
                ("bond-lacp_rate", "1"),
                ("bond-min_links", "1"),
            ],
        )
    }
}

/// Translate scenario builder
#[derive(Debug, Clone)]
pub struct TranslateScenario {
    /// Scenario name
    pub name: String,
    /// Addon metadata, `None` for an addon without metadata
    pub metadata: Option<AddonMetadata>,
    /// Records handed to translate
    pub records: Vec<Interface>,
    /// Expected keys per record after translate
    pub expected_keys: Vec<Vec<String>>,
}

impl TranslateScenario {
    /// Create a new scenario
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
            records: Vec::new(),
            expected_keys: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: AddonMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a record and the keys it should end up with
    pub fn with_record(mut self, record: Interface, expected_keys: &[&str]) -> Self {
        self.records.push(record);
        self.expected_keys
            .push(expected_keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Build an addon for the scenario and translate its records
    pub fn run(&self) -> AddonResult<Vec<Interface>> {
        let addon = Addon::builder(self.name.clone())
            .metadata(self.metadata.as_ref())
            .build()?;

        let mut records = self.records.clone();
        addon.translate(&mut records);
        Ok(records)
    }
}
