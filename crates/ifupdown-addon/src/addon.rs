//! Addon base.
//!
//! Every interface-configuration addon embeds an [`Addon`], which gives it
//! the common capabilities and its alias index:
//!
//! - netlink access and the link cache, embedded and reachable through
//!   the [`NetlinkCapable`] and [`CacheCapable`] traits
//! - raw file I/O ([`Io`]), the process-wide [`Sysfs`] accessor, the
//!   [`IpRoute2`] route-table accessor and a [`Requirements`] checker
//! - a logger scoped to the addon type name
//!
//! # Example
//!
//! ```
//! use ifupdown_addon::{
//!     Addon, AddonMetadata, AddonModule, AddonResult, AttributeDescriptor, Interface,
//! };
//! use once_cell::sync::Lazy;
//!
//! static METADATA: Lazy<AddonMetadata> = Lazy::new(|| {
//!     AddonMetadata::new()
//!         .help("link settings")
//!         .attr("mtu", AttributeDescriptor::new().alias("link-mtu"))
//! });
//!
//! struct Link {
//!     base: Addon,
//! }
//!
//! impl AddonModule for Link {
//!     const NAME: &'static str = "link";
//!
//!     fn metadata() -> Option<&'static AddonMetadata> {
//!         Some(&METADATA)
//!     }
//! }
//!
//! fn main() -> AddonResult<()> {
//!     let link = Link { base: Addon::new::<Link>()? };
//!
//!     let mut ifaces = vec![Interface::new("eth0").with_attr("link-mtu", "9000")];
//!     link.base.translate(&mut ifaces);
//!     assert_eq!(ifaces[0].config.first("mtu"), Some("9000"));
//!     Ok(())
//! }
//! ```

use std::fmt;

use tracing::Span;

use crate::alias::AliasIndex;
use crate::cache::Cache;
use crate::defaults;
use crate::error::AddonResult;
use crate::iface::ConfigRecord;
use crate::io::Io;
use crate::iproute2::IpRoute2;
use crate::metadata::AddonMetadata;
use crate::netlink::Netlink;
use crate::requirements::Requirements;
use crate::sysfs::Sysfs;

/// Implemented by every concrete addon type.
pub trait AddonModule {
    /// Addon type name, used to scope the logger (e.g. "bond", "vxlan").
    const NAME: &'static str;

    /// Attributes the addon understands. `None` means no attributes and
    /// therefore no aliases.
    fn metadata() -> Option<&'static AddonMetadata> {
        None
    }
}

/// Access to the kernel netlink capability.
pub trait NetlinkCapable {
    fn netlink(&self) -> &Netlink;

    fn netlink_mut(&mut self) -> &mut Netlink;
}

/// Access to the link cache capability.
pub trait CacheCapable {
    fn cache(&self) -> &Cache;

    fn cache_mut(&mut self) -> &mut Cache;

    /// Refills the cache from a fresh netlink dump.
    fn refresh_cache(&mut self) -> AddonResult<usize>
    where
        Self: NetlinkCapable,
    {
        let links = self.netlink_mut().dump_links()?;
        let count = links.len();
        self.cache_mut().update(links);
        Ok(count)
    }
}

/// Logger scoped to one addon type.
///
/// Every event carries an `addon` field holding
/// `ifupdown2.addons.<NAME>`.
#[derive(Debug, Clone)]
pub struct AddonLogger {
    name: String,
}

impl AddonLogger {
    pub fn new(addon: &str) -> Self {
        Self {
            name: format!("{}.{}", defaults::LOGGER_PREFIX, addon),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Span to enter around a unit of work of this addon.
    pub fn span(&self) -> Span {
        tracing::info_span!("addon", addon = %self.name)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(addon = %self.name, "{}", message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(addon = %self.name, "{}", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(addon = %self.name, "{}", message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(addon = %self.name, "{}", message);
    }
}

/// Assembles an [`Addon`], optionally replacing its collaborators.
pub struct AddonBuilder<'m> {
    name: String,
    metadata: Option<&'m AddonMetadata>,
    strict_aliases: bool,
    connect_netlink: bool,
    dry_run: bool,
    io: Option<Io>,
    sysfs: Option<&'static Sysfs>,
    iproute2: Option<IpRoute2>,
    requirements: Option<Requirements>,
}

impl<'m> AddonBuilder<'m> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
            strict_aliases: false,
            connect_netlink: false,
            dry_run: false,
            io: None,
            sysfs: None,
            iproute2: None,
            requirements: None,
        }
    }

    /// Metadata the alias index is built from. `None` is the same as
    /// empty metadata.
    pub fn metadata(mut self, metadata: Option<&'m AddonMetadata>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Rejects metadata whose aliases collide instead of letting the last
    /// declared attribute win.
    pub fn strict_aliases(mut self, strict: bool) -> Self {
        self.strict_aliases = strict;
        self
    }

    /// Opens the netlink socket during `build` rather than on first use.
    pub fn connect_netlink(mut self, connect: bool) -> Self {
        self.connect_netlink = connect;
        self
    }

    /// Default collaborators record changes instead of applying them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn io(mut self, io: Io) -> Self {
        self.io = Some(io);
        self
    }

    pub fn sysfs(mut self, sysfs: &'static Sysfs) -> Self {
        self.sysfs = Some(sysfs);
        self
    }

    pub fn iproute2(mut self, iproute2: IpRoute2) -> Self {
        self.iproute2 = Some(iproute2);
        self
    }

    pub fn requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// Builds the addon. Nothing is returned unless every collaborator was
    /// initialized and the alias index built.
    pub fn build(self) -> AddonResult<Addon> {
        let alias_to_attribute = match (self.metadata, self.strict_aliases) {
            (Some(metadata), true) => AliasIndex::build_strict(metadata)?,
            (metadata, _) => AliasIndex::from_optional(metadata),
        };

        let mut netlink = Netlink::new();
        if self.connect_netlink {
            netlink.connect()?;
        }

        let dry_run = self.dry_run;
        Ok(Addon {
            netlink,
            cache: Cache::new(),
            logger: AddonLogger::new(&self.name),
            io: self
                .io
                .unwrap_or_else(|| if dry_run { Io::dry_run() } else { Io::new() }),
            sysfs: self.sysfs.unwrap_or_else(Sysfs::global),
            iproute2: self.iproute2.unwrap_or_else(|| {
                if dry_run {
                    IpRoute2::dry_run()
                } else {
                    IpRoute2::new()
                }
            }),
            requirements: self.requirements.unwrap_or_default(),
            alias_to_attribute,
            name: self.name,
        })
    }
}

/// Base shared by every addon.
pub struct Addon {
    name: String,
    netlink: Netlink,
    cache: Cache,
    logger: AddonLogger,
    /// Raw file I/O.
    pub io: Io,
    /// Process-wide sysfs accessor.
    pub sysfs: &'static Sysfs,
    /// Route-table accessor.
    pub iproute2: IpRoute2,
    /// Host prerequisite checker.
    pub requirements: Requirements,
    alias_to_attribute: AliasIndex,
}

impl fmt::Debug for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addon")
            .field("name", &self.name)
            .field("netlink", &self.netlink)
            .field("cached_links", &self.cache.len())
            .field("aliases", &self.alias_to_attribute.len())
            .finish_non_exhaustive()
    }
}

impl Addon {
    /// Builds the base for addon type `M` with default collaborators.
    pub fn new<M: AddonModule>() -> AddonResult<Self> {
        Self::builder(M::NAME).metadata(M::metadata()).build()
    }

    pub fn builder<'m>(name: impl Into<String>) -> AddonBuilder<'m> {
        AddonBuilder::new(name)
    }

    /// Addon type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logger(&self) -> &AddonLogger {
        &self.logger
    }

    pub fn alias_index(&self) -> &AliasIndex {
        &self.alias_to_attribute
    }

    /// Replaces attribute aliases in user configuration with the canonical
    /// attribute names, in place and without reordering keys.
    pub fn translate<'r, R, I>(&self, records: I)
    where
        R: ConfigRecord + 'r,
        I: IntoIterator<Item = &'r mut R>,
    {
        self.alias_to_attribute.translate(records);
    }
}

impl NetlinkCapable for Addon {
    fn netlink(&self) -> &Netlink {
        &self.netlink
    }

    fn netlink_mut(&mut self) -> &mut Netlink {
        &mut self.netlink
    }
}

impl CacheCapable for Addon {
    fn cache(&self) -> &Cache {
        &self.cache
    }

    fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }
}
