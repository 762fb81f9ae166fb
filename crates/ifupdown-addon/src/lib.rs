//! Base infrastructure for ifupdown interface-configuration addons.
//!
//! Every addon (bond, bridge, vxlan, address, ...) embeds an [`Addon`],
//! which provides:
//!
//! - [`netlink`]: kernel rtnetlink access ([`NetlinkCapable`])
//! - [`cache`]: link cache ([`CacheCapable`])
//! - [`io`], [`sysfs`], [`iproute2`], [`requirements`]: file I/O, sysfs,
//!   route table and host prerequisite collaborators
//! - [`alias`]: resolution of user-facing attribute aliases to canonical
//!   attribute names, driven by the addon's [`AddonMetadata`]
//!
//! # Flow
//!
//! 1. The orchestrator constructs each addon once (`Addon::new::<M>()`)
//! 2. Interface stanzas are parsed into [`Interface`] records
//! 3. The orchestrator calls [`Addon::translate`] on the batch, turning
//!    every alias key into its canonical attribute name
//! 4. Addon logic runs against canonical names only

pub mod addon;
pub mod alias;
pub mod cache;
pub mod defaults;
pub mod error;
pub mod iface;
pub mod io;
pub mod iproute2;
pub mod metadata;
pub mod netlink;
pub mod requirements;
pub mod shell;
pub mod sysfs;

// Re-export commonly used items at crate root
pub use addon::{Addon, AddonBuilder, AddonLogger, AddonModule, CacheCapable, NetlinkCapable};
pub use alias::{AliasConflict, AliasIndex};
pub use cache::{Cache, LinkInfo};
pub use error::{AddonError, AddonResult};
pub use iface::{ConfigRecord, IfaceConfig, Interface};
pub use io::Io;
pub use iproute2::{IpRoute2, RouteEntry};
pub use metadata::{AddonMetadata, AttributeDescriptor, AttributeTable};
pub use netlink::Netlink;
pub use requirements::{Requirement, Requirements};
pub use sysfs::Sysfs;
