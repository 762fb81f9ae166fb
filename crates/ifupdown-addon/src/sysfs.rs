//! Sysfs accessor.
//!
//! Sysfs holds no per-addon state, so every addon references the same
//! process-wide accessor ([`Sysfs::global`]) instead of owning one.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

use crate::defaults;
use crate::error::{AddonError, AddonResult};
use crate::io::Io;

static GLOBAL: Lazy<Sysfs> = Lazy::new(|| Sysfs::new(defaults::SYSFS_NET_ROOT));

/// Reads and writes `/sys/class/net/<ifname>/...` attributes.
#[derive(Debug, Clone)]
pub struct Sysfs {
    root: PathBuf,
}

impl Sysfs {
    /// Creates an accessor rooted at `root` (normally `/sys/class/net`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The process-wide accessor rooted at [`defaults::SYSFS_NET_ROOT`].
    pub fn global() -> &'static Sysfs {
        &GLOBAL
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn attr_path(&self, ifname: &str, attr: &str) -> PathBuf {
        self.root.join(ifname).join(attr)
    }

    pub fn link_exists(&self, ifname: &str) -> bool {
        !ifname.is_empty() && self.root.join(ifname).exists()
    }

    /// Reads one attribute (e.g. `mtu`, `address`, `bridge/stp_state`).
    pub fn read_attr(&self, io: &Io, ifname: &str, attr: &str) -> AddonResult<Option<String>> {
        io.read_file_oneline(&self.attr_path(ifname, attr))
    }

    /// Writes one attribute through `io`, so dry runs are honoured.
    pub fn write_attr(&self, io: &mut Io, ifname: &str, attr: &str, value: &str) -> AddonResult<()> {
        if !self.link_exists(ifname) {
            return Err(AddonError::link_not_found(ifname));
        }
        io.write_to_file(&self.attr_path(ifname, attr), value)
    }

    /// Current MTU, if the link exists.
    pub fn get_mtu(&self, io: &Io, ifname: &str) -> AddonResult<Option<u32>> {
        match self.read_attr(io, ifname, "mtu")? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AddonError::invalid_value(format!("mtu of {}", ifname), raw)),
            None => Ok(None),
        }
    }

    /// Names of the ports enslaved to a bridge, sorted.
    pub fn bridge_ports(&self, bridge: &str) -> AddonResult<Vec<String>> {
        let brif = self.root.join(bridge).join("brif");
        let entries = match std::fs::read_dir(&brif) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AddonError::io(brif, e)),
        };

        let mut ports = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AddonError::io(&brif, e))?;
            ports.push(entry.file_name().to_string_lossy().into_owned());
        }
        ports.sort();
        Ok(ports)
    }
}
