//! Default paths and settings used by the capability collaborators.

/// Path to the `ip` command.
pub const IP_CMD: &str = "/sbin/ip";

/// Root of the per-interface sysfs tree.
pub const SYSFS_NET_ROOT: &str = "/sys/class/net";

/// Root of the loaded kernel module tree.
pub const SYSFS_MODULE_ROOT: &str = "/sys/module";

/// Directories searched for required binaries, in order.
pub const BINARY_SEARCH_PATH: &[&str] = &["/sbin", "/usr/sbin", "/bin", "/usr/bin"];

/// Logger name prefix; the addon type name is appended.
pub const LOGGER_PREFIX: &str = "ifupdown2.addons";
