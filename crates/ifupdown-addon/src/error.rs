//! Addon errors.
//!
//! One error type covers alias-index construction, metadata loading and
//! the capability collaborators (netlink, files, commands, host checks).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type AddonResult<T> = Result<T, AddonError>;

#[derive(Debug, Error)]
pub enum AddonError {
    /// Strict alias checking: one alias listed under two attributes.
    #[error("Alias '{alias}' is claimed by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    /// Strict alias checking: an alias spelled like a canonical attribute.
    #[error("Alias '{alias}' of '{attribute}' shadows a canonical attribute name")]
    AliasShadowsAttribute { alias: String, attribute: String },

    #[error("Invalid addon metadata: {message}")]
    Metadata { message: String },

    /// `operation` names the capability method, e.g. `link_set_mtu`.
    #[error("Netlink {operation} failed: {message}")]
    Netlink { operation: String, message: String },

    #[error("Link '{name}' not found")]
    LinkNotFound { name: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The command could not be started at all.
    #[error("Cannot run '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The command ran and exited non-zero. `output` holds stdout and
    /// stderr joined.
    #[error("'{command}' exited with status {status}: {output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },

    #[error("Missing {kind} '{name}'")]
    MissingRequirement { kind: String, name: String },

    /// A kernel or sysfs value that does not parse.
    #[error("Unexpected value '{value}' for {what}")]
    InvalidValue { what: String, value: String },
}

impl AddonError {
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    pub fn netlink(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Netlink {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn link_not_found(name: impl Into<String>) -> Self {
        Self::LinkNotFound { name: name.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(what: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            what: what.into(),
            value: value.into(),
        }
    }

    /// Kernel and command failures can be transient (EBUSY, a link being
    /// renamed, ...); configuration errors never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AddonError::Netlink { .. } | AddonError::CommandFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_alias_display() {
        let err = AddonError::DuplicateAlias {
            alias: "x".to_string(),
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert_eq!(err.to_string(), "Alias 'x' is claimed by both 'a' and 'b'");
    }

    #[test]
    fn test_netlink_error() {
        let err = AddonError::netlink("dump_links", "Operation not permitted");
        assert_eq!(
            err.to_string(),
            "Netlink dump_links failed: Operation not permitted"
        );
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = AddonError::io(
            "/sys/class/net/eth0/mtu",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("/sys/class/net/eth0/mtu"));
        assert!(text.contains("denied"));
    }

    #[test]
    fn test_missing_requirement() {
        let err = AddonError::MissingRequirement {
            kind: "kernel module".to_string(),
            name: "bonding".to_string(),
        };
        assert_eq!(err.to_string(), "Missing kernel module 'bonding'");
    }

    #[test]
    fn test_command_failed_display() {
        let err = AddonError::CommandFailed {
            command: "ip link set dev swp1 up".to_string(),
            status: 2,
            output: "Cannot find device".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'ip link set dev swp1 up' exited with status 2: Cannot find device"
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(AddonError::netlink("link_set_mtu", "busy").is_retryable());
        assert!(!AddonError::metadata("bad yaml").is_retryable());
        assert!(!AddonError::invalid_value("mtu of eth0", "abc").is_retryable());
        assert!(!AddonError::link_not_found("eth9").is_retryable());
    }
}
