//! Prerequisite checks.
//!
//! Addons declare what they need from the host (binaries, kernel modules)
//! and check it before touching anything. Results are memoized per
//! checker.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::defaults;
use crate::error::{AddonError, AddonResult};

/// Something an addon needs from the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// An executable found in the binary search path.
    Binary(String),
    /// A loaded (or built-in) kernel module.
    KernelModule(String),
}

impl Requirement {
    pub fn binary(name: impl Into<String>) -> Self {
        Self::Binary(name.into())
    }

    pub fn kernel_module(name: impl Into<String>) -> Self {
        Self::KernelModule(name.into())
    }

    fn kind(&self) -> &'static str {
        match self {
            Requirement::Binary(_) => "binary",
            Requirement::KernelModule(_) => "kernel module",
        }
    }

    fn name(&self) -> &str {
        match self {
            Requirement::Binary(name) | Requirement::KernelModule(name) => name,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.name())
    }
}

/// Host capability checker.
#[derive(Debug, Clone)]
pub struct Requirements {
    search_path: Vec<PathBuf>,
    module_root: PathBuf,
    checked: HashMap<Requirement, bool>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self::new()
    }
}

impl Requirements {
    pub fn new() -> Self {
        Self::with_roots(
            defaults::BINARY_SEARCH_PATH.iter().map(PathBuf::from),
            defaults::SYSFS_MODULE_ROOT,
        )
    }

    /// Creates a checker looking for binaries in `search_path` and for
    /// modules under `module_root`.
    pub fn with_roots<I, P>(search_path: I, module_root: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_path: search_path.into_iter().map(Into::into).collect(),
            module_root: module_root.into(),
            checked: HashMap::new(),
        }
    }

    /// Whether a requirement is met. Memoized.
    pub fn is_met(&mut self, requirement: &Requirement) -> bool {
        if let Some(met) = self.checked.get(requirement) {
            return *met;
        }

        let met = match requirement {
            Requirement::Binary(name) => self.search_path.iter().any(|dir| dir.join(name).is_file()),
            Requirement::KernelModule(name) => {
                // sysfs uses underscores for module names
                self.module_root.join(name.replace('-', "_")).is_dir()
            }
        };

        debug!(requirement = %requirement, met, "Checked requirement");
        self.checked.insert(requirement.clone(), met);
        met
    }

    pub fn has_binary(&mut self, name: &str) -> bool {
        self.is_met(&Requirement::binary(name))
    }

    pub fn has_kernel_module(&mut self, name: &str) -> bool {
        self.is_met(&Requirement::kernel_module(name))
    }

    /// Fails on the first requirement that is not met.
    pub fn check(&mut self, requirements: &[Requirement]) -> AddonResult<()> {
        for requirement in requirements {
            if !self.is_met(requirement) {
                return Err(AddonError::MissingRequirement {
                    kind: requirement.kind().to_string(),
                    name: requirement.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Forgets memoized results.
    pub fn reset(&mut self) {
        self.checked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_host() -> (tempfile::TempDir, Requirements) {
        let dir = tempfile::tempdir().unwrap();
        let sbin = dir.path().join("sbin");
        let modules = dir.path().join("module");
        std::fs::create_dir_all(&sbin).unwrap();
        std::fs::create_dir_all(modules.join("8021q")).unwrap();
        std::fs::create_dir_all(modules.join("nf_conntrack")).unwrap();
        std::fs::write(sbin.join("ip"), "").unwrap();

        let requirements = Requirements::with_roots([sbin], modules);
        (dir, requirements)
    }

    #[test]
    fn test_binaries() {
        let (_dir, mut requirements) = fake_host();
        assert!(requirements.has_binary("ip"));
        assert!(!requirements.has_binary("mstpctl"));
    }

    #[test]
    fn test_kernel_modules() {
        let (_dir, mut requirements) = fake_host();
        assert!(requirements.has_kernel_module("8021q"));
        assert!(requirements.has_kernel_module("nf-conntrack"));
        assert!(!requirements.has_kernel_module("bonding"));
    }

    #[test]
    fn test_check_reports_first_missing() {
        let (_dir, mut requirements) = fake_host();
        requirements
            .check(&[Requirement::binary("ip"), Requirement::kernel_module("8021q")])
            .unwrap();

        match requirements.check(&[
            Requirement::binary("ip"),
            Requirement::kernel_module("bonding"),
            Requirement::binary("ethtool"),
        ]) {
            Err(AddonError::MissingRequirement { kind, name }) => {
                assert_eq!(kind, "kernel module");
                assert_eq!(name, "bonding");
            }
            other => panic!("Expected MissingRequirement, got {:?}", other),
        }
    }

    #[test]
    fn test_results_are_memoized() {
        let (dir, mut requirements) = fake_host();
        assert!(!requirements.has_binary("ethtool"));

        std::fs::write(dir.path().join("sbin").join("ethtool"), "").unwrap();
        assert!(!requirements.has_binary("ethtool"));

        requirements.reset();
        assert!(requirements.has_binary("ethtool"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Requirement::binary("ip").to_string(), "binary 'ip'");
        assert_eq!(
            Requirement::kernel_module("bonding").to_string(),
            "kernel module 'bonding'"
        );
    }
}
