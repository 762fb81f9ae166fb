//! Operator tooling for ifupdown addons.
//!
//! `ifaddonctl` loads an addon's attribute metadata (YAML or JSON), builds
//! the addon base from it and either:
//!
//! - translates an `interfaces(5)` file, rewriting alias attributes to
//!   their canonical names, or
//! - prints the addon's alias table.
//!
//! # Example
//!
//! ```text
//! $ ifaddonctl translate --metadata bond.yaml --interfaces /etc/network/interfaces
//! $ ifaddonctl --format json aliases --metadata bond.yaml
//! ```

pub mod output;
pub mod parser;

use std::path::Path;

use anyhow::{Context, Result};
use ifupdown_addon::{Addon, AddonMetadata, Interface};
use tracing::{info, warn};

pub use output::Format;
pub use parser::{parse_interfaces, ParseError};

/// Addon name used when none is given: the metadata file stem.
pub fn addon_name(metadata: &Path, name: Option<&str>) -> String {
    name.map(str::to_string)
        .or_else(|| {
            metadata
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "addon".to_string())
}

/// Loads metadata and builds the addon base from it.
pub fn load_addon(metadata_path: &Path, name: Option<&str>, strict: bool) -> Result<Addon> {
    let metadata = AddonMetadata::from_file(metadata_path)
        .with_context(|| format!("Failed to load metadata from {}", metadata_path.display()))?;

    let name = addon_name(metadata_path, name);
    let addon = Addon::builder(name.as_str())
        .metadata(Some(&metadata))
        .strict_aliases(strict)
        .dry_run(true)
        .build()
        .with_context(|| format!("Failed to build addon '{}'", name))?;

    for conflict in addon.alias_index().conflicts() {
        warn!(
            addon = %name,
            alias = %conflict.alias,
            overridden = %conflict.first,
            attribute = %conflict.second,
            "Alias claimed by more than one attribute"
        );
    }

    info!(
        addon = %name,
        attributes = metadata.attrs.len(),
        aliases = addon.alias_index().len(),
        "Loaded addon metadata"
    );
    Ok(addon)
}

/// Parses an interfaces file and translates it with `addon`.
pub fn translate_file(addon: &Addon, interfaces_path: &Path) -> Result<Vec<Interface>> {
    let text = std::fs::read_to_string(interfaces_path)
        .with_context(|| format!("Failed to read {}", interfaces_path.display()))?;

    let mut ifaces = parse_interfaces(&text)
        .with_context(|| format!("Failed to parse {}", interfaces_path.display()))?;

    addon.translate(&mut ifaces);
    info!(
        addon = addon.name(),
        count = ifaces.len(),
        "Translated interfaces"
    );
    Ok(ifaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOND_YAML: &str = "\
mhelp: bond configuration
attrs:
  bond-slaves:
    help: bond slaves
    aliases: [bond-ports]
  bond-xmit-hash-policy:
    aliases: [bond-xmit_hash_policy]
";

    #[test]
    fn test_addon_name() {
        assert_eq!(addon_name(Path::new("/usr/share/addons/bond.yaml"), None), "bond");
        assert_eq!(addon_name(Path::new("bond.yaml"), Some("lacp")), "lacp");
    }

    #[test]
    fn test_translate_file() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = dir.path().join("bond.yaml");
        let interfaces = dir.path().join("interfaces");
        std::fs::write(&metadata, BOND_YAML).unwrap();
        std::fs::write(
            &interfaces,
            "auto bond0\niface bond0\n    bond-ports swp1 swp2\n    bond-mode 802.3ad\n    bond-xmit_hash_policy layer2\n",
        )
        .unwrap();

        let addon = load_addon(&metadata, None, false).unwrap();
        assert_eq!(addon.name(), "bond");
        assert_eq!(addon.logger().name(), "ifupdown2.addons.bond");

        let ifaces = translate_file(&addon, &interfaces).unwrap();
        assert_eq!(
            ifaces[0].config.keys().collect::<Vec<_>>(),
            vec!["bond-slaves", "bond-mode", "bond-xmit-hash-policy"]
        );
    }

    #[test]
    fn test_load_errors_carry_context() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");

        let err = load_addon(&missing, None, false).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load metadata from"));

        let clash = dir.path().join("clash.json");
        std::fs::write(
            &clash,
            r#"{"attrs": {"a": {"aliases": ["x"]}, "b": {"aliases": ["x"]}}}"#,
        )
        .unwrap();
        assert!(load_addon(&clash, None, false).is_ok());

        let err = load_addon(&clash, None, true).unwrap_err();
        assert_eq!(err.to_string(), "Failed to build addon 'clash'");
    }
}
