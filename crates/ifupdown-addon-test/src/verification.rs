//! Verification helpers for testing addons
//!
//! Provides assertion helpers to verify translated interface records and
//! alias indexes

use ifupdown_addon::{AliasIndex, Interface};
use thiserror::Error;

use crate::fixtures::TranslateScenario;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Key order mismatch for '{iface}': expected {expected:?}, got {actual:?}")]
    KeyOrderMismatch {
        iface: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Expected key '{key}' not found in '{iface}'")]
    MissingKey { iface: String, key: String },

    #[error("Value mismatch for {iface}:{key}: expected {expected:?}, got {actual:?}")]
    ValueMismatch {
        iface: String,
        key: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Alias '{alias}' resolves to {actual:?}, expected {expected:?}")]
    AliasMismatch {
        alias: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Expected {expected} records, found {actual}")]
    RecordCountMismatch { expected: usize, actual: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Verify that an interface holds exactly `expected` keys, in that order
pub fn verify_keys(iface: &Interface, expected: &[&str]) -> VerifyResult<()> {
    let actual: Vec<String> = iface.config.keys().map(str::to_string).collect();
    if actual != expected {
        return Err(VerificationError::KeyOrderMismatch {
            iface: iface.name.clone(),
            expected: expected.iter().map(|k| k.to_string()).collect(),
            actual,
        });
    }
    Ok(())
}

/// Verify that an attribute holds exactly `expected` values
pub fn verify_value(iface: &Interface, key: &str, expected: &[&str]) -> VerifyResult<()> {
    let actual = iface
        .config
        .get(key)
        .ok_or_else(|| VerificationError::MissingKey {
            iface: iface.name.clone(),
            key: key.to_string(),
        })?;

    if actual.iter().map(String::as_str).ne(expected.iter().copied()) {
        return Err(VerificationError::ValueMismatch {
            iface: iface.name.clone(),
            key: key.to_string(),
            expected: expected.iter().map(|v| v.to_string()).collect(),
            actual: actual.clone(),
        });
    }
    Ok(())
}

/// Verify what an alias resolves to; `None` means it must not be an alias
pub fn verify_alias(index: &AliasIndex, alias: &str, expected: Option<&str>) -> VerifyResult<()> {
    let actual = index.canonical_for(alias);
    if actual != expected {
        return Err(VerificationError::AliasMismatch {
            alias: alias.to_string(),
            expected: expected.map(str::to_string),
            actual: actual.map(str::to_string),
        });
    }
    Ok(())
}

/// Verify translated records against a scenario's expected keys
pub fn verify_scenario(scenario: &TranslateScenario, translated: &[Interface]) -> VerifyResult<()> {
    if translated.len() != scenario.expected_keys.len() {
        return Err(VerificationError::RecordCountMismatch {
            expected: scenario.expected_keys.len(),
            actual: translated.len(),
        });
    }

    for (iface, expected) in translated.iter().zip(&scenario.expected_keys) {
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        verify_keys(iface, &expected)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifupdown_addon::{AddonMetadata, AttributeDescriptor};

    #[test]
    fn test_verify_keys() {
        let iface = Interface::new("eth0").with_attr("mtu", "1500").with_attr("mode", "trunk");
        assert!(verify_keys(&iface, &["mtu", "mode"]).is_ok());
        assert!(matches!(
            verify_keys(&iface, &["mode", "mtu"]),
            Err(VerificationError::KeyOrderMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_value() {
        let iface = Interface::new("eth0")
            .with_attr("address", "10.0.0.1/24")
            .with_attr("address", "10.0.1.1/24");

        assert!(verify_value(&iface, "address", &["10.0.0.1/24", "10.0.1.1/24"]).is_ok());
        assert!(matches!(
            verify_value(&iface, "address", &["10.0.0.1/24"]),
            Err(VerificationError::ValueMismatch { .. })
        ));
        assert!(matches!(
            verify_value(&iface, "mtu", &["1500"]),
            Err(VerificationError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_verify_alias() {
        let metadata =
            AddonMetadata::new().attr("mtu", AttributeDescriptor::new().alias("link-mtu"));
        let index = AliasIndex::build(&metadata);

        assert!(verify_alias(&index, "link-mtu", Some("mtu")).is_ok());
        assert!(verify_alias(&index, "mtu", None).is_ok());

        let err = verify_alias(&index, "link-mtu", None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Alias 'link-mtu' resolves to Some(\"mtu\"), expected None"
        );
    }
}
