//! Test infrastructure for ifupdown addons
//!
//! Provides:
//! - Metadata and addon-module fixtures modelled on real addons
//! - Interface record fixtures
//! - Translate scenarios (input records, expected canonical keys)
//! - Verification helpers for translated records

pub mod fixtures;
mod verification;

pub use fixtures::*;
pub use verification::*;
