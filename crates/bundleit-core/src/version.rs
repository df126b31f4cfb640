//! Project versions and the integer version code derived from them.
//!
//! The version code orders bundles on the management side, so parsing is
//! strict: exactly `major.minor.patch`, each a decimal integer in `0..=999`
//! written without leading zeros, so distinct names never share a code.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Version assumed when the manifest does not declare one.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Largest value a single component may take.
pub const MAX_COMPONENT: u64 = 999;

const COMPONENT_WEIGHT: u64 = 1000;

/// A parsed `major.minor.patch` version and its version code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{name}")]
pub struct ProjectVersion {
    /// The version string exactly as declared.
    pub name: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ProjectVersion {
    pub fn parse(version: &str) -> Result<Self> {
        let invalid = |reason: String| Error::VersionParse {
            version: version.to_string(),
            reason,
        };

        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid(format!(
                "expected major.minor.patch, found {} component(s)",
                parts.len()
            )));
        }

        let mut components = [0u64; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(format!("component {part:?} is not a number")));
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(invalid(format!("component {part:?} has a leading zero")));
            }
            let value: u64 = part
                .parse()
                .map_err(|_| invalid(format!("component {part:?} is not a number")))?;
            if value > MAX_COMPONENT {
                return Err(invalid(format!(
                    "component {value} exceeds {MAX_COMPONENT}"
                )));
            }
            *slot = value;
        }

        let [major, minor, patch] = components;
        Ok(Self {
            name: version.to_string(),
            major,
            minor,
            patch,
        })
    }

    /// `major * 1000^2 + minor * 1000 + patch`.
    pub fn code(&self) -> u64 {
        self.major * COMPONENT_WEIGHT * COMPONENT_WEIGHT + self.minor * COMPONENT_WEIGHT + self.patch
    }
}

/// Shorthand for `ProjectVersion::parse(version)?.code()`.
pub fn version_code(version: &str) -> Result<u64> {
    Ok(ProjectVersion::parse(version)?.code())
}
