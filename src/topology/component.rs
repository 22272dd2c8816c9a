//! Component identifiers - the keys a runner files captured output under

use serde::{Deserialize, Serialize};

/// Role prefixes used to build component identifiers.
///
/// The runner files host logs under `"<host role>.<host>"` and device logs
/// under `"<device role>.<host>.<device>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roles {
    /// Prefix for host simulators
    pub host: String,
    /// Prefix for device simulators
    pub device: String,
}

impl Default for Roles {
    fn default() -> Self {
        Self {
            host: "host".to_string(),
            device: "dev".to_string(),
        }
    }
}

/// Identifier of one simulated component inside a result bundle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Identifier of a host simulator: `"<role>.<host>"`.
    #[must_use]
    pub fn host(roles: &Roles, host: &str) -> Self {
        Self(format!("{}.{host}", roles.host))
    }

    /// Identifier of a device simulator: `"<role>.<host>.<device>"`.
    #[must_use]
    pub fn device(roles: &Roles, host: &str, device: &str) -> Self {
        Self(format!("{}.{host}.{device}", roles.device))
    }

    /// Get the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
