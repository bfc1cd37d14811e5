//! Broker configuration recognized from the embedding service.
//!
//! The service owns configuration loading; this module only defines the
//! shape and defaults of the keys the broker reads.

use serde::{Deserialize, Serialize};

/// Default connection pool capacity.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Top-level broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerConfig {
    /// A disabled broker short-circuits every `invoke` with `Disabled`.
    pub enabled: bool,

    /// Connection pool settings.
    pub client_pool: ClientPoolConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_pool: ClientPoolConfig::default(),
        }
    }
}

/// Connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientPoolConfig {
    /// Maximum number of live clients; the least-recently-used entry is
    /// evicted and closed when an insert would exceed this.
    pub size: usize,
}

impl Default for ClientPoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
        }
    }
}
