//! Broker error taxonomy.
//!
//! Every failure is surfaced to the immediate caller of `invoke`; nothing is
//! retried here. Messages carry identifiers only, never credential material.

use thiserror::Error;

use crate::vault::VaultError;

/// Errors surfaced by `invoke`.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// No data source saved under the requested id.
    #[error("data source {0} not found")]
    NotFound(String),

    /// The object store refused access to the descriptor.
    #[error("access to data source {0} is forbidden")]
    Forbidden(String),

    /// Brokering is turned off by configuration.
    #[error("data source brokering is disabled by configuration")]
    Disabled,

    /// The descriptor carries an auth kind this build does not support.
    #[error("data source {id} uses an unsupported auth type")]
    UnsupportedAuthType { id: String },

    /// The vault could not decrypt the stored credential.
    #[error("failed to decrypt credentials for data source {id}")]
    Decryption {
        id: String,
        #[source]
        source: VaultError,
    },

    /// The descriptor resolved to invalid connection options.
    #[error("invalid connection options for data source {id}")]
    InvalidOptions {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The client factory failed; nothing was inserted into the pool.
    #[error("failed to construct client for data source {id}")]
    Construction {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The remote call itself failed after a handle was obtained.
    #[error("operation {operation} failed on data source {id}")]
    Operation {
        id: String,
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// The object store failed, or returned a malformed descriptor.
    #[error("object store failure for data source {id}")]
    Store {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}
