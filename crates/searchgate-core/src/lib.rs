//! # Searchgate Core
//!
//! Domain types and boundary traits for the data-source broker.
//!
//! ## Modules
//!
//! - `domain` - Data source descriptors and broker configuration
//! - `error` - The broker error taxonomy
//! - `store` - Object store boundary (saved-object point reads)
//! - `vault` - Credential vault boundary (opaque decrypt capability)

pub mod domain;
pub mod error;
pub mod store;
pub mod vault;

// Re-export commonly used types
pub use domain::*;
pub use error::BrokerError;
pub use store::{ObjectStore, SavedObject, SavedObjectReference, StoreError, DATA_SOURCE_TYPE};
pub use vault::{CredentialVault, VaultError};
