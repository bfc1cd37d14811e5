//! # Searchgate Client
//!
//! Everything between a resolved data source descriptor and a live engine
//! connection:
//!
//! - `options` - connection options and the pure options builder
//! - `client` - the `SearchClient` surface and its HTTP implementation
//! - `pool` - keyed client pool with single-flight construction and LRU
//!   eviction

pub mod client;
pub mod options;
pub mod pool;

pub use client::{ClientFactory, HttpClientFactory, HttpSearchClient, SearchClient};
pub use options::{
    parse_client_options, BasicCredentials, ClientDefaults, ClientOptions, OptionsError,
};
pub use pool::{ClientHandle, ClientPool, PoolError, PoolKey};
