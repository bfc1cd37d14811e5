//! Core domain entities

mod config;
mod data_source;

pub use config::{BrokerConfig, ClientPoolConfig, DEFAULT_POOL_SIZE};
pub use data_source::{AuthMode, DataSourceAttributes, TlsSettings};
