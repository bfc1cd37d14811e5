//! # Searchgate Broker
//!
//! Turns a stored data source descriptor into a live, pooled engine client
//! and proxies one logical operation through it.

mod broker;

pub use broker::{DataSourceBroker, InvokeResponse};
