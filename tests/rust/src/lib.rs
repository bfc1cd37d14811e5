//! Shared fixtures and mocks for Searchgate integration tests.


use std::sync::{Arc, Once};

use searchgate_broker::DataSourceBroker;
use searchgate_core::BrokerConfig;

use mocks::{MockClientFactory, MockObjectStore, MockVault};

static TRACING: Once = Once::new();

/// Initialize test logging once per process; respects `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A broker wired to in-memory mocks, one per test case.
pub struct BrokerHarness {
    pub broker: DataSourceBroker,
    pub store: Arc<MockObjectStore>,
    pub vault: Arc<MockVault>,
    pub factory: Arc<MockClientFactory>,
}

impl BrokerHarness {
    pub fn new(
        config: BrokerConfig,
        store: MockObjectStore,
        vault: MockVault,
        factory: MockClientFactory,
    ) -> Self {
        let store = Arc::new(store);
        let vault = Arc::new(vault);
        let factory = Arc::new(factory);

        let broker = DataSourceBroker::new(
            &config,
            store.clone(),
            vault.clone(),
            factory.clone(),
        );

        Self {
            broker,
            store,
            vault,
            factory,
        }
    }

}
