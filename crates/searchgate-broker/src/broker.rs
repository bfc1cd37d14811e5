//! Data source broker.
//!
//! Orchestrates one `invoke`: fetch the descriptor, compute the pool key
//! before any decryption, reuse a pooled client when one exists, otherwise
//! decrypt, build options, and construct through the pool's single-flight
//! path, then proxy the named operation through the obtained handle.

use std::sync::Arc;

use searchgate_client::{
    parse_client_options, ClientDefaults, ClientFactory, ClientHandle, ClientPool, OptionsError,
    PoolKey,
};
use searchgate_core::{
    AuthMode, BrokerConfig, BrokerError, CredentialVault, DataSourceAttributes, ObjectStore,
    StoreError, DATA_SOURCE_TYPE,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Result of one proxied invocation: the raw engine response plus the
/// identity of the pooled handle that served it.
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    pub response: Value,
    pub client_id: Uuid,
}

/// Brokers stored data source descriptors into live, pooled engine clients.
///
/// Every collaborator is injected, so tests construct isolated brokers with
/// in-memory stores, vaults, factories, and a pool scoped to the broker's
/// lifetime.
pub struct DataSourceBroker {
    store: Arc<dyn ObjectStore>,
    vault: Arc<dyn CredentialVault>,
    factory: Arc<dyn ClientFactory>,
    pool: ClientPool,
    defaults: ClientDefaults,
    enabled: bool,
}

impl DataSourceBroker {
    pub fn new(
        config: &BrokerConfig,
        store: Arc<dyn ObjectStore>,
        vault: Arc<dyn CredentialVault>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            store,
            vault,
            factory,
            pool: ClientPool::new(config.client_pool.size),
            defaults: ClientDefaults::default(),
            enabled: config.enabled,
        }
    }

    /// Override the process-wide client defaults.
    pub fn with_defaults(mut self, defaults: ClientDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The pool backing this broker, exposed for lifecycle management.
    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Proxy one engine operation through the data source's pooled client.
    ///
    /// Nothing is retried here; every failure surfaces to the caller as one
    /// `BrokerError` variant.
    pub async fn invoke(
        &self,
        data_source_id: &str,
        operation: &str,
        params: Value,
    ) -> Result<InvokeResponse, BrokerError> {
        if !self.enabled {
            return Err(BrokerError::Disabled);
        }

        let attrs = self.fetch_descriptor(data_source_id).await?;
        let key = PoolKey::for_data_source(data_source_id, &attrs);

        // A pool hit skips decryption and options building entirely.
        let client = match self.pool.get(&key) {
            Some(client) => {
                debug!(data_source_id, key = %key, "pool hit");
                client
            }
            None => self.connect(data_source_id, &key, &attrs).await?,
        };

        let client_id = client.id();
        let response =
            client
                .call(operation, params)
                .await
                .map_err(|source| BrokerError::Operation {
                    id: data_source_id.to_string(),
                    operation: operation.to_string(),
                    source,
                })?;

        Ok(InvokeResponse {
            response,
            client_id,
        })
    }

    async fn fetch_descriptor(&self, id: &str) -> Result<DataSourceAttributes, BrokerError> {
        let object = self
            .store
            .get(DATA_SOURCE_TYPE, id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => BrokerError::NotFound(id.to_string()),
                StoreError::Forbidden { .. } => BrokerError::Forbidden(id.to_string()),
                StoreError::Internal(source) => BrokerError::Store {
                    id: id.to_string(),
                    source,
                },
            })?;

        serde_json::from_value(object.attributes).map_err(|err| BrokerError::Store {
            id: id.to_string(),
            source: anyhow::Error::new(err).context("malformed data source attributes"),
        })
    }

    /// Cache-miss path: decrypt if the auth mode needs it, build options,
    /// then join or trigger the single-flight construction for `key`.
    async fn connect(
        &self,
        data_source_id: &str,
        key: &PoolKey,
        attrs: &DataSourceAttributes,
    ) -> Result<ClientHandle, BrokerError> {
        let credential = self.resolve_credential(data_source_id, attrs).await?;

        let options =
            parse_client_options(attrs, credential, &self.defaults).map_err(|err| match err {
                OptionsError::UnsupportedAuthType => BrokerError::UnsupportedAuthType {
                    id: data_source_id.to_string(),
                },
                other => BrokerError::InvalidOptions {
                    id: data_source_id.to_string(),
                    source: anyhow::Error::new(other),
                },
            })?;

        debug!(
            data_source_id,
            key = %key,
            auth = attrs.auth.tag(),
            "pool miss, acquiring client"
        );

        let factory = Arc::clone(&self.factory);
        self.pool
            .get_or_create(key, move || async move { factory.create(options).await })
            .await
            .map_err(|source| BrokerError::Construction {
                id: data_source_id.to_string(),
                source: anyhow::Error::new(source),
            })
    }

    /// Decrypt the stored credential when the auth mode requires one. The
    /// plaintext lives only until options are built.
    async fn resolve_credential(
        &self,
        data_source_id: &str,
        attrs: &DataSourceAttributes,
    ) -> Result<Option<Zeroizing<String>>, BrokerError> {
        match &attrs.auth {
            AuthMode::UsernamePassword {
                encrypted_password, ..
            } => {
                let plaintext = self.vault.decrypt(encrypted_password).await.map_err(
                    |source| BrokerError::Decryption {
                        id: data_source_id.to_string(),
                        source,
                    },
                )?;
                Ok(Some(plaintext))
            }
            _ => Ok(None),
        }
    }
}
