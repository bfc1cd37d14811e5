//! Client pool - keyed cache of live engine clients.
//!
//! The pool key is `data_source_id + ":" + sha256(resolved shape)[..16]`,
//! where the shape covers endpoint, auth tag, username, the credential
//! ciphertext, and TLS settings. Hashing the ciphertext (never the
//! plaintext) means a credential rotation lands on a fresh client while the
//! key stays computable before any decryption.
//!
//! Construction is single-flight per key: the first caller installs a
//! pending marker holding a shared future over a spawned construction task;
//! concurrent callers for the same key await that future and observe exactly
//! one factory run. The task installs its own outcome into the map, so
//! cancelling every waiter still leaves the pool populated. The map mutex is
//! never held across an await, so distinct keys proceed independently.
//!
//! Eviction is least-recently-used by last access time; in-flight use is not
//! tracked. A caller holding an evicted handle sees a closed-connection
//! failure on its next call and must reacquire through the broker.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use ring::digest::{Context as DigestContext, SHA256};
use searchgate_core::{AuthMode, DataSourceAttributes};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::SearchClient;

/// Shared handle to a pooled client.
pub type ClientHandle = Arc<dyn SearchClient>;

/// Pool lookup key: data source identity plus a fingerprint of the resolved
/// connection shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    data_source_id: String,
    fingerprint: String,
}

/// Fingerprint input rows; serialized then hashed.
#[derive(Serialize)]
struct FingerprintSource<'a> {
    endpoint: &'a str,
    auth_type: &'a str,
    username: Option<&'a str>,
    credential_ciphertext: Option<&'a str>,
    verify_certs: Option<bool>,
}

impl PoolKey {
    /// Derive the key for a descriptor.
    ///
    /// Uses only data available before decryption, so a pool hit costs zero
    /// cryptographic operations.
    pub fn for_data_source(data_source_id: &str, attrs: &DataSourceAttributes) -> Self {
        let (username, ciphertext) = match &attrs.auth {
            AuthMode::UsernamePassword {
                username,
                encrypted_password,
            } => (Some(username.as_str()), Some(encrypted_password.as_str())),
            _ => (None, None),
        };

        let source = FingerprintSource {
            endpoint: &attrs.endpoint,
            auth_type: attrs.auth.tag(),
            username,
            credential_ciphertext: ciphertext,
            verify_certs: attrs.tls.map(|tls| tls.verify_certs),
        };

        let json = serde_json::to_string(&source).unwrap_or_default();
        let mut digest = DigestContext::new(&SHA256);
        digest.update(json.as_bytes());
        let hash = hex::encode(digest.finish().as_ref());

        Self {
            data_source_id: data_source_id.to_string(),
            fingerprint: hash[..16].to_string(),
        }
    }

    pub fn data_source_id(&self) -> &str {
        &self.data_source_id
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.data_source_id, self.fingerprint)
    }
}

/// Failures reported by `get_or_create`.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// The factory failed; every concurrent waiter for the key receives this
    /// same failure and nothing is inserted.
    #[error("client construction failed: {0}")]
    Construction(Arc<anyhow::Error>),

    /// The construction task was torn down before completing (runtime
    /// shutdown or factory panic).
    #[error("client construction aborted")]
    Aborted,
}

type ConstructionFuture = Shared<BoxFuture<'static, Result<ClientHandle, PoolError>>>;

struct ReadyEntry {
    client: ClientHandle,
    last_used: Instant,
}

enum Slot {
    Ready(ReadyEntry),
    Pending(ConstructionFuture),
}

/// Keyed cache of live clients with bounded capacity.
pub struct ClientPool {
    entries: Arc<Mutex<HashMap<PoolKey, Slot>>>,
    capacity: usize,
}

impl ClientPool {
    /// Create a pool holding at most `capacity` live clients.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Non-blocking lookup.
    ///
    /// A key whose construction is still in flight reports absent; callers
    /// join the construction through `get_or_create`.
    pub fn get(&self, key: &PoolKey) -> Option<ClientHandle> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(Slot::Ready(entry)) => {
                entry.last_used = Instant::now();
                Some(Arc::clone(&entry.client))
            }
            _ => None,
        }
    }

    /// Return the pooled client for `key`, constructing it with `factory` on
    /// a miss.
    ///
    /// Concurrent callers for the same key observe exactly one factory
    /// invocation and share its outcome, success or failure; callers for
    /// different keys never wait on each other. Construction runs in a
    /// spawned task, so a caller cancelled after triggering it still leaves
    /// the pool populated for the next caller.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &PoolKey,
        factory: F,
    ) -> Result<ClientHandle, PoolError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<ClientHandle>> + Send + 'static,
    {
        let construction = {
            let mut entries = self.entries.lock();
            match entries.get_mut(key) {
                Some(Slot::Ready(entry)) => {
                    entry.last_used = Instant::now();
                    debug!(key = %key, "reusing pooled client");
                    return Ok(Arc::clone(&entry.client));
                }
                Some(Slot::Pending(construction)) => {
                    debug!(key = %key, "joining in-flight construction");
                    construction.clone()
                }
                None => {
                    let construction = self.spawn_construction(key.clone(), factory());
                    entries.insert(key.clone(), Slot::Pending(construction.clone()));
                    construction
                }
            }
        };

        construction.await
    }

    /// Remove and close the entry for `key`. Idempotent.
    ///
    /// Evicting a key with an in-flight construction discards the pending
    /// marker; its waiters still receive the constructed client, which then
    /// lives unpooled until they drop it.
    pub fn evict(&self, key: &PoolKey) {
        let removed = self.entries.lock().remove(key);
        if let Some(Slot::Ready(entry)) = removed {
            debug!(key = %key, "evicting client");
            close_in_background(entry.client);
        }
    }

    /// Number of live (constructed) clients currently pooled.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of all live clients.
    pub fn keys(&self) -> Vec<PoolKey> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Run one factory future on the runtime and install its outcome.
    ///
    /// The task owns the map update, so it happens even if every waiter is
    /// cancelled before construction finishes.
    fn spawn_construction(
        &self,
        key: PoolKey,
        factory: impl Future<Output = anyhow::Result<ClientHandle>> + Send + 'static,
    ) -> ConstructionFuture {
        let entries = Arc::clone(&self.entries);
        let capacity = self.capacity;

        let task = tokio::spawn(async move {
            info!(key = %key, "constructing new client");
            let result = factory
                .await
                .map_err(|err| PoolError::Construction(Arc::new(err)));

            let mut map = entries.lock();
            match &result {
                // Only act on our own pending marker; a racing evict may
                // already have removed it, in which case the client is
                // handed to the waiters but not registered.
                Ok(client) => {
                    if matches!(map.get(&key), Some(Slot::Pending(_))) {
                        evict_lru_for_insert(&mut map, capacity);
                        map.insert(
                            key.clone(),
                            Slot::Ready(ReadyEntry {
                                client: Arc::clone(client),
                                last_used: Instant::now(),
                            }),
                        );
                    }
                }
                Err(_) => {
                    if matches!(map.get(&key), Some(Slot::Pending(_))) {
                        map.remove(&key);
                    }
                }
            }
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(_) => Err(PoolError::Aborted),
            }
        }
        .boxed()
        .shared()
    }
}

/// Evict least-recently-used live entries until one more fits `capacity`.
/// Pending slots are never victims.
fn evict_lru_for_insert(map: &mut HashMap<PoolKey, Slot>, capacity: usize) {
    loop {
        let live = map
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count();
        if live < capacity {
            return;
        }

        let victim = map
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready(entry) => Some((key.clone(), entry.last_used)),
                Slot::Pending(_) => None,
            })
            .min_by_key(|(_, last_used)| *last_used)
            .map(|(key, _)| key);

        let Some(victim) = victim else { return };
        if let Some(Slot::Ready(entry)) = map.remove(&victim) {
            info!(key = %victim, "evicting least recently used client");
            close_in_background(entry.client);
        }
    }
}

/// Close a handle without holding the pool lock.
fn close_in_background(client: ClientHandle) {
    tokio::spawn(async move {
        client.close().await;
    });
}
