//! Search engine client surface.
//!
//! `SearchClient` is the handle the pool owns and the broker borrows for a
//! single call; `ClientFactory` is the construction seam the pool's factory
//! closure goes through. The HTTP implementation speaks the engine's REST
//! API, resolving dotted operation names into method/path pairs.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::options::{BasicCredentials, ClientOptions};

/// A live, reusable connection to the remote search engine.
///
/// Handles are owned by the pool once registered; the pool tears them down
/// on eviction. Borrowers must treat a handle as possibly stale after an
/// eviction and surface a closed-connection failure on the next call.
#[async_trait]
pub trait SearchClient: Send + Sync + fmt::Debug {
    /// Stable identity of this handle, reported back to invoke callers.
    fn id(&self) -> Uuid;

    /// Invoke a named engine operation with an operation-specific parameter
    /// bag, returning the raw engine response.
    async fn call(&self, operation: &str, params: Value) -> Result<Value>;

    /// Tear the connection down. Called by the pool on eviction; idempotent.
    async fn close(&self);
}

/// Constructs clients from resolved options.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(&self, options: ClientOptions) -> Result<Arc<dyn SearchClient>>;
}

/// Resolve a dotted operation name into an HTTP method and path.
///
/// Mirrors the engine's REST layout: `ping` and `info` hit the root,
/// namespaced names like `cluster.health` walk the underscore-prefixed
/// APIs, `search` and `count` post a query body.
fn resolve_operation(operation: &str) -> Option<(Method, &'static str)> {
    match operation {
        "ping" => Some((Method::HEAD, "/")),
        "info" => Some((Method::GET, "/")),
        "search" => Some((Method::POST, "/_search")),
        "count" => Some((Method::POST, "/_count")),
        "cluster.health" => Some((Method::GET, "/_cluster/health")),
        "cluster.stats" => Some((Method::GET, "/_cluster/stats")),
        "cat.health" => Some((Method::GET, "/_cat/health?format=json")),
        "cat.indices" => Some((Method::GET, "/_cat/indices?format=json")),
        "nodes.info" => Some((Method::GET, "/_nodes")),
        _ => None,
    }
}

/// HTTP implementation of `SearchClient`.
pub struct HttpSearchClient {
    id: Uuid,
    http: reqwest::Client,
    base: Url,
    credentials: Option<BasicCredentials>,
}

impl fmt::Debug for HttpSearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSearchClient")
            .field("id", &self.id)
            .field("base", &self.base.as_str())
            .field(
                "credentials",
                &self.credentials.as_ref().map(|c| c.username.as_str()),
            )
            .finish()
    }
}

impl HttpSearchClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(options.request_timeout);
        if !options.verify_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self {
            id: Uuid::new_v4(),
            http,
            base: options.endpoint,
            credentials: options.credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self
            .base
            .join(path)
            .with_context(|| format!("invalid request path {path:?}"))?;

        let mut request = self.http.request(method, url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(creds.password.as_str()));
        }
        Ok(request)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    fn id(&self) -> Uuid {
        self.id
    }

    async fn call(&self, operation: &str, params: Value) -> Result<Value> {
        let (method, path) =
            resolve_operation(operation).ok_or_else(|| anyhow!("unknown operation {operation}"))?;

        let is_head = method == Method::HEAD;
        let mut request = self.request(method.clone(), path)?;

        if method == Method::POST && !params.is_null() {
            request = request.json(&params);
        } else if let Value::Object(map) = &params {
            for (name, value) in map {
                let value = value
                    .as_str()
                    .map(str::to_owned)
                    .unwrap_or_else(|| value.to_string());
                request = request.query(&[(name, value)]);
            }
        }

        debug!(client_id = %self.id, operation, "calling engine");

        let response = request
            .send()
            .await
            .with_context(|| format!("operation {operation} failed to reach the engine"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("operation {operation} returned status {status}");
        }

        if is_head {
            return Ok(Value::Bool(true));
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("operation {operation} failed reading the response"))?;

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body)
            .with_context(|| format!("operation {operation} returned a non-json response"))
    }

    async fn close(&self) {
        // reqwest tears its connections down when the last clone of the
        // inner client is dropped.
    }
}

/// Default factory producing `HttpSearchClient`s.
#[derive(Debug, Default)]
pub struct HttpClientFactory;

#[async_trait]
impl ClientFactory for HttpClientFactory {
    async fn create(&self, options: ClientOptions) -> Result<Arc<dyn SearchClient>> {
        Ok(Arc::new(HttpSearchClient::new(options)?))
    }
}
