//! Connection options and the pure options builder.
//!
//! `parse_client_options` maps a descriptor plus an already-decrypted
//! credential into a fully-specified configuration. It never touches the
//! vault; decryption is the broker's responsibility, before this call.

use std::fmt;
use std::time::Duration;

use searchgate_core::{AuthMode, DataSourceAttributes};
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

/// Process-wide fallbacks applied when a descriptor leaves a setting out.
#[derive(Debug, Clone)]
pub struct ClientDefaults {
    pub request_timeout: Duration,
    pub verify_certs: bool,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            verify_certs: true,
        }
    }
}

/// Basic-auth credentials carried by `ClientOptions`.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

/// Fully-resolved connection configuration for one client.
///
/// Ephemeral: exists only between options building and client
/// construction. Never persisted, never logged.
#[derive(Clone)]
pub struct ClientOptions {
    pub endpoint: Url,
    pub credentials: Option<BasicCredentials>,
    pub verify_certs: bool,
    pub request_timeout: Duration,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("endpoint", &self.endpoint.as_str())
            .field(
                "credentials",
                &self.credentials.as_ref().map(|c| c.username.as_str()),
            )
            .field("verify_certs", &self.verify_certs)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Failures of the options builder.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("endpoint {0:?} is not an absolute http(s) url")]
    InvalidEndpoint(String),

    /// The descriptor carries an auth kind this build does not support.
    /// Never degrades to an unauthenticated connection.
    #[error("auth type is not supported by this build")]
    UnsupportedAuthType,

    /// Username/password descriptors must be decrypted before options are
    /// built.
    #[error("missing decrypted credential for username/password auth")]
    MissingCredential,
}

/// Map a descriptor and an already-decrypted credential into connection
/// options. Pure and deterministic; performs no I/O.
pub fn parse_client_options(
    attrs: &DataSourceAttributes,
    credential: Option<Zeroizing<String>>,
    defaults: &ClientDefaults,
) -> Result<ClientOptions, OptionsError> {
    let endpoint = Url::parse(&attrs.endpoint)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| OptionsError::InvalidEndpoint(attrs.endpoint.clone()))?;

    let credentials = match &attrs.auth {
        AuthMode::NoAuth => None,
        AuthMode::UsernamePassword { username, .. } => {
            let password = credential.ok_or(OptionsError::MissingCredential)?;
            Some(BasicCredentials {
                username: username.clone(),
                password,
            })
        }
        AuthMode::Unsupported => return Err(OptionsError::UnsupportedAuthType),
    };

    let verify_certs = attrs
        .tls
        .map(|tls| tls.verify_certs)
        .unwrap_or(defaults.verify_certs);

    Ok(ClientOptions {
        endpoint,
        credentials,
        verify_certs,
        request_timeout: defaults.request_timeout,
    })
}
