//! Data source descriptor - stored configuration for a remote search engine.
//!
//! The broker only ever performs point reads of these attributes; the
//! descriptor is owned and mutated by the external object store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authentication mode for a data source.
///
/// `encrypted_password` is vault ciphertext; the plaintext only ever exists
/// inside a single options-build step and must never be logged.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication; connection options carry only endpoint and TLS.
    NoAuth,

    /// HTTP basic authentication with a vault-encrypted password.
    #[serde(rename_all = "camelCase")]
    UsernamePassword {
        username: String,
        encrypted_password: String,
    },

    /// Auth kind written by a newer version than this build understands.
    /// Surfaces as `UnsupportedAuthType` when options are built, never as a
    /// silent fallback to `NoAuth`.
    #[serde(other)]
    Unsupported,
}

impl AuthMode {
    /// Wire tag for this auth kind, used in pool fingerprints and log fields.
    pub fn tag(&self) -> &'static str {
        match self {
            AuthMode::NoAuth => "no_auth",
            AuthMode::UsernamePassword { .. } => "username_password",
            AuthMode::Unsupported => "unsupported",
        }
    }

    /// Whether brokering this mode requires a vault decryption first.
    pub fn requires_credentials(&self) -> bool {
        matches!(self, AuthMode::UsernamePassword { .. })
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::NoAuth => write!(f, "NoAuth"),
            AuthMode::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("encrypted_password", &"<redacted>")
                .finish(),
            AuthMode::Unsupported => write!(f, "Unsupported"),
        }
    }
}

/// TLS behaviour for a data source connection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    /// Verify the server certificate chain. Disabling this is only
    /// meaningful for self-signed test clusters.
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,
}

fn default_verify_certs() -> bool {
    true
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self { verify_certs: true }
    }
}

/// Attributes of a stored data source descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSourceAttributes {
    /// Display name. Never part of the connection identity.
    pub title: String,

    /// Connection target, an absolute http(s) URI.
    pub endpoint: String,

    /// How to authenticate against the endpoint.
    pub auth: AuthMode,

    /// TLS overrides; process defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSettings>,
}

impl DataSourceAttributes {
    /// Create an unauthenticated descriptor.
    pub fn no_auth(title: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            endpoint: endpoint.into(),
            auth: AuthMode::NoAuth,
            tls: None,
        }
    }

    /// Create a username/password descriptor holding an encrypted password.
    pub fn username_password(
        title: impl Into<String>,
        endpoint: impl Into<String>,
        username: impl Into<String>,
        encrypted_password: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            endpoint: endpoint.into(),
            auth: AuthMode::UsernamePassword {
                username: username.into(),
                encrypted_password: encrypted_password.into(),
            },
            tls: None,
        }
    }

    /// Set TLS overrides.
    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = Some(tls);
        self
    }
}
