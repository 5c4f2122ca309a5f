//! Configuration provider contract
//!
//! The extractor resolves cross-cutting defaults and credential lookups
//! through a [`ConfigurationProvider`] injected at construction. Production
//! uses [`crate::store::ClusterConfigProvider`]; the CLI and tests use
//! [`StaticConfigProvider`].
//!
//! Implementations must be safe for concurrent use and must bound their own
//! latency: the extractor calls them inline and never retries.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ingress_common::kube_utils::namespaced_key;

use crate::certificate::AuthSslCert;

/// Kind name used in provider errors for Secret lookups
pub const SECRET_KIND: &str = "Secret";

/// Controller-wide defaults applied when an ingress does not override them.
///
/// Field names follow the controller ConfigMap keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BackendDefaults {
    /// Maximum request body size (e.g., "1m")
    pub proxy_body_size: String,
    /// Upstream connect timeout in seconds
    pub proxy_connect_timeout: i32,
    /// Upstream read timeout in seconds
    pub proxy_read_timeout: i32,
    /// Upstream send timeout in seconds
    pub proxy_send_timeout: i32,
    /// Proxy buffer size (e.g., "4k")
    pub proxy_buffer_size: String,
    /// Redirect HTTP to HTTPS when TLS is configured
    pub ssl_redirect: bool,
    /// Seconds an upstream is considered unavailable after `upstream_max_fails`
    pub upstream_fail_timeout: i32,
    /// Failed attempts before an upstream is marked unavailable
    pub upstream_max_fails: i32,
    /// Keep the listening port in redirects
    pub use_port_in_redirects: bool,
    /// Client CIDRs allowed by default (empty allows everyone)
    pub whitelist_source_range: Vec<String>,
}

/// Feature-scoped lookup failure
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum ProviderError {
    /// The referenced object does not exist
    #[error("{kind} {name} not found")]
    NotFound {
        /// Object kind
        kind: String,
        /// `namespace/name` reference
        name: String,
    },

    /// The object exists but cannot be used
    #[error("{kind} {name} is invalid: {message}")]
    Invalid {
        /// Object kind
        kind: String,
        /// `namespace/name` reference
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// The backing store could not answer
    #[error("lookup of {name} failed: {message}")]
    Unavailable {
        /// `namespace/name` reference
        name: String,
        /// Description of the failure
        message: String,
    },
}

impl ProviderError {
    /// A referenced Secret does not exist
    pub fn secret_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: SECRET_KIND.to_string(),
            name: name.into(),
        }
    }

    /// A referenced Secret exists but its content is unusable
    pub fn invalid_secret(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: SECRET_KIND.to_string(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// The store could not be queried
    pub fn unavailable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Resolves defaults and credentials for the extractor.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationProvider: Send + Sync {
    /// Controller-wide backend defaults
    fn default_backend(&self) -> BackendDefaults;

    /// Look up a Secret by `namespace/name`
    fn secret(&self, name: &str) -> Result<Secret, ProviderError>;

    /// Resolve a client-certificate CA bundle by `namespace/name`
    fn auth_certificate(&self, name: &str) -> Result<AuthSslCert, ProviderError>;
}

/// In-memory provider over a fixed set of defaults and Secrets
#[derive(Clone, Debug, Default)]
pub struct StaticConfigProvider {
    defaults: BackendDefaults,
    secrets: BTreeMap<String, Secret>,
}

impl StaticConfigProvider {
    /// Create a provider with the given defaults and no Secrets
    pub fn new(defaults: BackendDefaults) -> Self {
        Self {
            defaults,
            secrets: BTreeMap::new(),
        }
    }

    /// Add a Secret, keyed by its `namespace/name`
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.insert_secret(secret);
        self
    }

    /// Add or replace a Secret, keyed by its `namespace/name`
    pub fn insert_secret(&mut self, secret: Secret) {
        self.secrets.insert(namespaced_key(&secret), secret);
    }

    /// Number of Secrets held
    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }
}

impl ConfigurationProvider for StaticConfigProvider {
    fn default_backend(&self) -> BackendDefaults {
        self.defaults.clone()
    }

    fn secret(&self, name: &str) -> Result<Secret, ProviderError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::secret_not_found(name))
    }

    fn auth_certificate(&self, name: &str) -> Result<AuthSslCert, ProviderError> {
        let secret = self.secret(name)?;
        AuthSslCert::from_secret(name, &secret)
    }
}
