//! Cluster-backed configuration provider
//!
//! Reads Secrets from a reflector [`Store`] that the controller's watch
//! loop keeps up to date. Lookups are in-memory and never reach the API
//! server, which keeps extraction synchronous.
//!
//! Until the watch loop reports the initial list as complete, a cache miss
//! is not authoritative and is returned as [`ProviderError::Unavailable`]
//! instead of `NotFound`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use k8s_openapi::api::core::v1::Secret;
use kube::runtime::reflector::{ObjectRef, Store};
use tracing::debug;

use ingress_common::kube_utils::parse_namespaced_name;

use crate::certificate::AuthSslCert;
use crate::provider::{BackendDefaults, ConfigurationProvider, ProviderError};

/// Provider over a reflector cache of Secrets
#[derive(Clone)]
pub struct ClusterConfigProvider {
    secrets: Store<Secret>,
    defaults: BackendDefaults,
    synced: Arc<AtomicBool>,
}

impl ClusterConfigProvider {
    /// Create a provider over `secrets` with controller-wide `defaults`.
    ///
    /// The cache starts out unsynced; clones share the sync state.
    pub fn new(secrets: Store<Secret>, defaults: BackendDefaults) -> Self {
        Self {
            secrets,
            defaults,
            synced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record that the initial list of Secrets has been applied
    pub fn mark_synced(&self) {
        self.synced.store(true, Ordering::Release);
    }

    /// Whether the initial list of Secrets has been applied
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }
}

impl ConfigurationProvider for ClusterConfigProvider {
    fn default_backend(&self) -> BackendDefaults {
        self.defaults.clone()
    }

    fn secret(&self, name: &str) -> Result<Secret, ProviderError> {
        let (namespace, secret_name) = parse_namespaced_name(name)
            .map_err(|e| ProviderError::invalid_secret(name, e.to_string()))?;

        debug!(secret = %name, cached = self.secrets.len(), "looking up secret in cache");
        let key = ObjectRef::<Secret>::new(secret_name).within(namespace);
        match self.secrets.get(&key) {
            Some(secret) => Ok(secret.as_ref().clone()),
            None if self.is_synced() => Err(ProviderError::secret_not_found(name)),
            None => Err(ProviderError::unavailable(name, "secret cache is not synced")),
        }
    }

    fn auth_certificate(&self, name: &str) -> Result<AuthSslCert, ProviderError> {
        let secret = self.secret(name)?;
        AuthSslCert::from_secret(name, &secret)
    }
}
