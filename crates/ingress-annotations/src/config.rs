//! Extractor configuration
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```yaml
//! annotationPrefix: ingress.kubernetes.io
//! backend:
//!   proxy-connect-timeout: 5
//!   upstream-max-fails: 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use ingress_common::{Error, Result, DEFAULT_ANNOTATION_PREFIX};

use crate::parser::annotation_key;
use crate::provider::BackendDefaults;

const CONFIG_RESOURCE: &str = "extractor config";

/// Extractor settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractorConfig {
    /// Prefix of every annotation key
    pub annotation_prefix: String,
    /// Controller-wide backend defaults
    pub backend: BackendDefaults,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: DEFAULT_ANNOTATION_PREFIX.to_string(),
            backend: BackendDefaults::default(),
        }
    }
}

impl ExtractorConfig {
    /// Parse from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::serialization_for("ExtractorConfig", e.to_string()))
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&yaml)
    }

    /// Full annotation key for a feature suffix
    pub fn key(&self, suffix: &str) -> String {
        annotation_key(&self.annotation_prefix, suffix)
    }

    /// Check the prefix and backend defaults
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.annotation_prefix;
        if prefix.is_empty() {
            return Err(Error::validation_for_field(
                CONFIG_RESOURCE,
                "annotationPrefix",
                "must not be empty",
            ));
        }
        if prefix.contains('/') {
            return Err(Error::validation_for_field(
                CONFIG_RESOURCE,
                "annotationPrefix",
                format!("'{}' must not contain '/'", prefix),
            ));
        }
        if prefix.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
            return Err(Error::validation_for_field(
                CONFIG_RESOURCE,
                "annotationPrefix",
                format!("'{}' must be lowercase without whitespace", prefix),
            ));
        }

        let backend = &self.backend;
        let counters = [
            ("proxy-connect-timeout", backend.proxy_connect_timeout),
            ("proxy-read-timeout", backend.proxy_read_timeout),
            ("proxy-send-timeout", backend.proxy_send_timeout),
            ("upstream-fail-timeout", backend.upstream_fail_timeout),
            ("upstream-max-fails", backend.upstream_max_fails),
        ];
        for (name, value) in counters {
            if value < 0 {
                return Err(Error::validation_for_field(
                    CONFIG_RESOURCE,
                    format!("backend.{}", name),
                    format!("must not be negative, got {}", value),
                ));
            }
        }

        Ok(())
    }
}
