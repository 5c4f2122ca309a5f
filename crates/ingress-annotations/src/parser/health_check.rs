//! Passive upstream health checking
//!
//! `upstream-max-fails` and `upstream-fail-timeout` are read independently:
//! a bad value for one never affects the other. Each falls back to the
//! controller's backend default.

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;

use super::{annotation_key, get_int, non_negative, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix for the failure threshold
pub const UPSTREAM_MAX_FAILS: &str = "upstream-max-fails";

/// Annotation suffix for the failure window in seconds
pub const UPSTREAM_FAIL_TIMEOUT: &str = "upstream-fail-timeout";

/// Health check thresholds for an upstream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    /// Failed attempts before the upstream is marked unavailable
    pub max_fails: i32,
    /// Seconds the upstream stays unavailable
    pub fail_timeout: i32,
}

/// Reads [`Upstream`] thresholds
#[derive(Clone, Debug)]
pub struct HealthCheckParser {
    max_fails_key: String,
    fail_timeout_key: String,
}

impl HealthCheckParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            max_fails_key: annotation_key(prefix, UPSTREAM_MAX_FAILS),
            fail_timeout_key: annotation_key(prefix, UPSTREAM_FAIL_TIMEOUT),
        }
    }

    fn read(&self, ingress: &Ingress, key: &str, fallback: i32) -> i32 {
        let value = get_int(ingress, key).and_then(|v| non_negative(key, v));
        or_default(ingress, value, fallback)
    }
}

impl AnnotationParser for HealthCheckParser {
    type Output = Upstream;
    const FEATURE: Feature = Feature::HealthCheck;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> Upstream {
        let defaults = provider.default_backend();
        Upstream {
            max_fails: self.read(ingress, &self.max_fails_key, defaults.upstream_max_fails),
            fail_timeout: self.read(
                ingress,
                &self.fail_timeout_key,
                defaults.upstream_fail_timeout,
            ),
        }
    }

    fn wrap(output: Upstream) -> FeatureValue {
        FeatureValue::HealthCheck(output)
    }
}
