//! Per-client connection and request rate limits
//!
//! Each limit gets its own shared-memory zone named after the ingress so
//! that limits on different ingresses never share counters.

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use serde::Serialize;

use super::{annotation_key, get_int, non_negative, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: concurrent connections per client address
pub const LIMIT_CONNECTIONS: &str = "limit-connections";
/// Annotation suffix: requests per second per client address
pub const LIMIT_RPS: &str = "limit-rps";

/// Burst allowance as a multiple of the limit
const BURST_MULTIPLIER: i32 = 5;

/// Shared memory per zone, in megabytes
const ZONE_SHARED_SIZE_MB: i32 = 5;

/// One rate limiting zone. A zero `limit` means disabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Zone name, unique per ingress and limit kind
    pub name: String,
    /// Allowed connections or requests per second
    pub limit: i32,
    /// Excess allowed before rejecting
    pub burst: i32,
    /// Shared memory size in megabytes
    pub shared_size: i32,
}

impl Zone {
    fn new(name: String, limit: i32) -> Self {
        if limit == 0 {
            return Self::default();
        }
        Self {
            name,
            limit,
            burst: limit.saturating_mul(BURST_MULTIPLIER),
            shared_size: ZONE_SHARED_SIZE_MB,
        }
    }

    /// Whether this zone limits anything
    pub fn is_enabled(&self) -> bool {
        self.limit > 0
    }
}

/// Connection and request limits
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Concurrent connections per client address
    pub connections: Zone,
    /// Requests per second per client address
    pub rps: Zone,
}

/// Reads [`RateLimit`]
#[derive(Clone, Debug)]
pub struct RateLimitParser {
    connections_key: String,
    rps_key: String,
}

impl RateLimitParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            connections_key: annotation_key(prefix, LIMIT_CONNECTIONS),
            rps_key: annotation_key(prefix, LIMIT_RPS),
        }
    }

    fn limit(&self, ingress: &Ingress, key: &str) -> i32 {
        let value = get_int(ingress, key).and_then(|v| non_negative(key, v));
        or_default(ingress, value, 0)
    }
}

impl AnnotationParser for RateLimitParser {
    type Output = RateLimit;
    const FEATURE: Feature = Feature::RateLimit;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> RateLimit {
        let zone_prefix = format!(
            "{}_{}",
            ingress.namespace().unwrap_or_default(),
            ingress.name_any()
        );
        RateLimit {
            connections: Zone::new(
                format!("{}_conn", zone_prefix),
                self.limit(ingress, &self.connections_key),
            ),
            rps: Zone::new(
                format!("{}_rps", zone_prefix),
                self.limit(ingress, &self.rps_key),
            ),
        }
    }

    fn wrap(output: RateLimit) -> FeatureValue {
        FeatureValue::RateLimit(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticConfigProvider;
    use crate::testing::{ingress_with, ingress_without_annotations};
    use ingress_common::DEFAULT_ANNOTATION_PREFIX;

    fn parse(ing: &Ingress) -> RateLimit {
        RateLimitParser::new(DEFAULT_ANNOTATION_PREFIX).parse(ing, &StaticConfigProvider::default())
    }

    #[test]
    fn both_limits() {
        let limits = parse(&ingress_with(&[
            (LIMIT_CONNECTIONS, "10"),
            (LIMIT_RPS, "100"),
        ]));
        assert_eq!(
            limits.connections,
            Zone {
                name: "default_foo_conn".to_string(),
                limit: 10,
                burst: 50,
                shared_size: 5,
            }
        );
        assert_eq!(limits.rps.name, "default_foo_rps");
        assert_eq!(limits.rps.burst, 500);
        assert!(limits.rps.is_enabled());
    }

    #[test]
    fn one_limit_leaves_other_disabled() {
        let limits = parse(&ingress_with(&[(LIMIT_RPS, "20")]));
        assert!(!limits.connections.is_enabled());
        assert_eq!(limits.connections, Zone::default());
        assert_eq!(limits.rps.limit, 20);
    }

    #[test]
    fn invalid_or_zero_limits_disable() {
        let limits = parse(&ingress_with(&[
            (LIMIT_CONNECTIONS, "-4"),
            (LIMIT_RPS, "0"),
        ]));
        assert_eq!(limits, RateLimit::default());

        let limits = parse(&ingress_with(&[(LIMIT_CONNECTIONS, "ten")]));
        assert_eq!(limits, RateLimit::default());
    }

    #[test]
    fn unannotated_is_disabled() {
        assert_eq!(parse(&ingress_without_annotations()), RateLimit::default());
    }
}
