//! Sticky sessions
//!
//! Only cookie affinity exists. The cookie name and hash fall back to their
//! defaults individually.

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;

use super::{annotation_key, get_string, optional, or_default, AnnotationError, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: affinity type
pub const AFFINITY: &str = "affinity";
/// Annotation suffix: cookie name
pub const SESSION_COOKIE_NAME: &str = "session-cookie-name";
/// Annotation suffix: cookie value hash
pub const SESSION_COOKIE_HASH: &str = "session-cookie-hash";

/// The only supported affinity type
pub const COOKIE_AFFINITY: &str = "cookie";

/// Cookie name used when none is given
pub const DEFAULT_COOKIE_NAME: &str = "INGRESSCOOKIE";

/// Hash used when none (or an unknown one) is given
pub const DEFAULT_COOKIE_HASH: &str = "md5";

const COOKIE_HASHES: [&str; 3] = ["md5", "sha1", "index"];

/// Affinity cookie settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,
    /// Hash used to derive the cookie value (md5, sha1, index)
    pub hash: String,
}

/// Session affinity; an empty `affinity_type` means none
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffinityConfig {
    /// Affinity type (`cookie` or empty)
    pub affinity_type: String,
    /// Cookie settings when `affinity_type` is `cookie`
    pub cookie: CookieConfig,
}

/// Reads [`AffinityConfig`]
#[derive(Clone, Debug)]
pub struct SessionAffinityParser {
    affinity_key: String,
    cookie_name_key: String,
    cookie_hash_key: String,
}

impl SessionAffinityParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            affinity_key: annotation_key(prefix, AFFINITY),
            cookie_name_key: annotation_key(prefix, SESSION_COOKIE_NAME),
            cookie_hash_key: annotation_key(prefix, SESSION_COOKIE_HASH),
        }
    }

    fn cookie(&self, ingress: &Ingress) -> CookieConfig {
        let name = or_default(
            ingress,
            get_string(ingress, &self.cookie_name_key),
            DEFAULT_COOKIE_NAME.to_string(),
        );
        let hash = get_string(ingress, &self.cookie_hash_key).and_then(|hash| {
            if COOKIE_HASHES.contains(&hash.as_str()) {
                Ok(hash)
            } else {
                Err(AnnotationError::invalid(
                    &self.cookie_hash_key,
                    &hash,
                    "expected md5, sha1 or index",
                ))
            }
        });
        CookieConfig {
            name,
            hash: or_default(ingress, hash, DEFAULT_COOKIE_HASH.to_string()),
        }
    }
}

impl AnnotationParser for SessionAffinityParser {
    type Output = AffinityConfig;
    const FEATURE: Feature = Feature::SessionAffinity;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> AffinityConfig {
        let affinity = optional(get_string(ingress, &self.affinity_key)).and_then(|a| match a {
            Some(a) if a != COOKIE_AFFINITY => Err(AnnotationError::invalid(
                &self.affinity_key,
                &a,
                "only cookie affinity is supported",
            )),
            other => Ok(other),
        });

        match or_default(ingress, affinity, None) {
            Some(affinity_type) => AffinityConfig {
                affinity_type,
                cookie: self.cookie(ingress),
            },
            None => AffinityConfig::default(),
        }
    }

    fn wrap(output: AffinityConfig) -> FeatureValue {
        FeatureValue::SessionAffinity(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticConfigProvider;
    use crate::testing::{ingress_with, ingress_without_annotations};
    use ingress_common::DEFAULT_ANNOTATION_PREFIX;
    use rstest::rstest;

    fn parse(ing: &Ingress) -> AffinityConfig {
        SessionAffinityParser::new(DEFAULT_ANNOTATION_PREFIX)
            .parse(ing, &StaticConfigProvider::default())
    }

    #[test]
    fn cookie_affinity_with_defaults() {
        let config = parse(&ingress_with(&[(AFFINITY, "cookie")]));
        assert_eq!(config.affinity_type, "cookie");
        assert_eq!(config.cookie.name, "INGRESSCOOKIE");
        assert_eq!(config.cookie.hash, "md5");
    }

    #[rstest]
    #[case::sha1("sha1", "sha1")]
    #[case::index("index", "index")]
    #[case::unknown_hash("sha256", "md5")]
    fn cookie_hash(#[case] hash: &str, #[case] expected: &str) {
        let config = parse(&ingress_with(&[
            (AFFINITY, "cookie"),
            (SESSION_COOKIE_NAME, "route"),
            (SESSION_COOKIE_HASH, hash),
        ]));
        assert_eq!(config.cookie.name, "route");
        assert_eq!(config.cookie.hash, expected);
    }

    #[test]
    fn unsupported_affinity_is_none() {
        let config = parse(&ingress_with(&[
            (AFFINITY, "ip_hash"),
            (SESSION_COOKIE_NAME, "x"),
        ]));
        assert_eq!(config, AffinityConfig::default());
    }

    #[test]
    fn cookie_settings_without_affinity_are_ignored() {
        let config = parse(&ingress_with(&[(SESSION_COOKIE_NAME, "route")]));
        assert_eq!(config, AffinityConfig::default());
        assert_eq!(
            parse(&ingress_without_annotations()),
            AffinityConfig::default()
        );
    }
}
