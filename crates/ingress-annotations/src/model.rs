//! Result model handed to the proxy config renderer
//!
//! One [`ExtractedAnnotations`] is produced per ingress per reconciliation
//! pass. It always holds a value for every [`Feature`]; features that were
//! not configured carry their documented default.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::parser::auth::BasicDigestAuth;
use crate::parser::auth_tls::AuthTls;
use crate::parser::default_backend::DefaultBackend;
use crate::parser::external_auth::ExternalAuth;
use crate::parser::health_check::Upstream;
use crate::parser::proxy::ProxyConfig;
use crate::parser::rate_limit::RateLimit;
use crate::parser::rewrite::Redirect;
use crate::parser::session_affinity::AffinityConfig;
use crate::parser::whitelist::SourceRange;
use crate::provider::ProviderError;

// =============================================================================
// Feature
// =============================================================================

/// Result model key. Names are part of the renderer contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Feature {
    /// Basic or digest authentication against an htpasswd Secret
    BasicDigestAuth,
    /// Delegated authentication to an external URL
    ExternalAuth,
    /// Client-certificate authentication
    CertificateAuth,
    /// CORS headers
    #[serde(rename = "EnableCORS")]
    EnableCors,
    /// Passive upstream health checking
    HealthCheck,
    /// Client source-range allow list
    Whitelist,
    /// Keep the listening port in redirects
    UsePortInRedirects,
    /// Proxy timeouts and buffers
    Proxy,
    /// Connection and request rate limits
    RateLimit,
    /// Path rewrite and SSL redirect
    Redirect,
    /// TLS towards upstreams
    SecureUpstream,
    /// Sticky sessions
    SessionAffinity,
    /// TLS passthrough to upstreams
    #[serde(rename = "SSLPassthrough")]
    SslPassthrough,
    /// Backend for requests matching no rule
    DefaultBackend,
}

impl Feature {
    /// Every feature, in result model order
    pub const ALL: [Feature; 14] = [
        Feature::BasicDigestAuth,
        Feature::ExternalAuth,
        Feature::CertificateAuth,
        Feature::EnableCors,
        Feature::HealthCheck,
        Feature::Whitelist,
        Feature::UsePortInRedirects,
        Feature::Proxy,
        Feature::RateLimit,
        Feature::Redirect,
        Feature::SecureUpstream,
        Feature::SessionAffinity,
        Feature::SslPassthrough,
        Feature::DefaultBackend,
    ];

    /// Stable name used by the renderer
    pub fn name(self) -> &'static str {
        match self {
            Feature::BasicDigestAuth => "BasicDigestAuth",
            Feature::ExternalAuth => "ExternalAuth",
            Feature::CertificateAuth => "CertificateAuth",
            Feature::EnableCors => "EnableCORS",
            Feature::HealthCheck => "HealthCheck",
            Feature::Whitelist => "Whitelist",
            Feature::UsePortInRedirects => "UsePortInRedirects",
            Feature::Proxy => "Proxy",
            Feature::RateLimit => "RateLimit",
            Feature::Redirect => "Redirect",
            Feature::SecureUpstream => "SecureUpstream",
            Feature::SessionAffinity => "SessionAffinity",
            Feature::SslPassthrough => "SSLPassthrough",
            Feature::DefaultBackend => "DefaultBackend",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup of a feature name that doesn't exist
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

// =============================================================================
// Resolved
// =============================================================================

/// Value of a provider-backed feature plus the lookup error, if any.
///
/// On failure `value` holds the feature default, so the renderer can always
/// read it; whether an error blocks the route is the renderer's decision.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Resolved<T> {
    /// Resolved value, or the default when resolution failed
    pub value: T,
    /// Lookup failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl<T> Resolved<T> {
    /// Successful resolution
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    /// Failed resolution with a fallback value
    pub fn failed(value: T, error: ProviderError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    /// True when no lookup error occurred
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a plain `Result`, discarding the fallback on error
    pub fn into_result(self) -> Result<T, ProviderError> {
        match self.error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }
}

impl<T: Default> Resolved<T> {
    /// Failed resolution falling back to `T::default()`
    pub fn from_error(error: ProviderError) -> Self {
        Self::failed(T::default(), error)
    }
}

// =============================================================================
// FeatureValue
// =============================================================================

/// Typed value of one feature
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// See [`Feature::BasicDigestAuth`]
    BasicDigestAuth(Resolved<BasicDigestAuth>),
    /// See [`Feature::ExternalAuth`]
    ExternalAuth(ExternalAuth),
    /// See [`Feature::CertificateAuth`]
    CertificateAuth(Resolved<AuthTls>),
    /// See [`Feature::EnableCors`]
    EnableCors(bool),
    /// See [`Feature::HealthCheck`]
    HealthCheck(Upstream),
    /// See [`Feature::Whitelist`]
    Whitelist(SourceRange),
    /// See [`Feature::UsePortInRedirects`]
    UsePortInRedirects(bool),
    /// See [`Feature::Proxy`]
    Proxy(ProxyConfig),
    /// See [`Feature::RateLimit`]
    RateLimit(RateLimit),
    /// See [`Feature::Redirect`]
    Redirect(Redirect),
    /// See [`Feature::SecureUpstream`]
    SecureUpstream(bool),
    /// See [`Feature::SessionAffinity`]
    SessionAffinity(AffinityConfig),
    /// See [`Feature::SslPassthrough`]
    SslPassthrough(bool),
    /// See [`Feature::DefaultBackend`]
    DefaultBackend(DefaultBackend),
}

impl FeatureValue {
    /// Feature this value belongs to
    pub fn feature(&self) -> Feature {
        match self {
            FeatureValue::BasicDigestAuth(_) => Feature::BasicDigestAuth,
            FeatureValue::ExternalAuth(_) => Feature::ExternalAuth,
            FeatureValue::CertificateAuth(_) => Feature::CertificateAuth,
            FeatureValue::EnableCors(_) => Feature::EnableCors,
            FeatureValue::HealthCheck(_) => Feature::HealthCheck,
            FeatureValue::Whitelist(_) => Feature::Whitelist,
            FeatureValue::UsePortInRedirects(_) => Feature::UsePortInRedirects,
            FeatureValue::Proxy(_) => Feature::Proxy,
            FeatureValue::RateLimit(_) => Feature::RateLimit,
            FeatureValue::Redirect(_) => Feature::Redirect,
            FeatureValue::SecureUpstream(_) => Feature::SecureUpstream,
            FeatureValue::SessionAffinity(_) => Feature::SessionAffinity,
            FeatureValue::SslPassthrough(_) => Feature::SslPassthrough,
            FeatureValue::DefaultBackend(_) => Feature::DefaultBackend,
        }
    }

    /// Provider error attached to this value, if any
    pub fn error(&self) -> Option<&ProviderError> {
        match self {
            FeatureValue::BasicDigestAuth(r) => r.error.as_ref(),
            FeatureValue::CertificateAuth(r) => r.error.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// ExtractedAnnotations
// =============================================================================

/// All feature values extracted from one ingress
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtractedAnnotations {
    values: BTreeMap<Feature, FeatureValue>,
}

impl ExtractedAnnotations {
    pub(crate) fn new(values: BTreeMap<Feature, FeatureValue>) -> Self {
        Self { values }
    }

    /// Value of a feature
    pub fn get(&self, feature: Feature) -> Option<&FeatureValue> {
        self.values.get(&feature)
    }

    /// Value of a feature by its renderer name (e.g. `"HealthCheck"`)
    pub fn get_by_name(&self, name: &str) -> Option<&FeatureValue> {
        name.parse().ok().and_then(|f| self.get(f))
    }

    /// Whether a feature is present
    pub fn contains(&self, feature: Feature) -> bool {
        self.values.contains_key(&feature)
    }

    /// Number of features present
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over features and values in feature order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, &FeatureValue)> {
        self.values.iter().map(|(f, v)| (*f, v))
    }

    /// Feature-scoped provider errors
    pub fn errors(&self) -> impl Iterator<Item = (Feature, &ProviderError)> {
        self.values
            .iter()
            .filter_map(|(f, v)| v.error().map(|e| (*f, e)))
    }

    /// TLS towards upstreams
    pub fn secure_upstream(&self) -> bool {
        matches!(
            self.get(Feature::SecureUpstream),
            Some(FeatureValue::SecureUpstream(true))
        )
    }

    /// TLS passthrough
    pub fn ssl_passthrough(&self) -> bool {
        matches!(
            self.get(Feature::SslPassthrough),
            Some(FeatureValue::SslPassthrough(true))
        )
    }

    /// Upstream health check thresholds
    pub fn health_check(&self) -> Option<&Upstream> {
        match self.get(Feature::HealthCheck) {
            Some(FeatureValue::HealthCheck(v)) => Some(v),
            _ => None,
        }
    }

    /// Proxy timeouts and buffers
    pub fn proxy(&self) -> Option<&ProxyConfig> {
        match self.get(Feature::Proxy) {
            Some(FeatureValue::Proxy(v)) => Some(v),
            _ => None,
        }
    }

    /// Client-certificate authentication
    pub fn certificate_auth(&self) -> Option<&Resolved<AuthTls>> {
        match self.get(Feature::CertificateAuth) {
            Some(FeatureValue::CertificateAuth(v)) => Some(v),
            _ => None,
        }
    }

    /// Basic or digest authentication
    pub fn basic_digest_auth(&self) -> Option<&Resolved<BasicDigestAuth>> {
        match self.get(Feature::BasicDigestAuth) {
            Some(FeatureValue::BasicDigestAuth(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>(), Ok(feature));
            assert_eq!(feature.to_string(), feature.name());
        }
    }

    #[test]
    fn unknown_feature_name() {
        let err = "Rewrite".parse::<Feature>().unwrap_err();
        assert_eq!(err, UnknownFeature("Rewrite".to_string()));
    }

    #[test]
    fn serialized_feature_key_matches_name() {
        for feature in Feature::ALL {
            let json = serde_json::to_value(feature).unwrap();
            assert_eq!(json, feature.name());
        }
    }

    #[test]
    fn value_knows_its_feature() {
        assert_eq!(
            FeatureValue::HealthCheck(Upstream::default()).feature(),
            Feature::HealthCheck
        );
        assert_eq!(
            FeatureValue::SslPassthrough(true).feature(),
            Feature::SslPassthrough
        );
    }

    #[test]
    fn resolved_error_is_exposed() {
        let failed: Resolved<AuthTls> =
            Resolved::from_error(ProviderError::secret_not_found("default/ca"));
        assert!(!failed.is_ok());
        assert_eq!(failed.value, AuthTls::default());

        let value = FeatureValue::CertificateAuth(failed.clone());
        assert_eq!(value.error(), failed.error.as_ref());
        assert!(failed.into_result().is_err());

        let ok = Resolved::ok(AuthTls::default());
        assert!(ok.is_ok());
        assert_eq!(ok.into_result(), Ok(AuthTls::default()));
    }

    #[test]
    fn accessors_read_typed_values() {
        let mut values = BTreeMap::new();
        values.insert(Feature::SecureUpstream, FeatureValue::SecureUpstream(true));
        values.insert(
            Feature::HealthCheck,
            FeatureValue::HealthCheck(Upstream {
                max_fails: 3,
                fail_timeout: 10,
            }),
        );
        values.insert(
            Feature::CertificateAuth,
            FeatureValue::CertificateAuth(Resolved::from_error(
                ProviderError::secret_not_found("default/ca"),
            )),
        );
        let model = ExtractedAnnotations::new(values);

        assert!(model.secure_upstream());
        assert!(!model.ssl_passthrough());
        assert_eq!(model.health_check().map(|u| u.max_fails), Some(3));
        assert!(model.get_by_name("HealthCheck").is_some());
        assert!(model.get_by_name("Nope").is_none());
        assert!(model.proxy().is_none());
        assert_eq!(model.len(), 3);

        let errors: Vec<_> = model.errors().map(|(f, _)| f).collect();
        assert_eq!(errors, vec![Feature::CertificateAuth]);
    }

    #[test]
    fn model_serializes_as_named_map() {
        let mut values = BTreeMap::new();
        values.insert(Feature::SslPassthrough, FeatureValue::SslPassthrough(true));
        let json = serde_json::to_value(ExtractedAnnotations::new(values)).unwrap();
        assert_eq!(json["SSLPassthrough"], true);
    }
}
