//! Annotation extractor
//!
//! [`AnnotationExtractor`] runs the fixed set of feature parsers over one
//! ingress and collects their values into an [`ExtractedAnnotations`].
//! It is built once per controller with a [`ConfigurationProvider`] and
//! holds no per-call state, so a single instance can serve every
//! reconciliation worker concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::networking::v1::Ingress;
use tracing::{instrument, trace, warn};

use ingress_common::kube_utils::namespaced_key;
use ingress_common::DEFAULT_ANNOTATION_PREFIX;

use crate::config::ExtractorConfig;
use crate::model::{ExtractedAnnotations, Feature, FeatureValue};
use crate::parser::auth::{self, AuthParser};
use crate::parser::auth_tls::{self, AuthTlsParser};
use crate::parser::cors::{self, CorsParser};
use crate::parser::default_backend::{self, DefaultBackendParser};
use crate::parser::external_auth::{self, ExternalAuthParser};
use crate::parser::health_check::{self, HealthCheckParser, Upstream};
use crate::parser::port_in_redirect::{self, PortInRedirectParser};
use crate::parser::proxy::{self, ProxyConfig, ProxyParser};
use crate::parser::rate_limit::{self, RateLimitParser};
use crate::parser::rewrite::{self, RewriteParser};
use crate::parser::secure_upstream::{self, SecureUpstreamParser};
use crate::parser::session_affinity::{self, SessionAffinityParser};
use crate::parser::ssl_passthrough::{self, SslPassthroughParser};
use crate::parser::whitelist::{self, WhitelistParser};
use crate::parser::{annotation_key, AnnotationParser};
use crate::provider::ConfigurationProvider;

/// Extracts every feature from an ingress.
pub struct AnnotationExtractor {
    provider: Arc<dyn ConfigurationProvider>,
    auth: AuthParser,
    external_auth: ExternalAuthParser,
    auth_tls: AuthTlsParser,
    cors: CorsParser,
    health_check: HealthCheckParser,
    whitelist: WhitelistParser,
    port_in_redirect: PortInRedirectParser,
    proxy: ProxyParser,
    rate_limit: RateLimitParser,
    rewrite: RewriteParser,
    secure_upstream: SecureUpstreamParser,
    session_affinity: SessionAffinityParser,
    ssl_passthrough: SslPassthroughParser,
    default_backend: DefaultBackendParser,
}

impl AnnotationExtractor {
    /// Create an extractor reading keys under the default prefix
    pub fn new(provider: Arc<dyn ConfigurationProvider>) -> Self {
        Self::with_prefix(provider, DEFAULT_ANNOTATION_PREFIX)
    }

    /// Create an extractor reading keys under the configured prefix.
    ///
    /// Backend defaults are not taken from `config`; they are always
    /// resolved through the provider.
    pub fn with_config(provider: Arc<dyn ConfigurationProvider>, config: &ExtractorConfig) -> Self {
        Self::with_prefix(provider, &config.annotation_prefix)
    }

    /// Create an extractor reading keys under `prefix`
    pub fn with_prefix(provider: Arc<dyn ConfigurationProvider>, prefix: &str) -> Self {
        Self {
            provider,
            auth: AuthParser::new(prefix),
            external_auth: ExternalAuthParser::new(prefix),
            auth_tls: AuthTlsParser::new(prefix),
            cors: CorsParser::new(prefix),
            health_check: HealthCheckParser::new(prefix),
            whitelist: WhitelistParser::new(prefix),
            port_in_redirect: PortInRedirectParser::new(prefix),
            proxy: ProxyParser::new(prefix),
            rate_limit: RateLimitParser::new(prefix),
            rewrite: RewriteParser::new(prefix),
            secure_upstream: SecureUpstreamParser::new(prefix),
            session_affinity: SessionAffinityParser::new(prefix),
            ssl_passthrough: SslPassthroughParser::new(prefix),
            default_backend: DefaultBackendParser::new(prefix),
        }
    }

    /// Run every feature parser over `ingress`.
    ///
    /// Never fails. Every [`Feature`] is present in the result; provider
    /// faults are attached to the feature they belong to.
    #[instrument(skip_all, fields(ingress = %namespaced_key(ingress)))]
    pub fn extract(&self, ingress: &Ingress) -> ExtractedAnnotations {
        let mut values = BTreeMap::new();

        self.collect(&self.auth, ingress, &mut values);
        self.collect(&self.external_auth, ingress, &mut values);
        self.collect(&self.auth_tls, ingress, &mut values);
        self.collect(&self.cors, ingress, &mut values);
        self.collect(&self.health_check, ingress, &mut values);
        self.collect(&self.whitelist, ingress, &mut values);
        self.collect(&self.port_in_redirect, ingress, &mut values);
        self.collect(&self.proxy, ingress, &mut values);
        self.collect(&self.rate_limit, ingress, &mut values);
        self.collect(&self.rewrite, ingress, &mut values);
        self.collect(&self.secure_upstream, ingress, &mut values);
        self.collect(&self.session_affinity, ingress, &mut values);
        self.collect(&self.ssl_passthrough, ingress, &mut values);
        self.collect(&self.default_backend, ingress, &mut values);

        ExtractedAnnotations::new(values)
    }

    fn collect<P: AnnotationParser>(
        &self,
        parser: &P,
        ingress: &Ingress,
        values: &mut BTreeMap<Feature, FeatureValue>,
    ) {
        let value = P::wrap(parser.parse(ingress, self.provider.as_ref()));
        if let Some(error) = value.error() {
            warn!(feature = %P::FEATURE, %error, "feature could not be resolved");
        }
        trace!(feature = %P::FEATURE, ?value, "extracted feature");
        values.insert(P::FEATURE, value);
    }

    /// TLS towards upstreams
    pub fn secure_upstream(&self, ingress: &Ingress) -> bool {
        self.secure_upstream.parse(ingress, self.provider.as_ref())
    }

    /// TLS passthrough
    pub fn ssl_passthrough(&self, ingress: &Ingress) -> bool {
        self.ssl_passthrough.parse(ingress, self.provider.as_ref())
    }

    /// Upstream health check thresholds
    pub fn health_check(&self, ingress: &Ingress) -> Upstream {
        self.health_check.parse(ingress, self.provider.as_ref())
    }

    /// Proxy timeouts and buffers
    pub fn proxy(&self, ingress: &Ingress) -> ProxyConfig {
        self.proxy.parse(ingress, self.provider.as_ref())
    }
}

/// Annotation keys read for each feature, in result model order
pub fn annotation_keys(prefix: &str) -> Vec<(Feature, Vec<String>)> {
    let suffixes = |feature: Feature| -> &'static [&'static str] {
        match feature {
            Feature::BasicDigestAuth => &[auth::AUTH_TYPE, auth::AUTH_SECRET, auth::AUTH_REALM],
            Feature::ExternalAuth => &[
                external_auth::AUTH_URL,
                external_auth::AUTH_METHOD,
                external_auth::AUTH_SEND_BODY,
            ],
            Feature::CertificateAuth => {
                &[auth_tls::AUTH_TLS_SECRET, auth_tls::AUTH_TLS_VERIFY_DEPTH]
            }
            Feature::EnableCors => &[cors::ENABLE_CORS],
            Feature::HealthCheck => &[
                health_check::UPSTREAM_MAX_FAILS,
                health_check::UPSTREAM_FAIL_TIMEOUT,
            ],
            Feature::Whitelist => &[whitelist::WHITELIST_SOURCE_RANGE],
            Feature::UsePortInRedirects => &[port_in_redirect::USE_PORT_IN_REDIRECTS],
            Feature::Proxy => &[
                proxy::PROXY_CONNECT_TIMEOUT,
                proxy::PROXY_SEND_TIMEOUT,
                proxy::PROXY_READ_TIMEOUT,
                proxy::PROXY_BUFFER_SIZE,
                proxy::PROXY_BODY_SIZE,
            ],
            Feature::RateLimit => &[rate_limit::LIMIT_CONNECTIONS, rate_limit::LIMIT_RPS],
            Feature::Redirect => &[
                rewrite::REWRITE_TARGET,
                rewrite::ADD_BASE_URL,
                rewrite::SSL_REDIRECT,
            ],
            Feature::SecureUpstream => &[secure_upstream::SECURE_BACKENDS],
            Feature::SessionAffinity => &[
                session_affinity::AFFINITY,
                session_affinity::SESSION_COOKIE_NAME,
                session_affinity::SESSION_COOKIE_HASH,
            ],
            Feature::SslPassthrough => &[ssl_passthrough::SSL_PASSTHROUGH],
            Feature::DefaultBackend => &[default_backend::DEFAULT_BACKEND],
        }
    };

    Feature::ALL
        .into_iter()
        .map(|feature| {
            let keys = suffixes(feature)
                .iter()
                .map(|suffix| annotation_key(prefix, suffix))
                .collect();
            (feature, keys)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CA_CERT_KEY;
    use crate::model::Resolved;
    use crate::parser::auth_tls::AuthTls;
    use crate::provider::{
        BackendDefaults, MockConfigurationProvider, ProviderError, StaticConfigProvider,
    };
    use crate::testing::{
        ca_pem, ingress_with, ingress_without_annotations, secret, set_annotations,
    };

    fn extractor() -> AnnotationExtractor {
        AnnotationExtractor::new(Arc::new(StaticConfigProvider::default()))
    }

    #[test]
    fn every_feature_is_present_without_annotations() {
        let model = extractor().extract(&ingress_without_annotations());

        assert_eq!(model.len(), Feature::ALL.len());
        for feature in Feature::ALL {
            assert!(model.contains(feature), "missing {}", feature);
        }
        assert!(model.get_by_name("HealthCheck").is_some());
        assert!(model.get_by_name("Proxy").is_some());
        assert_eq!(model.errors().count(), 0);
    }

    #[test]
    fn nil_annotations_resolve_to_safe_defaults() {
        let model = extractor().extract(&ingress_without_annotations());

        assert!(!model.secure_upstream());
        assert!(!model.ssl_passthrough());
        assert_eq!(model.health_check(), Some(&Upstream::default()));
    }

    #[test]
    fn secure_backends_true() {
        let model = extractor().extract(&ingress_with(&[("secure-backends", "true")]));
        assert!(model.secure_upstream());
    }

    #[test]
    fn health_check_thresholds() {
        let ing = ingress_with(&[
            ("upstream-max-fails", "3"),
            ("upstream-fail-timeout", "10"),
        ]);
        let model = extractor().extract(&ing);
        assert_eq!(
            model.health_check(),
            Some(&Upstream {
                max_fails: 3,
                fail_timeout: 10
            })
        );

        let ing = ingress_with(&[("upstream-max-fails", "3")]);
        assert_eq!(
            extractor().health_check(&ing),
            Upstream {
                max_fails: 3,
                fail_timeout: 0
            }
        );
    }

    #[test]
    fn misspelled_passthrough_key_is_ignored() {
        let model = extractor().extract(&ingress_with(&[("ssl-passthrough_no", "true")]));
        assert!(!model.ssl_passthrough());
    }

    #[test]
    fn extraction_is_idempotent() {
        let ing = ingress_with(&[
            ("secure-backends", "true"),
            ("upstream-max-fails", "3"),
            ("whitelist-source-range", "10.0.0.0/8, 192.168.1.1"),
            ("affinity", "cookie"),
        ]);
        let extractor = extractor();
        assert_eq!(extractor.extract(&ing), extractor.extract(&ing));
    }

    #[test]
    fn malformed_feature_does_not_affect_others() {
        let base = [
            ("secure-backends", "true"),
            ("ssl-passthrough", "true"),
            ("upstream-fail-timeout", "10"),
            ("proxy-read-timeout", "30"),
        ];
        let clean = extractor().extract(&ingress_with(&base));

        let mut broken = base.to_vec();
        broken.push(("upstream-max-fails", "many"));
        broken.push(("whitelist-source-range", "not-a-cidr"));
        let dirty = extractor().extract(&ingress_with(&broken));

        for feature in Feature::ALL {
            assert_eq!(clean.get(feature), dirty.get(feature), "{} changed", feature);
        }
    }

    #[test]
    fn provider_failure_is_feature_scoped() {
        let ing = ingress_with(&[
            ("auth-tls-secret", "default/missing-ca"),
            ("secure-backends", "true"),
        ]);
        let model = extractor().extract(&ing);

        assert_eq!(
            model.certificate_auth(),
            Some(&Resolved::from_error(ProviderError::secret_not_found(
                "default/missing-ca"
            )))
        );
        assert!(model.secure_upstream());
        let failed: Vec<_> = model.errors().map(|(f, _)| f).collect();
        assert_eq!(failed, vec![Feature::CertificateAuth]);
    }

    #[test]
    fn provider_backed_features_resolve() {
        let pem = ca_pem("Client CA");
        let provider = StaticConfigProvider::default()
            .with_secret(secret("default", "client-ca", &[(CA_CERT_KEY, pem.as_bytes())]))
            .with_secret(secret("default", "basic-auth", &[("auth", b"foo:bar")]));
        let extractor = AnnotationExtractor::new(Arc::new(provider));

        let ing = ingress_with(&[
            ("auth-tls-secret", "default/client-ca"),
            ("auth-type", "basic"),
            ("auth-secret", "basic-auth"),
        ]);
        let model = extractor.extract(&ing);

        let tls = model.certificate_auth().map(|r| &r.value);
        assert_eq!(tls.map(AuthTls::is_enabled), Some(true));
        assert_eq!(
            model.basic_digest_auth().map(|r| r.value.secured),
            Some(true)
        );
        assert_eq!(model.errors().count(), 0);
    }

    #[test]
    fn backend_defaults_come_from_provider() {
        let mut provider = MockConfigurationProvider::new();
        provider.expect_default_backend().returning(|| BackendDefaults {
            proxy_read_timeout: 60,
            upstream_max_fails: 2,
            ..Default::default()
        });
        let extractor = AnnotationExtractor::new(Arc::new(provider));

        let model = extractor.extract(&ingress_without_annotations());
        assert_eq!(model.health_check().map(|u| u.max_fails), Some(2));
        assert_eq!(model.proxy().map(|p| p.read_timeout), Some(60));
    }

    #[test]
    fn custom_prefix_ignores_default_keys() {
        let config = ExtractorConfig {
            annotation_prefix: "nginx.ingress.kubernetes.io".to_string(),
            ..Default::default()
        };
        let extractor =
            AnnotationExtractor::with_config(Arc::new(StaticConfigProvider::default()), &config);

        let mut annotations = BTreeMap::new();
        annotations.insert(
            "nginx.ingress.kubernetes.io/ssl-passthrough".to_string(),
            "true".to_string(),
        );
        annotations.insert(
            "ingress.kubernetes.io/secure-backends".to_string(),
            "true".to_string(),
        );
        let ing = set_annotations(ingress_without_annotations(), Some(annotations));

        assert!(extractor.ssl_passthrough(&ing));
        assert!(!extractor.secure_upstream(&ing));
    }

    #[test]
    fn shared_extractor_across_threads() {
        let extractor = extractor();
        let ing = ingress_with(&[("upstream-max-fails", "4"), ("secure-backends", "true")]);
        let expected = extractor.extract(&ing);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| extractor.extract(&ing)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn keys_cover_every_feature() {
        let keys = annotation_keys(DEFAULT_ANNOTATION_PREFIX);
        assert_eq!(keys.len(), Feature::ALL.len());
        assert!(keys.iter().all(|(_, k)| !k.is_empty()));

        let proxy = keys.iter().find(|(f, _)| *f == Feature::Proxy).unwrap();
        assert_eq!(proxy.1.len(), 5);
        assert!(proxy
            .1
            .contains(&"ingress.kubernetes.io/proxy-read-timeout".to_string()));
    }
}
