//! Client-certificate authentication
//!
//! `auth-tls-secret` references a CA bundle Secret as `namespace/name`.
//! The bundle is resolved through the provider; the verification depth is
//! a plain annotation with a default of 1.

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;

use ingress_common::kube_utils::{join_namespaced_name, parse_namespaced_name};

use super::{
    annotation_key, get_int, get_string, optional, report, AnnotationError, AnnotationParser,
};
use crate::certificate::AuthSslCert;
use crate::model::{Feature, FeatureValue, Resolved};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: `namespace/name` of the CA Secret
pub const AUTH_TLS_SECRET: &str = "auth-tls-secret";
/// Annotation suffix: client certificate chain verification depth
pub const AUTH_TLS_VERIFY_DEPTH: &str = "auth-tls-verify-depth";

/// Verification depth when the annotation is absent or invalid
pub const DEFAULT_VERIFY_DEPTH: i32 = 1;

/// Client-certificate authentication settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTls {
    /// CA bundle used to verify clients
    #[serde(flatten)]
    pub cert: AuthSslCert,
    /// Maximum client certificate chain depth
    pub validation_depth: i32,
}

impl AuthTls {
    /// Whether client certificates are required
    pub fn is_enabled(&self) -> bool {
        !self.cert.secret.is_empty()
    }
}

/// Reads [`AuthTls`]
#[derive(Clone, Debug)]
pub struct AuthTlsParser {
    secret_key: String,
    depth_key: String,
}

impl AuthTlsParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            secret_key: annotation_key(prefix, AUTH_TLS_SECRET),
            depth_key: annotation_key(prefix, AUTH_TLS_VERIFY_DEPTH),
        }
    }

    fn secret_name(&self, ingress: &Ingress) -> Result<String, AnnotationError> {
        let raw = get_string(ingress, &self.secret_key)?;
        let (namespace, name) = parse_namespaced_name(&raw)
            .map_err(|e| AnnotationError::invalid(&self.secret_key, &raw, e.to_string()))?;
        Ok(join_namespaced_name(namespace, name))
    }

    fn depth(&self, ingress: &Ingress) -> i32 {
        let depth = optional(get_int(ingress, &self.depth_key)).and_then(|depth| match depth {
            Some(d) if d <= 0 => Err(AnnotationError::invalid(
                &self.depth_key,
                &d.to_string(),
                "must be positive",
            )),
            other => Ok(other.unwrap_or(DEFAULT_VERIFY_DEPTH)),
        });
        depth.unwrap_or_else(|e| {
            report(ingress, &e);
            DEFAULT_VERIFY_DEPTH
        })
    }
}

impl AnnotationParser for AuthTlsParser {
    type Output = Resolved<AuthTls>;
    const FEATURE: Feature = Feature::CertificateAuth;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> Resolved<AuthTls> {
        let secret = match self.secret_name(ingress) {
            Ok(secret) => secret,
            Err(e) => {
                report(ingress, &e);
                return Resolved::default();
            }
        };

        let validation_depth = self.depth(ingress);
        match provider.auth_certificate(&secret) {
            Ok(cert) => Resolved::ok(AuthTls {
                cert,
                validation_depth,
            }),
            Err(e) => Resolved::from_error(e),
        }
    }

    fn wrap(output: Resolved<AuthTls>) -> FeatureValue {
        FeatureValue::CertificateAuth(output)
    }
}
