//! Basic and digest authentication
//!
//! `auth-secret` names a Secret in the ingress namespace whose `auth` key
//! holds htpasswd content. The Secret is fetched through the provider, so a
//! missing or unusable Secret is a feature-scoped error rather than a
//! parse fault.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use serde::Serialize;
use tracing::debug;

use ingress_common::kube_utils::{join_namespaced_name, namespaced_key};

use super::{annotation_key, get_string, optional, report, AnnotationError, AnnotationParser};
use crate::model::{Feature, FeatureValue, Resolved};
use crate::provider::{ConfigurationProvider, ProviderError};

/// Annotation suffix: `basic` or `digest`
pub const AUTH_TYPE: &str = "auth-type";
/// Annotation suffix: name of the htpasswd Secret
pub const AUTH_SECRET: &str = "auth-secret";
/// Annotation suffix: realm shown to clients
pub const AUTH_REALM: &str = "auth-realm";

/// Secret data key holding htpasswd content
pub const AUTH_DATA_KEY: &str = "auth";

const AUTH_TYPES: [&str; 2] = ["basic", "digest"];

/// Basic/digest authentication settings
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicDigestAuth {
    /// `basic` or `digest`
    pub auth_type: String,
    /// Realm shown to clients
    pub realm: String,
    /// `namespace/name` of the htpasswd Secret
    pub secret: String,
    /// htpasswd file content
    #[serde(skip_serializing)]
    pub htpasswd: String,
    /// Whether authentication is enforced
    pub secured: bool,
}

impl std::fmt::Debug for BasicDigestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose htpasswd content in debug output
        f.debug_struct("BasicDigestAuth")
            .field("auth_type", &self.auth_type)
            .field("realm", &self.realm)
            .field("secret", &self.secret)
            .field("htpasswd", &"<redacted>")
            .field("secured", &self.secured)
            .finish()
    }
}

/// What the annotations ask for, before the Secret is resolved
struct AuthRequest {
    auth_type: String,
    secret: String,
    realm: String,
}

/// Reads [`BasicDigestAuth`]
#[derive(Clone, Debug)]
pub struct AuthParser {
    type_key: String,
    secret_key: String,
    realm_key: String,
}

impl AuthParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            type_key: annotation_key(prefix, AUTH_TYPE),
            secret_key: annotation_key(prefix, AUTH_SECRET),
            realm_key: annotation_key(prefix, AUTH_REALM),
        }
    }

    fn request(&self, ingress: &Ingress) -> Result<AuthRequest, AnnotationError> {
        let auth_type = get_string(ingress, &self.type_key)?;
        if !AUTH_TYPES.contains(&auth_type.as_str()) {
            return Err(AnnotationError::invalid(
                &self.type_key,
                &auth_type,
                "expected basic or digest",
            ));
        }

        let secret_name = get_string(ingress, &self.secret_key)?;
        if secret_name.contains('/') {
            return Err(AnnotationError::invalid(
                &self.secret_key,
                &secret_name,
                "must name a Secret in the ingress namespace",
            ));
        }

        Ok(AuthRequest {
            auth_type,
            secret: join_namespaced_name(
                &ingress.namespace().unwrap_or_default(),
                &secret_name,
            ),
            realm: optional(get_string(ingress, &self.realm_key))?.unwrap_or_default(),
        })
    }
}

fn htpasswd(name: &str, secret: &Secret) -> Result<String, ProviderError> {
    let data = secret
        .data
        .as_ref()
        .and_then(|d| d.get(AUTH_DATA_KEY))
        .ok_or_else(|| {
            ProviderError::invalid_secret(name, format!("missing {} key", AUTH_DATA_KEY))
        })?;
    let content = String::from_utf8(data.0.clone())
        .map_err(|_| ProviderError::invalid_secret(name, "auth data is not UTF-8"))?;
    if content.trim().is_empty() {
        return Err(ProviderError::invalid_secret(name, "auth data is empty"));
    }
    Ok(content)
}

impl AnnotationParser for AuthParser {
    type Output = Resolved<BasicDigestAuth>;
    const FEATURE: Feature = Feature::BasicDigestAuth;

    fn parse(
        &self,
        ingress: &Ingress,
        provider: &dyn ConfigurationProvider,
    ) -> Resolved<BasicDigestAuth> {
        let request = match self.request(ingress) {
            Ok(request) => request,
            Err(e) => {
                report(ingress, &e);
                return Resolved::default();
            }
        };

        debug!(
            ingress = %namespaced_key(ingress),
            secret = %request.secret,
            "resolving auth secret"
        );
        match provider
            .secret(&request.secret)
            .and_then(|secret| htpasswd(&request.secret, &secret))
        {
            Ok(htpasswd) => Resolved::ok(BasicDigestAuth {
                auth_type: request.auth_type,
                realm: request.realm,
                secret: request.secret,
                htpasswd,
                secured: true,
            }),
            Err(e) => Resolved::from_error(e),
        }
    }

    fn wrap(output: Resolved<BasicDigestAuth>) -> FeatureValue {
        FeatureValue::BasicDigestAuth(output)
    }
}
