//! Path rewriting and HTTPS redirection

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;

use super::{annotation_key, get_bool, get_string, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: path the matched prefix is rewritten to
pub const REWRITE_TARGET: &str = "rewrite-target";
/// Annotation suffix: inject a `<base>` tag into HTML responses
pub const ADD_BASE_URL: &str = "add-base-url";
/// Annotation suffix: redirect HTTP to HTTPS
pub const SSL_REDIRECT: &str = "ssl-redirect";

/// Rewrite and redirect behaviour
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Rewrite target; empty keeps the original path
    pub target: String,
    /// Inject a base URL into HTML responses
    pub add_base_url: bool,
    /// Redirect plain HTTP to HTTPS
    pub ssl_redirect: bool,
}

/// Reads [`Redirect`]
#[derive(Clone, Debug)]
pub struct RewriteParser {
    target_key: String,
    add_base_url_key: String,
    ssl_redirect_key: String,
}

impl RewriteParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            target_key: annotation_key(prefix, REWRITE_TARGET),
            add_base_url_key: annotation_key(prefix, ADD_BASE_URL),
            ssl_redirect_key: annotation_key(prefix, SSL_REDIRECT),
        }
    }
}

impl AnnotationParser for RewriteParser {
    type Output = Redirect;
    const FEATURE: Feature = Feature::Redirect;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> Redirect {
        let ssl_redirect_default = provider.default_backend().ssl_redirect;
        Redirect {
            target: or_default(
                ingress,
                get_string(ingress, &self.target_key),
                String::new(),
            ),
            add_base_url: or_default(ingress, get_bool(ingress, &self.add_base_url_key), false),
            ssl_redirect: or_default(
                ingress,
                get_bool(ingress, &self.ssl_redirect_key),
                ssl_redirect_default,
            ),
        }
    }

    fn wrap(output: Redirect) -> FeatureValue {
        FeatureValue::Redirect(output)
    }
}
