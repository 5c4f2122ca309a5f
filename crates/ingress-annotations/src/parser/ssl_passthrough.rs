//! `ssl-passthrough`: hand the TLS stream to the upstream undecrypted

use k8s_openapi::api::networking::v1::Ingress;

use super::{annotation_key, get_bool, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix
pub const SSL_PASSTHROUGH: &str = "ssl-passthrough";

/// Reads the SSL-passthrough flag. Defaults to `false`.
#[derive(Clone, Debug)]
pub struct SslPassthroughParser {
    key: String,
}

impl SslPassthroughParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, SSL_PASSTHROUGH),
        }
    }
}

impl AnnotationParser for SslPassthroughParser {
    type Output = bool;
    const FEATURE: Feature = Feature::SslPassthrough;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> bool {
        or_default(ingress, get_bool(ingress, &self.key), false)
    }

    fn wrap(output: bool) -> FeatureValue {
        FeatureValue::SslPassthrough(output)
    }
}
