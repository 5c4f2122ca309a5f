//! `secure-backends`: connect to upstreams over TLS

use k8s_openapi::api::networking::v1::Ingress;

use super::{annotation_key, get_bool, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix
pub const SECURE_BACKENDS: &str = "secure-backends";

/// Reads the secure-upstream flag. Defaults to `false`.
#[derive(Clone, Debug)]
pub struct SecureUpstreamParser {
    key: String,
}

impl SecureUpstreamParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, SECURE_BACKENDS),
        }
    }
}

impl AnnotationParser for SecureUpstreamParser {
    type Output = bool;
    const FEATURE: Feature = Feature::SecureUpstream;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> bool {
        or_default(ingress, get_bool(ingress, &self.key), false)
    }

    fn wrap(output: bool) -> FeatureValue {
        FeatureValue::SecureUpstream(output)
    }
}
