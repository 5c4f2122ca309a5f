//! `use-port-in-redirects`: keep the listening port in `Location` headers

use k8s_openapi::api::networking::v1::Ingress;

use super::{annotation_key, get_bool, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix
pub const USE_PORT_IN_REDIRECTS: &str = "use-port-in-redirects";

/// Reads the port-in-redirects flag, falling back to the backend default
#[derive(Clone, Debug)]
pub struct PortInRedirectParser {
    key: String,
}

impl PortInRedirectParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, USE_PORT_IN_REDIRECTS),
        }
    }
}

impl AnnotationParser for PortInRedirectParser {
    type Output = bool;
    const FEATURE: Feature = Feature::UsePortInRedirects;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> bool {
        let fallback = provider.default_backend().use_port_in_redirects;
        or_default(ingress, get_bool(ingress, &self.key), fallback)
    }

    fn wrap(output: bool) -> FeatureValue {
        FeatureValue::UsePortInRedirects(output)
    }
}
