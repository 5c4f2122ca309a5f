//! `enable-cors`: add CORS response headers

use k8s_openapi::api::networking::v1::Ingress;

use super::{annotation_key, get_bool, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix
pub const ENABLE_CORS: &str = "enable-cors";

/// Reads the CORS flag. Defaults to `false`.
#[derive(Clone, Debug)]
pub struct CorsParser {
    key: String,
}

impl CorsParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, ENABLE_CORS),
        }
    }
}

impl AnnotationParser for CorsParser {
    type Output = bool;
    const FEATURE: Feature = Feature::EnableCors;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> bool {
        or_default(ingress, get_bool(ingress, &self.key), false)
    }

    fn wrap(output: bool) -> FeatureValue {
        FeatureValue::EnableCors(output)
    }
}
