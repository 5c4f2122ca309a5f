//! Per-ingress default backend
//!
//! The `default-backend` annotation names a Service in the ingress
//! namespace that serves requests matching no rule. Without it the
//! ingress's own `spec.defaultBackend` service is used.

use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use serde::Serialize;

use ingress_common::kube_utils::{is_dns1035_label, join_namespaced_name};

use super::{annotation_key, get_string, report, AnnotationError, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: Service name in the ingress namespace
pub const DEFAULT_BACKEND: &str = "default-backend";

/// Default backend reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultBackend {
    /// `namespace/name` of the Service, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Reads [`DefaultBackend`]
#[derive(Clone, Debug)]
pub struct DefaultBackendParser {
    key: String,
}

impl DefaultBackendParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, DEFAULT_BACKEND),
        }
    }

    fn annotated(&self, ingress: &Ingress) -> Result<String, AnnotationError> {
        let name = get_string(ingress, &self.key)?;
        if !is_dns1035_label(&name) {
            return Err(AnnotationError::invalid(
                &self.key,
                &name,
                "not a valid Service name",
            ));
        }
        Ok(name)
    }
}

fn spec_backend(ingress: &Ingress) -> Option<String> {
    ingress
        .spec
        .as_ref()?
        .default_backend
        .as_ref()?
        .service
        .as_ref()
        .map(|svc| svc.name.clone())
}

impl AnnotationParser for DefaultBackendParser {
    type Output = DefaultBackend;
    const FEATURE: Feature = Feature::DefaultBackend;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> DefaultBackend {
        let name = self
            .annotated(ingress)
            .map_err(|e| report(ingress, &e))
            .ok()
            .or_else(|| spec_backend(ingress));

        let namespace = ingress.namespace().unwrap_or_default();
        DefaultBackend {
            service: name.map(|n| join_namespaced_name(&namespace, &n)),
        }
    }

    fn wrap(output: DefaultBackend) -> FeatureValue {
        FeatureValue::DefaultBackend(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticConfigProvider;
    use crate::testing::{build_ingress, ingress_with};
    use ingress_common::DEFAULT_ANNOTATION_PREFIX;
    use rstest::rstest;

    fn parser() -> DefaultBackendParser {
        DefaultBackendParser::new(DEFAULT_ANNOTATION_PREFIX)
    }

    #[rstest]
    #[case::annotated("custom-backend", "default/custom-backend")]
    #[case::uppercase("Custom", "default/default-backend")]
    #[case::leading_digit("1backend", "default/default-backend")]
    #[case::qualified("other/backend", "default/default-backend")]
    fn annotation_overrides_ingress_backend(#[case] value: &str, #[case] expected: &str) {
        let ing = ingress_with(&[(DEFAULT_BACKEND, value)]);
        let backend = parser().parse(&ing, &StaticConfigProvider::default());
        assert_eq!(backend.service.as_deref(), Some(expected));
    }

    #[test]
    fn falls_back_to_spec_default_backend() {
        let backend = parser().parse(&build_ingress(), &StaticConfigProvider::default());
        assert_eq!(backend.service.as_deref(), Some("default/default-backend"));
    }

    #[test]
    fn none_without_annotation_or_ingress_backend() {
        let mut ing = build_ingress();
        if let Some(spec) = ing.spec.as_mut() {
            spec.default_backend = None;
        }
        let backend = parser().parse(&ing, &StaticConfigProvider::default());
        assert_eq!(backend, DefaultBackend::default());
    }
}
