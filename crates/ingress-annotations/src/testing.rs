//! Shared fixtures for unit tests

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use ingress_common::DEFAULT_ANNOTATION_PREFIX;

use crate::parser::annotation_key;

/// Prefixed annotation key
pub(crate) fn key(suffix: &str) -> String {
    annotation_key(DEFAULT_ANNOTATION_PREFIX, suffix)
}

fn service_backend(name: &str, port: i32) -> IngressBackend {
    IngressBackend {
        service: Some(IngressServiceBackend {
            name: name.to_string(),
            port: Some(ServiceBackendPort {
                number: Some(port),
                ..Default::default()
            }),
        }),
        ..Default::default()
    }
}

/// `default/foo` with a default backend and one rule, no annotations
pub(crate) fn build_ingress() -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some("foo".to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            default_backend: Some(service_backend("default-backend", 80)),
            rules: Some(vec![IngressRule {
                host: Some("foo.bar.com".to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some("/foo".to_string()),
                        path_type: "Prefix".to_string(),
                        backend: service_backend("default-backend", 80),
                    }],
                }),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Ingress with a nil annotation mapping
pub(crate) fn ingress_without_annotations() -> Ingress {
    build_ingress()
}

/// Ingress annotated with `(suffix, value)` pairs under the default prefix
pub(crate) fn ingress_with(pairs: &[(&str, &str)]) -> Ingress {
    let annotations = pairs
        .iter()
        .map(|(suffix, value)| (key(suffix), value.to_string()))
        .collect::<BTreeMap<_, _>>();
    set_annotations(build_ingress(), Some(annotations))
}

/// Replace the annotation mapping
pub(crate) fn set_annotations(
    mut ingress: Ingress,
    annotations: Option<BTreeMap<String, String>>,
) -> Ingress {
    ingress.metadata.annotations = annotations;
    ingress
}

/// Secret with the given data keys
pub(crate) fn secret(namespace: &str, name: &str, data: &[(&str, &[u8])]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Freshly generated self-signed CA certificate
pub(crate) fn ca_pem(common_name: &str) -> String {
    let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, common_name);
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let key_pair = rcgen::KeyPair::generate().unwrap();
    params.self_signed(&key_pair).unwrap().pem()
}
