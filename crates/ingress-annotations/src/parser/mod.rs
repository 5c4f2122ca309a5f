//! Feature parsers
//!
//! Each submodule reads one configuration facet off an ingress. Parsers
//! share one contract: they always produce a value. A missing or malformed
//! annotation resolves to the feature's documented default and never to an
//! error; only provider lookups can attach a feature-scoped error (see
//! [`crate::model::Resolved`]).
//!
//! Value parsing is strict:
//! - booleans must be exactly `"true"` or `"false"`
//! - integers are an optional `-` followed by ASCII digits
//! - strings must be non-empty

pub mod auth;
pub mod auth_tls;
pub mod cors;
pub mod default_backend;
pub mod external_auth;
pub mod health_check;
pub mod port_in_redirect;
pub mod proxy;
pub mod rate_limit;
pub mod rewrite;
pub mod secure_upstream;
pub mod session_affinity;
pub mod ssl_passthrough;
pub mod whitelist;

use k8s_openapi::api::networking::v1::Ingress;
use thiserror::Error;
use tracing::{trace, warn};

use ingress_common::kube_utils::namespaced_key;

use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// A parser for one feature.
///
/// Parsers are stateless apart from their precomputed annotation keys and
/// can be shared across threads.
pub trait AnnotationParser: Send + Sync {
    /// Typed value produced by this parser
    type Output;

    /// Result model key this parser populates
    const FEATURE: Feature;

    /// Read the feature off an ingress. Never fails.
    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> Self::Output;

    /// Wrap the typed value for the result model
    fn wrap(output: Self::Output) -> FeatureValue;
}

/// Why a single annotation could not be read
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    /// The ingress carries no annotation mapping at all
    #[error("ingress has no annotations")]
    MissingAnnotations,

    /// The key is not present (or is empty)
    #[error("annotation {0} is not set")]
    MissingAnnotation(String),

    /// The key is present but its value does not parse
    #[error("annotation {key} has invalid value {value:?}: {reason}")]
    InvalidContent {
        /// Full annotation key
        key: String,
        /// Raw value found on the ingress
        value: String,
        /// What is wrong with it
        reason: String,
    },
}

impl AnnotationError {
    /// Create an invalid-content error
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidContent {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the annotation simply isn't configured
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingAnnotations | Self::MissingAnnotation(_))
    }
}

/// Build a full annotation key from a prefix and a feature suffix
pub fn annotation_key(prefix: &str, suffix: &str) -> String {
    format!("{}/{}", prefix, suffix)
}

/// Raw annotation value
pub fn get_annotation<'a>(ingress: &'a Ingress, key: &str) -> Result<&'a str, AnnotationError> {
    let annotations = ingress
        .metadata
        .annotations
        .as_ref()
        .ok_or(AnnotationError::MissingAnnotations)?;
    match annotations.get(key) {
        Some(value) if !value.is_empty() => Ok(value.as_str()),
        _ => Err(AnnotationError::MissingAnnotation(key.to_string())),
    }
}

/// String annotation
pub fn get_string(ingress: &Ingress, key: &str) -> Result<String, AnnotationError> {
    get_annotation(ingress, key).map(str::to_string)
}

/// Boolean annotation. Only the literals `true` and `false` are accepted.
pub fn get_bool(ingress: &Ingress, key: &str) -> Result<bool, AnnotationError> {
    match get_annotation(ingress, key)? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AnnotationError::invalid(
            key,
            other,
            "expected \"true\" or \"false\"",
        )),
    }
}

/// Integer annotation. No sign prefix other than `-`, no whitespace.
pub fn get_int(ingress: &Ingress, key: &str) -> Result<i32, AnnotationError> {
    let value = get_annotation(ingress, key)?;
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AnnotationError::invalid(key, value, "expected an integer"));
    }
    value
        .parse::<i32>()
        .map_err(|e| AnnotationError::invalid(key, value, e.to_string()))
}

/// Reject negative integers
pub(crate) fn non_negative(key: &str, value: i32) -> Result<i32, AnnotationError> {
    if value < 0 {
        Err(AnnotationError::invalid(
            key,
            &value.to_string(),
            "must not be negative",
        ))
    } else {
        Ok(value)
    }
}

/// Turn "not configured" into `None`, keeping real faults
pub(crate) fn optional<T>(
    result: Result<T, AnnotationError>,
) -> Result<Option<T>, AnnotationError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_missing() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Log a parse fault. Missing keys are expected and only traced.
pub(crate) fn report(ingress: &Ingress, error: &AnnotationError) {
    if error.is_missing() {
        trace!(ingress = %namespaced_key(ingress), %error, "annotation not configured");
    } else {
        warn!(
            ingress = %namespaced_key(ingress),
            %error,
            "ignoring invalid annotation, using default"
        );
    }
}

/// Resolve a parse result, substituting `default` on any fault
pub(crate) fn or_default<T>(
    ingress: &Ingress,
    result: Result<T, AnnotationError>,
    default: T,
) -> T {
    result.unwrap_or_else(|e| {
        report(ingress, &e);
        default
    })
}
