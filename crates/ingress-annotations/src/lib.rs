//! Typed extraction of ingress annotations
//!
//! Operators configure per-route proxy behavior through string annotations
//! on `Ingress` objects. [`AnnotationExtractor`] turns those strings into an
//! [`ExtractedAnnotations`] snapshot with one typed value per [`Feature`],
//! defaulting anything missing or malformed and resolving Secrets through
//! an injected [`ConfigurationProvider`].

#![deny(missing_docs)]

pub mod certificate;
pub mod config;
pub mod extractor;
pub mod model;
pub mod parser;
pub mod provider;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use certificate::AuthSslCert;
pub use config::ExtractorConfig;
pub use extractor::{annotation_keys, AnnotationExtractor};
pub use model::{ExtractedAnnotations, Feature, FeatureValue, Resolved, UnknownFeature};
pub use parser::{AnnotationError, AnnotationParser};
pub use provider::{BackendDefaults, ConfigurationProvider, ProviderError, StaticConfigProvider};
pub use store::ClusterConfigProvider;
