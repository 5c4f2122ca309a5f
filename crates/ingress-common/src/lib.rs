//! Common types for ingress annotation extraction: errors, key helpers, telemetry

#![deny(missing_docs)]

pub mod error;
pub mod kube_utils;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default prefix shared by every ingress annotation key
///
/// Keys take the form `<prefix>/<suffix>`. Renaming either half is a
/// breaking change for operators.
pub const DEFAULT_ANNOTATION_PREFIX: &str = "ingress.kubernetes.io";

/// Environment variable overriding the annotation prefix
pub const ANNOTATION_PREFIX_ENV: &str = "INGRESS_ANNOTATION_PREFIX";

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info,ingress_annotations=debug";
