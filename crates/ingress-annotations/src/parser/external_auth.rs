//! Delegated authentication
//!
//! Each request is first sent to `auth-url`; a 2xx answer lets it through.
//! The URL, method and body flag are validated together: any invalid piece
//! disables the feature rather than authenticating against a half-parsed
//! target.

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;
use url::Url;

use super::{
    annotation_key, get_bool, get_string, optional, or_default, AnnotationError, AnnotationParser,
};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: authentication service URL
pub const AUTH_URL: &str = "auth-url";
/// Annotation suffix: HTTP method used for the auth request
pub const AUTH_METHOD: &str = "auth-method";
/// Annotation suffix: forward the request body to the auth service
pub const AUTH_SEND_BODY: &str = "auth-send-body";

const HTTP_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE",
];

/// External authentication settings; an empty `url` means disabled
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAuth {
    /// Authentication service URL
    pub url: String,
    /// HTTP method; empty keeps the client's method
    pub method: String,
    /// Forward the request body
    pub send_body: bool,
}

impl ExternalAuth {
    /// Whether external authentication is configured
    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Reads [`ExternalAuth`]
#[derive(Clone, Debug)]
pub struct ExternalAuthParser {
    url_key: String,
    method_key: String,
    send_body_key: String,
}

impl ExternalAuthParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            url_key: annotation_key(prefix, AUTH_URL),
            method_key: annotation_key(prefix, AUTH_METHOD),
            send_body_key: annotation_key(prefix, AUTH_SEND_BODY),
        }
    }

    fn read(&self, ingress: &Ingress) -> Result<ExternalAuth, AnnotationError> {
        let raw_url = get_string(ingress, &self.url_key)?;
        let url = validate_url(&self.url_key, &raw_url)?;

        let method = match optional(get_string(ingress, &self.method_key))? {
            Some(method) if HTTP_METHODS.contains(&method.as_str()) => method,
            Some(method) => {
                return Err(AnnotationError::invalid(
                    &self.method_key,
                    &method,
                    "not an HTTP method",
                ))
            }
            None => String::new(),
        };

        let send_body = optional(get_bool(ingress, &self.send_body_key))?.unwrap_or(false);

        Ok(ExternalAuth {
            url,
            method,
            send_body,
        })
    }
}

fn validate_url(key: &str, raw: &str) -> Result<String, AnnotationError> {
    let url = Url::parse(raw).map_err(|e| AnnotationError::invalid(key, raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnnotationError::invalid(key, raw, "scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AnnotationError::invalid(key, raw, "missing host"));
    }
    Ok(url.to_string())
}

impl AnnotationParser for ExternalAuthParser {
    type Output = ExternalAuth;
    const FEATURE: Feature = Feature::ExternalAuth;

    fn parse(&self, ingress: &Ingress, _provider: &dyn ConfigurationProvider) -> ExternalAuth {
        or_default(ingress, self.read(ingress), ExternalAuth::default())
    }

    fn wrap(output: ExternalAuth) -> FeatureValue {
        FeatureValue::ExternalAuth(output)
    }
}
