//! Proxy timeouts and buffer sizes
//!
//! Every field is independent and falls back to the backend default.

use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;

use super::{annotation_key, get_int, get_string, non_negative, or_default, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix: upstream connect timeout in seconds
pub const PROXY_CONNECT_TIMEOUT: &str = "proxy-connect-timeout";
/// Annotation suffix: upstream send timeout in seconds
pub const PROXY_SEND_TIMEOUT: &str = "proxy-send-timeout";
/// Annotation suffix: upstream read timeout in seconds
pub const PROXY_READ_TIMEOUT: &str = "proxy-read-timeout";
/// Annotation suffix: response buffer size
pub const PROXY_BUFFER_SIZE: &str = "proxy-buffer-size";
/// Annotation suffix: maximum request body size
pub const PROXY_BODY_SIZE: &str = "proxy-body-size";

/// Proxy settings for the routes of one ingress
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Maximum request body size (e.g., "8m")
    pub body_size: String,
    /// Upstream connect timeout in seconds
    pub connect_timeout: i32,
    /// Upstream send timeout in seconds
    pub send_timeout: i32,
    /// Upstream read timeout in seconds
    pub read_timeout: i32,
    /// Response buffer size (e.g., "4k")
    pub buffer_size: String,
}

/// Reads [`ProxyConfig`]
#[derive(Clone, Debug)]
pub struct ProxyParser {
    connect_timeout_key: String,
    send_timeout_key: String,
    read_timeout_key: String,
    buffer_size_key: String,
    body_size_key: String,
}

impl ProxyParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            connect_timeout_key: annotation_key(prefix, PROXY_CONNECT_TIMEOUT),
            send_timeout_key: annotation_key(prefix, PROXY_SEND_TIMEOUT),
            read_timeout_key: annotation_key(prefix, PROXY_READ_TIMEOUT),
            buffer_size_key: annotation_key(prefix, PROXY_BUFFER_SIZE),
            body_size_key: annotation_key(prefix, PROXY_BODY_SIZE),
        }
    }

    fn timeout(&self, ingress: &Ingress, key: &str, fallback: i32) -> i32 {
        let value = get_int(ingress, key).and_then(|v| non_negative(key, v));
        or_default(ingress, value, fallback)
    }
}

impl AnnotationParser for ProxyParser {
    type Output = ProxyConfig;
    const FEATURE: Feature = Feature::Proxy;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> ProxyConfig {
        let defaults = provider.default_backend();
        ProxyConfig {
            body_size: or_default(
                ingress,
                get_string(ingress, &self.body_size_key),
                defaults.proxy_body_size,
            ),
            connect_timeout: self.timeout(
                ingress,
                &self.connect_timeout_key,
                defaults.proxy_connect_timeout,
            ),
            send_timeout: self.timeout(
                ingress,
                &self.send_timeout_key,
                defaults.proxy_send_timeout,
            ),
            read_timeout: self.timeout(
                ingress,
                &self.read_timeout_key,
                defaults.proxy_read_timeout,
            ),
            buffer_size: or_default(
                ingress,
                get_string(ingress, &self.buffer_size_key),
                defaults.proxy_buffer_size,
            ),
        }
    }

    fn wrap(output: ProxyConfig) -> FeatureValue {
        FeatureValue::Proxy(output)
    }
}
