//! Helpers for Kubernetes object identity
//!
//! Secrets, certificates and services referenced from annotations are
//! addressed by `namespace/name` keys. These helpers build and split such
//! keys consistently.

use kube::ResourceExt;

use crate::Error;

/// Maximum length of a DNS-1035 label
const DNS_LABEL_MAX_LEN: usize = 63;

/// Build the `namespace/name` key of an object.
///
/// Cluster-scoped or namespace-less objects produce `/name`.
pub fn namespaced_key<K: ResourceExt>(obj: &K) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Join a namespace and a name into a `namespace/name` key
pub fn join_namespaced_name(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Split a `namespace/name` key.
///
/// Both halves must be non-empty and the key must contain exactly one `/`.
pub fn parse_namespaced_name(key: &str) -> Result<(&str, &str), Error> {
    match key.split_once('/') {
        Some((namespace, name))
            if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((namespace, name))
        }
        _ => Err(Error::validation_for(
            key,
            "expected a reference of the form namespace/name",
        )),
    }
}

/// Check whether a string is a valid DNS-1035 label (Service names).
///
/// `[a-z]([-a-z0-9]*[a-z0-9])?`, max 63 chars.
pub fn is_dns1035_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            s.len() <= DNS_LABEL_MAX_LEN
                && first.is_ascii_lowercase()
                && (last.is_ascii_lowercase() || last.is_ascii_digit())
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        }
        _ => false,
    }
}
