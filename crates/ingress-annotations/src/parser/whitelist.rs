//! `whitelist-source-range`: restrict clients by source address
//!
//! The annotation is a comma-separated list of CIDRs or bare addresses.
//! One bad entry invalidates the whole annotation and the controller's
//! default range applies instead. With an empty default range that means
//! every client is allowed; the fault is only reported as a warning.

use std::net::IpAddr;

use ipnet::IpNet;
use k8s_openapi::api::networking::v1::Ingress;
use serde::Serialize;
use tracing::warn;

use super::{annotation_key, get_string, or_default, AnnotationError, AnnotationParser};
use crate::model::{Feature, FeatureValue};
use crate::provider::ConfigurationProvider;

/// Annotation suffix
pub const WHITELIST_SOURCE_RANGE: &str = "whitelist-source-range";

/// Allowed client networks. Empty allows everyone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    /// Sorted, de-duplicated networks
    pub cidrs: Vec<IpNet>,
}

/// Reads [`SourceRange`], falling back to the backend default range
#[derive(Clone, Debug)]
pub struct WhitelistParser {
    key: String,
}

impl WhitelistParser {
    /// Create a parser for keys under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            key: annotation_key(prefix, WHITELIST_SOURCE_RANGE),
        }
    }
}

impl AnnotationParser for WhitelistParser {
    type Output = SourceRange;
    const FEATURE: Feature = Feature::Whitelist;

    fn parse(&self, ingress: &Ingress, provider: &dyn ConfigurationProvider) -> SourceRange {
        let annotated = get_string(ingress, &self.key).and_then(|v| parse_cidrs(&self.key, &v));
        let fallback = default_range(&provider.default_backend().whitelist_source_range);
        SourceRange {
            cidrs: or_default(ingress, annotated, fallback),
        }
    }

    fn wrap(output: SourceRange) -> FeatureValue {
        FeatureValue::Whitelist(output)
    }
}

fn parse_entry(entry: &str) -> Option<IpNet> {
    if let Ok(net) = entry.parse::<IpNet>() {
        return Some(net.trunc());
    }
    let addr = entry.parse::<IpAddr>().ok()?;
    let prefix = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    IpNet::new(addr, prefix).ok()
}

fn normalize(mut cidrs: Vec<IpNet>) -> Vec<IpNet> {
    cidrs.sort();
    cidrs.dedup();
    cidrs
}

/// Parse a comma-separated source range; any bad entry fails the whole list
pub fn parse_cidrs(key: &str, value: &str) -> Result<Vec<IpNet>, AnnotationError> {
    let mut cidrs = Vec::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let net = parse_entry(entry).ok_or_else(|| {
            AnnotationError::invalid(key, value, format!("{} is not a CIDR or IP address", entry))
        })?;
        cidrs.push(net);
    }
    if cidrs.is_empty() {
        return Err(AnnotationError::invalid(key, value, "no networks listed"));
    }
    Ok(normalize(cidrs))
}

/// Controller-wide range; bad entries are dropped individually
fn default_range(entries: &[String]) -> Vec<IpNet> {
    let cidrs = entries
        .iter()
        .filter_map(|entry| {
            let net = parse_entry(entry.trim());
            if net.is_none() {
                warn!(entry = %entry, "ignoring invalid default whitelist entry");
            }
            net
        })
        .collect();
    normalize(cidrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BackendDefaults, StaticConfigProvider};
    use crate::testing::{ingress_with, ingress_without_annotations};
    use ingress_common::DEFAULT_ANNOTATION_PREFIX;

    fn nets(list: &[&str]) -> Vec<IpNet> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn parse(ing: &Ingress, provider: &StaticConfigProvider) -> Vec<IpNet> {
        WhitelistParser::new(DEFAULT_ANNOTATION_PREFIX)
            .parse(ing, provider)
            .cidrs
    }

    #[test]
    fn parses_mixed_list() {
        let ing = ingress_with(&[(
            WHITELIST_SOURCE_RANGE,
            "10.0.0.0/24, 192.168.1.7 ,2001:db8::/32,10.0.0.0/24",
        )]);
        assert_eq!(
            parse(&ing, &StaticConfigProvider::default()),
            nets(&["10.0.0.0/24", "192.168.1.7/32", "2001:db8::/32"])
        );
    }

    #[test]
    fn host_bits_are_truncated() {
        let ing = ingress_with(&[(WHITELIST_SOURCE_RANGE, "10.1.2.3/8")]);
        assert_eq!(
            parse(&ing, &StaticConfigProvider::default()),
            nets(&["10.0.0.0/8"])
        );
    }

    #[test]
    fn one_bad_entry_falls_back_to_default_range() {
        let provider = StaticConfigProvider::new(BackendDefaults {
            whitelist_source_range: vec!["172.16.0.0/12".to_string(), "bogus".to_string()],
            ..Default::default()
        });
        let ing = ingress_with(&[(WHITELIST_SOURCE_RANGE, "10.0.0.0/8,10.0.0.300")]);
        assert_eq!(parse(&ing, &provider), nets(&["172.16.0.0/12"]));
    }

    #[test]
    fn bad_entry_with_empty_default_allows_everyone() {
        let ing = ingress_with(&[(WHITELIST_SOURCE_RANGE, "10.0.0.0/8, 10.0.0.300")]);
        let range = WhitelistParser::new(DEFAULT_ANNOTATION_PREFIX)
            .parse(&ing, &StaticConfigProvider::default());
        assert_eq!(range, SourceRange::default());
        assert!(range.cidrs.is_empty());
    }

    #[test]
    fn separators_only_is_invalid() {
        let err = parse_cidrs("k", " , ,").unwrap_err();
        assert!(err.to_string().contains("no networks listed"));
    }

    #[test]
    fn unannotated_allows_everyone_with_zero_defaults() {
        let cidrs = parse(
            &ingress_without_annotations(),
            &StaticConfigProvider::default(),
        );
        assert!(cidrs.is_empty());
    }
}
