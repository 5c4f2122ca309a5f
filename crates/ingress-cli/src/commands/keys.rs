//! Keys command

use clap::Args;

use ingress_annotations::{annotation_keys, ExtractorConfig};
use ingress_common::{ANNOTATION_PREFIX_ENV, DEFAULT_ANNOTATION_PREFIX};

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Annotation key prefix
    #[arg(long, env = ANNOTATION_PREFIX_ENV, default_value = DEFAULT_ANNOTATION_PREFIX)]
    pub annotation_prefix: String,
}

pub fn run(args: KeysArgs) -> anyhow::Result<()> {
    let config = ExtractorConfig {
        annotation_prefix: args.annotation_prefix,
        ..Default::default()
    };
    config.validate()?;
    print!("{}", render(&config.annotation_prefix));
    Ok(())
}

fn render(prefix: &str) -> String {
    let mut out = String::new();
    for (feature, keys) in annotation_keys(prefix) {
        out.push_str(feature.name());
        out.push('\n');
        for key in keys {
            out.push_str("  ");
            out.push_str(&key);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_features_with_prefixed_keys() {
        let out = render("example.com");
        let health_check = "HealthCheck\n  example.com/upstream-max-fails\n";
        let passthrough = "SSLPassthrough\n  example.com/ssl-passthrough\n";
        assert!(out.contains(health_check));
        assert!(out.contains(passthrough));
        assert!(!out.contains("ingress.kubernetes.io"));
    }
}
