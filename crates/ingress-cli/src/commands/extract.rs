//! Extract command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::ByteString;
use serde::Deserialize;
use tracing::{debug, info};

use ingress_annotations::{
    AnnotationExtractor, ExtractedAnnotations, ExtractorConfig, StaticConfigProvider,
};
use ingress_common::kube_utils::namespaced_key;
use ingress_common::{Error, ANNOTATION_PREFIX_ENV};

use super::read_file;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Ingress manifest (YAML or JSON)
    #[arg(long)]
    pub ingress: PathBuf,

    /// Secrets referenced by the ingress (multi-document YAML)
    #[arg(long)]
    pub secrets: Option<PathBuf>,

    /// Extractor configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Annotation key prefix, overriding the configuration file
    #[arg(long, env = ANNOTATION_PREFIX_ENV)]
    pub annotation_prefix: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

/// `--output` values
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    let ingress: Ingress = parse_manifest("Ingress", &read_file(&args.ingress)?)?;

    let mut provider = StaticConfigProvider::new(config.backend.clone());
    if let Some(path) = &args.secrets {
        for secret in parse_secrets(&read_file(path)?)? {
            provider.insert_secret(secret);
        }
    }
    debug!(secrets = provider.secret_count(), "loaded secrets");

    let extractor = AnnotationExtractor::with_config(Arc::new(provider), &config);
    let model = extractor.extract(&ingress);

    let failed = model.errors().count();
    if failed > 0 {
        info!(ingress = %namespaced_key(&ingress), failed, "some features could not be resolved");
    }

    print!("{}", render(&model, args.output)?);
    Ok(())
}

fn load_config(args: &ExtractArgs) -> anyhow::Result<ExtractorConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::from_file(path)?,
        None => ExtractorConfig::default(),
    };
    if let Some(prefix) = &args.annotation_prefix {
        config.annotation_prefix = prefix.clone();
    }
    config
        .validate()
        .context("invalid extractor configuration")?;
    Ok(config)
}

fn parse_manifest<T: serde::de::DeserializeOwned>(kind: &str, yaml: &str) -> Result<T, Error> {
    serde_yaml::from_str(yaml).map_err(|e| Error::serialization_for(kind, e.to_string()))
}

/// Parse Secrets from a multi-document stream, skipping other kinds.
///
/// `stringData` entries are merged into `data` the way the API server
/// does on write.
fn parse_secrets(yaml: &str) -> Result<Vec<Secret>, Error> {
    let mut secrets = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)
            .map_err(|e| Error::serialization_for("Secret", e.to_string()))?;
        if value.get("kind").and_then(|k| k.as_str()) != Some("Secret") {
            continue;
        }

        let mut secret: Secret = serde_yaml::from_value(value)
            .map_err(|e| Error::serialization_for("Secret", e.to_string()))?;
        if let Some(string_data) = secret.string_data.take() {
            let data = secret.data.get_or_insert_with(Default::default);
            for (key, value) in string_data {
                data.insert(key, ByteString(value.into_bytes()));
            }
        }
        secrets.push(secret);
    }
    Ok(secrets)
}

fn render(model: &ExtractedAnnotations, format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(model)
            .map(|s| s + "\n")
            .map_err(|e| Error::serialization(e.to_string())),
        OutputFormat::Yaml => {
            serde_yaml::to_string(model).map_err(|e| Error::serialization(e.to_string()))
        }
    }
}
