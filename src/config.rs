use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::polyfills::{EnvironmentDescriptor, ResolverConfig};

const SCHEMA_FILE_NAME: &str = "polyfill-mapper.schema.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub support: SupportDataConfig,
    /// Environment to resolve when none is given on the command line.
    #[serde(default)]
    pub environment: Option<EnvironmentDescriptor>,
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/polyfill-mapper")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enabled_true")]
    pub file_enabled: bool,
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportDataConfig {
    /// json5 support table; the bundled data set is used when absent.
    #[serde(default)]
    pub table_path: Option<PathBuf>,
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = locate_schema(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config = serde_json::from_value(config_value)
            .context("failed to deserialize polyfill-mapper config")?;

        if let Some(table_path) = config.support.table_path.as_mut()
            && !table_path.is_absolute()
        {
            *table_path = config_base.join(&*table_path);
        }

        Ok(config)
    }
}

/// `$schema` wins (relative to the config file); otherwise the schema must sit
/// next to the config.
fn locate_schema(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    config_value
        .get("$schema")
        .and_then(Value::as_str)
        .map(|declared| config_base.join(declared))
        .or_else(|| Some(config_base.join(SCHEMA_FILE_NAME)).filter(|path| path.exists()))
        .ok_or_else(|| {
            anyhow!(
                "unable to resolve schema path: expected $schema in config or {SCHEMA_FILE_NAME} next to it"
            )
        })
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("failed to compile schema {}: {err}", schema_path.display()))?;

    let violations: Vec<String> = match compiled.validate(config_value) {
        Ok(()) => return Ok(()),
        Err(errors) => errors.map(|error| describe_violation(&error)).collect(),
    };
    Err(anyhow!("config validation failed: {}", violations.join("; ")))
}

/// Prefixes a schema error with the JSON pointer of the offending value.
fn describe_violation(error: &ValidationError<'_>) -> String {
    let location = error.instance_path.to_string();
    if location.is_empty() {
        format!("<root>: {error}")
    } else {
        format!("{location}: {error}")
    }
}
