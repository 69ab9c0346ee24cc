use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::polyfills::error::{PolyfillError, unknown_environment_shape};

pub type FeatureName = String;
pub type FeatureTestKey = String;
pub type BrowserTarget = String;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolyfillDescriptor {
    /// Key used to ask the capability oracle about native support. Features
    /// without one always resolve to their environment-specific variant.
    #[serde(default)]
    pub feature_test: Option<FeatureTestKey>,
}

impl PolyfillDescriptor {
    pub fn detected_by(feature_test: impl Into<FeatureTestKey>) -> Self {
        Self {
            feature_test: Some(feature_test.into()),
        }
    }

    pub fn undetectable() -> Self {
        Self { feature_test: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeTag {
    Node,
    TestRuntime,
}

impl RuntimeTag {
    pub const ALL: [RuntimeTag; 2] = [RuntimeTag::Node, RuntimeTag::TestRuntime];

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeTag::Node => "node",
            RuntimeTag::TestRuntime => "test-runtime",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }
}

impl fmt::Display for RuntimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target a mapping is computed for: a fixed non-browser runtime or an
/// ordered, non-empty list of browser targets understood by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum EnvironmentDescriptor {
    Runtime(RuntimeTag),
    Browsers(Vec<BrowserTarget>),
}

impl EnvironmentDescriptor {
    pub fn browsers<I, S>(targets: I) -> Result<Self, PolyfillError>
    where
        I: IntoIterator<Item = S>,
        S: Into<BrowserTarget>,
    {
        let targets: Vec<BrowserTarget> = targets.into_iter().map(Into::into).collect();
        validate_browser_targets(&targets)?;
        Ok(Self::Browsers(targets))
    }

    pub fn from_value(value: &Value) -> Result<Self, PolyfillError> {
        match value {
            Value::String(raw) => RuntimeTag::parse(raw).map(Self::Runtime).ok_or_else(|| {
                unknown_environment_shape(format!(
                    "unknown runtime tag '{raw}': expected 'node', 'test-runtime' or a list of browser targets"
                ))
            }),
            Value::Array(items) => {
                let mut targets = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let Some(target) = item.as_str() else {
                        return Err(unknown_environment_shape(format!(
                            "browser target at index {index} is not a string: {item}"
                        )));
                    };
                    targets.push(target.to_string());
                }
                Self::browsers(targets)
            }
            other => Err(unknown_environment_shape(format!(
                "environment must be a runtime tag or a list of browser targets, got {}",
                value_kind(other)
            ))),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Runtime(tag) => tag.as_str().to_string(),
            Self::Browsers(targets) => targets.join(", "),
        }
    }
}

impl TryFrom<Value> for EnvironmentDescriptor {
    type Error = PolyfillError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<EnvironmentDescriptor> for Value {
    fn from(env: EnvironmentDescriptor) -> Self {
        match env {
            EnvironmentDescriptor::Runtime(tag) => Value::String(tag.as_str().to_string()),
            EnvironmentDescriptor::Browsers(targets) => {
                Value::Array(targets.into_iter().map(Value::String).collect())
            }
        }
    }
}

/// Command-line form: a runtime tag, or comma separated browser targets.
impl FromStr for EnvironmentDescriptor {
    type Err = PolyfillError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Some(tag) = RuntimeTag::parse(raw) {
            return Ok(Self::Runtime(tag));
        }

        Self::browsers(
            raw.split(',')
                .map(str::trim)
                .filter(|target| !target.is_empty()),
        )
    }
}

pub(crate) fn validate_browser_targets(targets: &[BrowserTarget]) -> Result<(), PolyfillError> {
    if targets.is_empty() {
        return Err(unknown_environment_shape(
            "browser target list cannot be empty",
        ));
    }
    if let Some(index) = targets.iter().position(|target| target.trim().is_empty()) {
        return Err(unknown_environment_shape(format!(
            "browser target at index {index} is blank"
        )));
    }
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedMapping {
    entries: BTreeMap<String, String>,
}

impl ResolvedMapping {
    pub(crate) fn insert(&mut self, source_key: String, resolved_path: String) {
        self.entries.insert(source_key, resolved_path);
    }

    pub fn get(&self, source_key: &str) -> Option<&str> {
        self.entries.get(source_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

fn default_source_namespace() -> String {
    "@polyfills".to_string()
}

fn default_implementation_prefix() -> String {
    "@polyfills/dist/src".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_source_namespace")]
    pub source_namespace: String,
    #[serde(default = "default_implementation_prefix")]
    pub implementation_prefix: String,
    /// Appends `$` to every source key, the exact-match marker of
    /// webpack-style alias tables.
    #[serde(default)]
    pub exact_match: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            source_namespace: default_source_namespace(),
            implementation_prefix: default_implementation_prefix(),
            exact_match: false,
        }
    }
}
