use std::sync::Arc;

use serde_json::Value;

use crate::polyfills::{
    error::PolyfillError,
    ports::{AsyncCapabilityOracle, CapabilityOracle},
    registry::PolyfillRegistry,
    types::{
        EnvironmentDescriptor, PolyfillDescriptor, ResolvedMapping, ResolverConfig, RuntimeTag,
        validate_browser_targets,
    },
};

const NOOP_SEGMENT: &str = "noop";
const BROWSER_SUFFIX: &str = "browser";
const EXACT_MATCH_MARKER: &str = "$";

/// Which implementation variant a feature is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    RuntimeVariant(RuntimeTag),
    BrowserPolyfill,
    Noop,
}

impl Resolution {
    /// `native_support` is `None` when the feature has no feature test and the
    /// oracle was never asked. Only a positive oracle answer yields `Noop`.
    pub fn decide(env: &EnvironmentDescriptor, native_support: Option<bool>) -> Self {
        match (env, native_support) {
            (EnvironmentDescriptor::Runtime(tag), _) => Self::RuntimeVariant(*tag),
            (EnvironmentDescriptor::Browsers(_), Some(true)) => Self::Noop,
            (EnvironmentDescriptor::Browsers(_), Some(false) | None) => Self::BrowserPolyfill,
        }
    }
}

/// Feature-test key to query for `descriptor`, if the environment calls for
/// a support check at all.
fn support_query<'a>(
    env: &'a EnvironmentDescriptor,
    descriptor: &'a PolyfillDescriptor,
) -> Option<(&'a str, &'a [String])> {
    match env {
        EnvironmentDescriptor::Runtime(_) => None,
        EnvironmentDescriptor::Browsers(targets) => descriptor
            .feature_test
            .as_deref()
            .map(|key| (key, targets.as_slice())),
    }
}

#[derive(Debug, Clone)]
struct PathLayout {
    source_namespace: String,
    implementation_prefix: String,
    exact_match: bool,
}

impl PathLayout {
    fn from_config(config: &ResolverConfig) -> Self {
        Self {
            source_namespace: config.source_namespace.trim_end_matches('/').to_string(),
            implementation_prefix: config
                .implementation_prefix
                .trim_end_matches('/')
                .to_string(),
            exact_match: config.exact_match,
        }
    }

    fn source_key(&self, feature: &str) -> String {
        let marker = if self.exact_match {
            EXACT_MATCH_MARKER
        } else {
            ""
        };
        format!("{}/{feature}{marker}", self.source_namespace)
    }

    fn noop_path(&self) -> String {
        format!("{}/{NOOP_SEGMENT}", self.implementation_prefix)
    }

    fn resolved_path(&self, feature: &str, resolution: Resolution) -> String {
        match resolution {
            Resolution::RuntimeVariant(tag) => {
                format!("{}/{feature}.{}", self.implementation_prefix, tag.as_str())
            }
            Resolution::BrowserPolyfill => {
                format!("{}/{feature}.{BROWSER_SUFFIX}", self.implementation_prefix)
            }
            Resolution::Noop => self.noop_path(),
        }
    }
}

fn log_oracle_failure(
    feature: &str,
    feature_test: &str,
    env: &EnvironmentDescriptor,
    err: &PolyfillError,
) {
    tracing::warn!(
        target: "polyfills",
        feature = feature,
        feature_test = feature_test,
        environment = %env.label(),
        error = %err,
        "capability_oracle_failed"
    );
}

/// Accumulates one mapping, one feature at a time. Shared by the sync and
/// async resolvers.
struct MappingBuilder<'a> {
    layout: &'a PathLayout,
    env: &'a EnvironmentDescriptor,
    mapping: ResolvedMapping,
    noop_count: usize,
}

impl<'a> MappingBuilder<'a> {
    /// Rejects browser lists that were built without
    /// [`EnvironmentDescriptor::browsers`].
    fn begin(
        layout: &'a PathLayout,
        env: &'a EnvironmentDescriptor,
    ) -> Result<Self, PolyfillError> {
        if let EnvironmentDescriptor::Browsers(targets) = env {
            validate_browser_targets(targets)?;
        }

        Ok(Self {
            layout,
            env,
            mapping: ResolvedMapping::default(),
            noop_count: 0,
        })
    }

    fn record(&mut self, feature: &str, native_support: Option<bool>) {
        let resolution = Resolution::decide(self.env, native_support);
        if resolution == Resolution::Noop {
            self.noop_count += 1;
        }

        let resolved_path = self.layout.resolved_path(feature, resolution);
        tracing::debug!(
            target: "polyfills",
            feature = feature,
            resolution = ?resolution,
            resolved_path = %resolved_path,
            "polyfill_resolved"
        );
        self.mapping.insert(self.layout.source_key(feature), resolved_path);
    }

    fn finish(self) -> ResolvedMapping {
        tracing::info!(
            target: "polyfills",
            environment = %self.env.label(),
            features = self.mapping.len(),
            noop_count = self.noop_count,
            "polyfills_resolved"
        );
        self.mapping
    }
}

pub struct PolyfillResolver<'r> {
    registry: &'r PolyfillRegistry,
    layout: PathLayout,
    oracle: Arc<dyn CapabilityOracle>,
}

impl PolyfillResolver<'static> {
    pub fn with_builtin(config: &ResolverConfig, oracle: Arc<dyn CapabilityOracle>) -> Self {
        Self::new(PolyfillRegistry::builtin(), config, oracle)
    }
}

impl<'r> PolyfillResolver<'r> {
    pub fn new(
        registry: &'r PolyfillRegistry,
        config: &ResolverConfig,
        oracle: Arc<dyn CapabilityOracle>,
    ) -> Self {
        Self {
            registry,
            layout: PathLayout::from_config(config),
            oracle,
        }
    }

    /// Maps every registered feature's canonical import path to the module
    /// that should back it in `env`. Any oracle failure aborts the whole call.
    pub fn resolve(&self, env: &EnvironmentDescriptor) -> Result<ResolvedMapping, PolyfillError> {
        let mut builder = MappingBuilder::begin(&self.layout, env)?;

        for (feature, descriptor) in self.registry.iter() {
            let native_support = match support_query(env, descriptor) {
                Some((feature_test, targets)) => Some(
                    self.oracle
                        .is_supported(feature_test, targets)
                        .inspect_err(|err| log_oracle_failure(feature, feature_test, env, err))?,
                ),
                None => None,
            };
            builder.record(feature, native_support);
        }

        Ok(builder.finish())
    }

    /// Entry point for loosely typed callers such as config files.
    pub fn resolve_value(&self, env: &Value) -> Result<ResolvedMapping, PolyfillError> {
        let env = EnvironmentDescriptor::from_value(env)?;
        self.resolve(&env)
    }
}

pub struct AsyncPolyfillResolver<'r> {
    registry: &'r PolyfillRegistry,
    layout: PathLayout,
    oracle: Arc<dyn AsyncCapabilityOracle>,
}

impl AsyncPolyfillResolver<'static> {
    pub fn with_builtin(config: &ResolverConfig, oracle: Arc<dyn AsyncCapabilityOracle>) -> Self {
        Self::new(PolyfillRegistry::builtin(), config, oracle)
    }
}

impl<'r> AsyncPolyfillResolver<'r> {
    pub fn new(
        registry: &'r PolyfillRegistry,
        config: &ResolverConfig,
        oracle: Arc<dyn AsyncCapabilityOracle>,
    ) -> Self {
        Self {
            registry,
            layout: PathLayout::from_config(config),
            oracle,
        }
    }

    /// Same policy as [`PolyfillResolver::resolve`]; the mapping is only
    /// returned after every oracle query has completed.
    pub async fn resolve(
        &self,
        env: &EnvironmentDescriptor,
    ) -> Result<ResolvedMapping, PolyfillError> {
        let mut builder = MappingBuilder::begin(&self.layout, env)?;

        for (feature, descriptor) in self.registry.iter() {
            let native_support = match support_query(env, descriptor) {
                Some((feature_test, targets)) => Some(
                    self.oracle
                        .is_supported(feature_test, targets)
                        .await
                        .inspect_err(|err| log_oracle_failure(feature, feature_test, env, err))?,
                ),
                None => None,
            };
            builder.record(feature, native_support);
        }

        Ok(builder.finish())
    }
}
