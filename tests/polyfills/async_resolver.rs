use std::sync::Arc;

use async_trait::async_trait;
use polyfill_mapper::polyfills::{
    AsyncCapabilityOracle, AsyncPolyfillResolver, CapabilityOracle, EnvironmentDescriptor,
    PolyfillError, PolyfillErrorKind, PolyfillResolver, ResolverConfig, RuntimeTag, SupportTable,
    SyncOracleAdapter, error::oracle_failure,
};

use crate::{example_config, example_registry, targets};

struct RemoteLikeOracle {
    supported: bool,
}

#[async_trait]
impl AsyncCapabilityOracle for RemoteLikeOracle {
    async fn is_supported(
        &self,
        feature_test: &str,
        _targets: &[String],
    ) -> Result<bool, PolyfillError> {
        tokio::task::yield_now().await;
        if feature_test == "fetch" {
            Ok(self.supported)
        } else {
            Err(oracle_failure(format!("unexpected query for {feature_test}")))
        }
    }
}

struct UnreachableOracle;

#[async_trait]
impl AsyncCapabilityOracle for UnreachableOracle {
    async fn is_supported(
        &self,
        _feature_test: &str,
        _targets: &[String],
    ) -> Result<bool, PolyfillError> {
        Err(oracle_failure("support service unreachable"))
    }
}

#[tokio::test]
async fn given_async_oracle_when_resolve_then_policy_matches_sync_resolver() {
    let registry = example_registry();
    let resolver = AsyncPolyfillResolver::new(
        &registry,
        &example_config(),
        Arc::new(RemoteLikeOracle { supported: true }),
    );

    let mapping = resolver
        .resolve(&EnvironmentDescriptor::Browsers(targets(&["chrome 120"])))
        .await
        .expect("resolution should succeed");
    assert_eq!(mapping.get("ns/fetch"), Some("prefix/noop"));
    assert_eq!(mapping.get("ns/formdata"), Some("prefix/formdata.browser"));
}

#[tokio::test]
async fn given_async_oracle_failure_when_resolve_then_no_mapping_is_returned() {
    let registry = example_registry();
    let resolver =
        AsyncPolyfillResolver::new(&registry, &example_config(), Arc::new(UnreachableOracle));

    let err = resolver
        .resolve(&EnvironmentDescriptor::Browsers(targets(&["chrome 120"])))
        .await
        .expect_err("oracle failure should abort resolution");
    assert_eq!(err.kind, PolyfillErrorKind::OracleFailure);

    let mapping = resolver
        .resolve(&EnvironmentDescriptor::Runtime(RuntimeTag::TestRuntime))
        .await
        .expect("runtime tags never reach the oracle");
    assert_eq!(mapping.get("ns/fetch"), Some("prefix/fetch.test-runtime"));
}

#[tokio::test]
async fn sync_oracle_adapter_yields_identical_mapping() {
    let table: Arc<dyn CapabilityOracle> =
        Arc::new(SupportTable::bundled().expect("bundled support data should load"));
    let env = EnvironmentDescriptor::Browsers(targets(&["safari 12.1", "chrome 80"]));
    let config = ResolverConfig::default();

    let sync_mapping = PolyfillResolver::with_builtin(&config, Arc::clone(&table))
        .resolve(&env)
        .expect("sync resolution should succeed");
    let async_mapping =
        AsyncPolyfillResolver::with_builtin(&config, Arc::new(SyncOracleAdapter::new(table)))
            .resolve(&env)
            .await
            .expect("async resolution should succeed");

    assert_eq!(sync_mapping, async_mapping);
}

#[tokio::test]
async fn given_directly_built_empty_browser_list_when_resolve_async_then_shape_error() {
    let registry = example_registry();
    let resolver = AsyncPolyfillResolver::new(
        &registry,
        &example_config(),
        Arc::new(RemoteLikeOracle { supported: true }),
    );

    let err = resolver
        .resolve(&EnvironmentDescriptor::Browsers(Vec::new()))
        .await
        .expect_err("empty browser list should be rejected");
    assert_eq!(err.kind, PolyfillErrorKind::UnknownEnvironmentShape);
}
