use async_trait::async_trait;

use crate::polyfills::{error::PolyfillError, types::BrowserTarget};

/// Answers whether every browser in `targets` natively supports the feature
/// identified by `feature_test`.
pub trait CapabilityOracle: Send + Sync {
    fn is_supported(
        &self,
        feature_test: &str,
        targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError>;
}

#[async_trait]
pub trait AsyncCapabilityOracle: Send + Sync {
    async fn is_supported(
        &self,
        feature_test: &str,
        targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError>;
}
