use std::sync::Arc;

use async_trait::async_trait;

use crate::polyfills::{
    error::PolyfillError,
    ports::{AsyncCapabilityOracle, CapabilityOracle},
    types::BrowserTarget,
};

/// Never proves native support, so every detectable feature keeps its
/// browser polyfill.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCapabilityOracle;

impl CapabilityOracle for NoopCapabilityOracle {
    fn is_supported(
        &self,
        _feature_test: &str,
        _targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError> {
        Ok(false)
    }
}

#[async_trait]
impl AsyncCapabilityOracle for NoopCapabilityOracle {
    async fn is_supported(
        &self,
        _feature_test: &str,
        _targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError> {
        Ok(false)
    }
}

/// Exposes a synchronous oracle through the async port.
pub struct SyncOracleAdapter {
    inner: Arc<dyn CapabilityOracle>,
}

impl SyncOracleAdapter {
    pub fn new(inner: Arc<dyn CapabilityOracle>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AsyncCapabilityOracle for SyncOracleAdapter {
    async fn is_supported(
        &self,
        feature_test: &str,
        targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError> {
        self.inner.is_supported(feature_test, targets)
    }
}
