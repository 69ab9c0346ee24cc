pub mod error;
pub mod noop;
pub mod ports;
pub mod registry;
pub mod resolver;
pub mod support_table;
pub mod types;

pub use error::{PolyfillError, PolyfillErrorKind};
pub use noop::{NoopCapabilityOracle, SyncOracleAdapter};
pub use ports::{AsyncCapabilityOracle, CapabilityOracle};
pub use registry::PolyfillRegistry;
pub use resolver::{AsyncPolyfillResolver, PolyfillResolver, Resolution};
pub use support_table::{BrowserVersion, SupportTable};
pub use types::{
    BrowserTarget, EnvironmentDescriptor, FeatureName, FeatureTestKey, PolyfillDescriptor,
    ResolvedMapping, ResolverConfig, RuntimeTag,
};
