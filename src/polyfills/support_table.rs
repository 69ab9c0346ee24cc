use std::{cmp::Ordering, collections::BTreeMap, fs, path::Path};

use browserslist::Opts;

use crate::polyfills::{
    error::{PolyfillError, internal_error, oracle_failure},
    ports::CapabilityOracle,
    types::BrowserTarget,
};

const BUNDLED_SUPPORT_DATA: &str = include_str!("../../data/support.json5");

/// Dotted numeric browser version, compared component-wise with missing
/// components treated as zero.
#[derive(Debug, Clone)]
pub struct BrowserVersion(Vec<u32>);

impl BrowserVersion {
    /// Ranges such as `15.2-15.3` are judged by their lower bound. `TP`
    /// (technology preview) sorts after every numbered release.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("tp") {
            return Some(Self(vec![u32::MAX]));
        }

        let lower = raw.split('-').next()?.trim();
        if lower.is_empty() {
            return None;
        }

        lower
            .split('.')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    fn component(&self, index: usize) -> u32 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for BrowserVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BrowserVersion {}

impl PartialOrd for BrowserVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BrowserVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.0.len().max(other.0.len());
        (0..width)
            .map(|index| self.component(index).cmp(&other.component(index)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// A concrete browser release matched by the target queries. `version` is
/// `None` for releases without a numeric version, such as `op_mini all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedTarget {
    pub browser: String,
    pub version: Option<BrowserVersion>,
}

/// Expands browserslist queries (`"defaults"`, `"last 2 versions"`,
/// `"chrome 120"`, ...) into the releases they select.
pub fn expand_targets(targets: &[BrowserTarget]) -> Result<Vec<ExpandedTarget>, PolyfillError> {
    if targets.is_empty() {
        return Err(oracle_failure("no browser targets to query"));
    }

    let releases = browserslist::resolve(targets, &Opts::default()).map_err(|err| {
        oracle_failure(format!(
            "invalid browser targets [{}]: {err}",
            targets.join(", ")
        ))
    })?;
    if releases.is_empty() {
        return Err(oracle_failure(format!(
            "browser targets [{}] matched no browsers",
            targets.join(", ")
        )));
    }

    Ok(releases
        .iter()
        .map(|release| ExpandedTarget {
            browser: release.name().to_ascii_lowercase(),
            version: BrowserVersion::parse(release.version()),
        })
        .collect())
}

/// Static compatibility data: for each feature test, the first version of
/// each browser that supports it natively.
#[derive(Debug, Clone, Default)]
pub struct SupportTable {
    features: BTreeMap<String, BTreeMap<String, BrowserVersion>>,
}

impl SupportTable {
    pub fn bundled() -> Result<Self, PolyfillError> {
        Self::from_json5(BUNDLED_SUPPORT_DATA)
    }

    pub fn load(path: &Path) -> Result<Self, PolyfillError> {
        let content = fs::read_to_string(path).map_err(|err| {
            internal_error(format!(
                "failed to read support table '{}': {err}",
                path.display()
            ))
        })?;
        Self::from_json5(&content).map_err(|err| {
            internal_error(format!(
                "invalid support table '{}': {}",
                path.display(),
                err.message
            ))
        })
    }

    pub fn from_json5(content: &str) -> Result<Self, PolyfillError> {
        let raw: BTreeMap<String, BTreeMap<String, String>> = json5::from_str(content)
            .map_err(|err| internal_error(format!("failed to parse support table: {err}")))?;

        let mut features = BTreeMap::new();
        for (feature_test, browsers) in raw {
            let mut minimums = BTreeMap::new();
            for (browser, version) in browsers {
                let parsed = BrowserVersion::parse(&version).ok_or_else(|| {
                    internal_error(format!(
                        "invalid minimum version '{version}' for {browser} in '{feature_test}'"
                    ))
                })?;
                minimums.insert(browser.to_ascii_lowercase(), parsed);
            }
            features.insert(feature_test, minimums);
        }

        Ok(Self { features })
    }

    pub fn contains(&self, feature_test: &str) -> bool {
        self.features.contains_key(feature_test)
    }

}

impl CapabilityOracle for SupportTable {
    fn is_supported(
        &self,
        feature_test: &str,
        targets: &[BrowserTarget],
    ) -> Result<bool, PolyfillError> {
        let minimums = self.features.get(feature_test).ok_or_else(|| {
            oracle_failure(format!("no support data for feature test '{feature_test}'"))
        })?;

        let expanded = expand_targets(targets)?;

        Ok(expanded.iter().all(|target| {
            match (minimums.get(&target.browser), &target.version) {
                (Some(minimum), Some(version)) => version >= minimum,
                _ => false,
            }
        }))
    }
}
