use std::{collections::BTreeMap, sync::OnceLock};

use crate::polyfills::{
    error::{PolyfillError, registry_invalid},
    types::{FeatureName, PolyfillDescriptor},
};

/// Features shipped by the polyfills package, with the support-data key used
/// to detect native support where one exists.
const BUILTIN_POLYFILLS: &[(&str, Option<&str>)] = &[
    ("fetch", Some("fetch")),
    ("formdata", None),
    ("idle-callback", Some("requestidlecallback")),
    ("intersection-observer", Some("intersectionobserver")),
    ("intl", Some("intl-pluralrules")),
    ("mutation-observer", Some("mutationobserver")),
    ("unhandled-rejection", Some("unhandledrejection")),
];

/// Immutable feature table; entries are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyfillRegistry {
    entries: BTreeMap<FeatureName, PolyfillDescriptor>,
}

impl PolyfillRegistry {
    pub fn new<I, S>(entries: I) -> Result<Self, PolyfillError>
    where
        I: IntoIterator<Item = (S, PolyfillDescriptor)>,
        S: Into<FeatureName>,
    {
        let mut by_name = BTreeMap::new();
        for (name, descriptor) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(registry_invalid("polyfill feature name cannot be empty"));
            }
            if name.contains('/') {
                return Err(registry_invalid(format!(
                    "polyfill feature name '{name}' cannot contain '/'"
                )));
            }
            if descriptor
                .feature_test
                .as_deref()
                .is_some_and(|key| key.trim().is_empty())
            {
                return Err(registry_invalid(format!(
                    "feature_test for '{name}' cannot be blank"
                )));
            }
            if by_name.contains_key(&name) {
                return Err(registry_invalid(format!(
                    "polyfill feature already registered: {name}"
                )));
            }
            by_name.insert(name, descriptor);
        }

        Ok(Self { entries: by_name })
    }

    /// Process-wide registry of the features this crate knows about.
    pub fn builtin() -> &'static PolyfillRegistry {
        static BUILTIN: OnceLock<PolyfillRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| PolyfillRegistry {
            entries: BUILTIN_POLYFILLS
                .iter()
                .map(|(name, feature_test)| {
                    (
                        (*name).to_string(),
                        PolyfillDescriptor {
                            feature_test: feature_test.map(str::to_string),
                        },
                    )
                })
                .collect(),
        })
    }

    pub fn get(&self, feature: &str) -> Option<&PolyfillDescriptor> {
        self.entries.get(feature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PolyfillDescriptor)> {
        self.entries
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
