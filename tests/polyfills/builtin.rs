use std::sync::Arc;

use polyfill_mapper::polyfills::{
    EnvironmentDescriptor, NoopCapabilityOracle, PolyfillErrorKind, PolyfillRegistry,
    PolyfillResolver, ResolverConfig, RuntimeTag, SupportTable,
};

use crate::targets;

fn bundled_resolver() -> PolyfillResolver<'static> {
    let table = SupportTable::bundled().expect("bundled support data should load");
    PolyfillResolver::with_builtin(&ResolverConfig::default(), Arc::new(table))
}

#[test]
fn every_builtin_feature_appears_exactly_once() {
    let resolver = bundled_resolver();
    let registry = PolyfillRegistry::builtin();

    for env in [
        EnvironmentDescriptor::Runtime(RuntimeTag::Node),
        EnvironmentDescriptor::Runtime(RuntimeTag::TestRuntime),
        EnvironmentDescriptor::Browsers(targets(&["ie 11"])),
    ] {
        let mapping = resolver.resolve(&env).expect("resolution should succeed");
        assert_eq!(mapping.len(), registry.len());
        for feature in registry.feature_names() {
            assert!(
                mapping.get(&format!("@polyfills/{feature}")).is_some(),
                "missing {feature} for {}",
                env.label()
            );
        }
    }
}

#[test]
fn modern_browsers_only_keep_polyfills_they_lack() {
    let mapping = bundled_resolver()
        .resolve(&EnvironmentDescriptor::Browsers(targets(&[
            "chrome 120",
            "firefox 121",
            "safari 17.0",
        ])))
        .expect("resolution should succeed");

    let noop = "@polyfills/dist/src/noop";
    assert_eq!(mapping.get("@polyfills/fetch"), Some(noop));
    assert_eq!(mapping.get("@polyfills/intersection-observer"), Some(noop));
    assert_eq!(mapping.get("@polyfills/intl"), Some(noop));
    assert_eq!(mapping.get("@polyfills/mutation-observer"), Some(noop));
    assert_eq!(mapping.get("@polyfills/unhandled-rejection"), Some(noop));
    assert_eq!(
        mapping.get("@polyfills/idle-callback"),
        Some("@polyfills/dist/src/idle-callback.browser")
    );
    assert_eq!(
        mapping.get("@polyfills/formdata"),
        Some("@polyfills/dist/src/formdata.browser")
    );
}

#[test]
fn legacy_browser_keeps_everything_it_does_not_support() {
    let mapping = bundled_resolver()
        .resolve(&EnvironmentDescriptor::Browsers(targets(&["ie 11"])))
        .expect("resolution should succeed");

    for (key, path) in mapping.iter() {
        if key == "@polyfills/mutation-observer" {
            assert_eq!(path, "@polyfills/dist/src/noop");
        } else {
            assert!(path.ends_with(".browser"), "{key} resolved to {path}");
        }
    }
}

#[test]
fn noop_oracle_never_drops_a_polyfill() {
    let resolver =
        PolyfillResolver::with_builtin(&ResolverConfig::default(), Arc::new(NoopCapabilityOracle));

    let mapping = resolver
        .resolve(&EnvironmentDescriptor::Browsers(targets(&["chrome 120"])))
        .expect("resolution should succeed");
    assert!(mapping.iter().all(|(_, path)| path.ends_with(".browser")));
}

#[test]
fn empty_browser_list_never_drops_polyfills() {
    let err = bundled_resolver()
        .resolve(&EnvironmentDescriptor::Browsers(Vec::new()))
        .expect_err("empty browser list should be rejected");
    assert_eq!(err.kind, PolyfillErrorKind::UnknownEnvironmentShape);
}

#[test]
fn browserslist_queries_resolve_through_the_bundled_table() {
    let resolver = bundled_resolver();

    let mapping = resolver
        .resolve(&EnvironmentDescriptor::Browsers(targets(&[
            "last 2 chrome versions",
            "last 2 firefox versions",
        ])))
        .expect("query-form targets should resolve");
    assert_eq!(mapping.get("@polyfills/fetch"), Some("@polyfills/dist/src/noop"));
    assert_eq!(
        mapping.get("@polyfills/formdata"),
        Some("@polyfills/dist/src/formdata.browser")
    );

    let mapping = resolver
        .resolve(&EnvironmentDescriptor::Browsers(targets(&["defaults"])))
        .expect("defaults query should resolve");
    assert_eq!(mapping.len(), PolyfillRegistry::builtin().len());
}
