use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result, anyhow};

use polyfill_mapper::{
    cli::cli_args_from_env,
    config::Config,
    logging::init_tracing,
    polyfills::{CapabilityOracle, PolyfillRegistry, PolyfillResolver, SupportTable},
};

fn main() -> Result<()> {
    let args = cli_args_from_env()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    let _logging = init_tracing(&config.logging, args.verbose)
        .context("failed to initialize logging")?;

    if args.list {
        let listing: BTreeMap<_, _> = PolyfillRegistry::builtin().iter().collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let support_table = match &config.support.table_path {
        Some(path) => SupportTable::load(path)?,
        None => SupportTable::bundled().context("bundled support data is invalid")?,
    };
    let oracle: Arc<dyn CapabilityOracle> = Arc::new(support_table);

    let environment = args
        .environment
        .or(config.environment)
        .ok_or_else(|| {
            anyhow!("no environment given: pass --env or set \"environment\" in the config")
        })?;

    let resolver = PolyfillResolver::with_builtin(&config.resolver, oracle);
    let mapping = resolver
        .resolve(&environment)
        .with_context(|| format!("failed to resolve polyfills for {}", environment.label()))?;

    println!("{}", serde_json::to_string_pretty(&mapping)?);
    Ok(())
}
