use std::{env, path::PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::polyfills::EnvironmentDescriptor;

const USAGE: &str = "usage: polyfill-mapper [--config <path>] [--env <node|test-runtime|target[,target...]>] [--list] [--verbose]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub environment: Option<EnvironmentDescriptor>,
    pub list: bool,
    pub verbose: bool,
}

pub fn cli_args_from_env() -> Result<CliArgs> {
    parse_args(env::args().skip(1))
}

pub fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut environment = None;
    let mut list = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--env" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --env"))?;
                let parsed = value
                    .parse::<EnvironmentDescriptor>()
                    .with_context(|| format!("invalid --env value '{value}'"))?;
                environment = Some(parsed);
            }
            "--list" => list = true,
            "--verbose" | "-v" => verbose = true,
            other => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./polyfill-mapper.jsonc")),
        environment,
        list,
        verbose,
    })
}
