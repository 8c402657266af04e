//! `sitemapper config show|init|path`

use anyhow::{Context, Result, anyhow};
use sitemapper_core::Config;
use sitemapper_core::config::LOCAL_CONFIG_FILE;
use std::path::{Path, PathBuf};

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn execute(command: ConfigCommands, explicit: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommands::Show => show(explicit),
        ConfigCommands::Init { path, force } => init(path, force),
        ConfigCommands::Path => path(explicit),
    }
}

fn show(explicit: Option<&Path>) -> Result<()> {
    let (config, _) = Config::discover(explicit).context("Failed to load configuration")?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
    if path.exists() && !force {
        return Err(CliError::usage(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn path(explicit: Option<&Path>) -> Result<()> {
    let (_, source) = Config::discover(explicit).context("Failed to load configuration")?;
    match source {
        Some(path) => println!("{}", path.display()),
        None => {
            let global = Config::global_config_path()?;
            println!("(defaults; no file at ./{LOCAL_CONFIG_FILE} or {})", global.display());
        },
    }
    Ok(())
}
