use clap::{Args, Subcommand};
use serde::Serialize;

use tokenswap::defaults::{self, Defaults, TokenswapConfig};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (merged defaults + file)
    Show {
        /// Show only built-in defaults (ignore tokenswap.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Show the path to tokenswap.json
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<TokenswapConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults: Option<Defaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
}

pub fn run(args: ConfigArgs, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin, global),
        ConfigCommand::Path => path(global),
    }
}

fn show(builtin: bool, global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    if builtin {
        return Ok((
            ConfigOutput {
                command: "config.show".to_string(),
                defaults: Some(defaults::builtin_defaults()),
                config: None,
                path: None,
                exists: None,
            },
            0,
        ));
    }

    let config = match &global.config {
        Some(path) => defaults::load_config_from(path)?,
        None => defaults::load_config(),
    };

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            config: Some(config),
            defaults: None,
            path: None,
            exists: None,
        },
        0,
    ))
}

fn path(global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    let location = defaults::config_location(global.config.as_deref())?;
    let exists = match &global.config {
        Some(_) => location.exists(),
        None => defaults::config_exists(),
    };

    Ok((
        ConfigOutput {
            command: "config.path".to_string(),
            config: None,
            defaults: None,
            path: Some(location.to_string_lossy().to_string()),
            exists: Some(exists),
        },
        0,
    ))
}
