//! `valor config`: show, validate and locate the configuration.

use anyhow::Result;
use clap::Subcommand;

use valor_common::config::config_path;
use valor_common::util::expand_path;
use valor_common::validation::Validate;
use valor_common::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file, env and defaults) as JSON
    Show,

    /// Check thresholds, logging and history settings
    Validate,

    /// Print the config file location
    Path,
}

pub fn handle_command(command: ConfigCommands, config: &Config, explicit: Option<&str>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommands::Validate => {
            config
                .validate()
                .map_err(|e| valor_common::Error::Config(e.to_string()))?;
            println!("Configuration is valid ({})", config.screener.filters.summary());
        }
        ConfigCommands::Path => {
            let path = explicit.map_or_else(config_path, expand_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
