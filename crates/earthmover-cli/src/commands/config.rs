use std::env;

use earthmover_core::api::normalize_base_url;
use earthmover_core::config::{
    resolve_api_url, save_to_path, ClientConfig, ConfigError, API_URL_ENV,
};

use crate::cli::ConfigCommands;
use crate::commands::common::default_config_path;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, api_url_flag: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { api_url } => {
            let path = default_config_path()?;
            let api_url = normalize_base_url(&api_url)?;
            save_to_path(&path, &ClientConfig { api_url })?;
            println!("Saved API URL to {}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let path = default_config_path()?;
            let env_value = env::var(API_URL_ENV).ok();
            match resolve_api_url(api_url_flag, env_value.as_deref(), &path) {
                Ok((api_url, origin)) => {
                    println!("API URL:     {api_url} (from {origin})");
                    println!("Config file: {}", path.display());
                    Ok(())
                }
                Err(ConfigError::Missing) => {
                    println!("No API URL configured.");
                    println!("Config file: {} (not present)", path.display());
                    Ok(())
                }
                Err(error) => Err(error.into()),
            }
        }
    }
}
