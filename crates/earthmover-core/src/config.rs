//! Client configuration: where the backend lives.
//!
//! The API URL is resolved from, in order: an explicit flag, the
//! `EARTHMOVER_API_URL` environment variable, and the saved config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::normalize_base_url;

/// Environment variable consulted when no flag is given.
pub const API_URL_ENV: &str = "EARTHMOVER_API_URL";
/// Directory under the platform config root holding our files.
pub const CONFIG_DIR_NAME: &str = "earthmover";
/// File name of the saved configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API URL configured; pass --api-url, set EARTHMOVER_API_URL, or run 'earthmover config init'"
    )]
    Missing,
    #[error("Invalid API URL '{0}'; expected an http:// or https:// address")]
    InvalidUrl(String),
    #[error("Could not read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Could not encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Persisted client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
}

/// Where a resolved API URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag,
    Environment,
    File,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match self {
            Self::Flag => "command-line flag",
            Self::Environment => "environment",
            Self::File => "config file",
        };
        write!(f, "{origin}")
    }
}

/// Read the saved config. A missing file is not an error.
pub fn load_from_path(path: &Path) -> ConfigResult<Option<ClientConfig>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Persist the config atomically: write a temp file next to the target,
/// then rename over it.
pub fn save_to_path(path: &Path, config: &ClientConfig) -> ConfigResult<()> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    let temp = path.with_extension("json.tmp");
    fs::write(&temp, json).map_err(write_error)?;
    fs::rename(&temp, path).map_err(write_error)?;
    Ok(())
}

/// Resolve the API URL to use, preferring flag over environment over the
/// saved file. The winning value is validated and normalized.
pub fn resolve_api_url(
    flag: Option<&str>,
    env_value: Option<&str>,
    config_path: &Path,
) -> ConfigResult<(String, ConfigOrigin)> {
    if let Some(url) = flag {
        return Ok((validated(url)?, ConfigOrigin::Flag));
    }
    if let Some(url) = env_value {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            return Ok((validated(trimmed)?, ConfigOrigin::Environment));
        }
    }
    if let Some(config) = load_from_path(config_path)? {
        return Ok((validated(&config.api_url)?, ConfigOrigin::File));
    }
    Err(ConfigError::Missing)
}

fn validated(url: &str) -> ConfigResult<String> {
    normalize_base_url(url).map_err(|_| ConfigError::InvalidUrl(url.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("config.json")).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn save_creates_parents_and_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("earthmover").join("config.json");
        let config = ClientConfig {
            api_url: "https://api.example.com".to_string(),
        };

        save_to_path(&path, &config).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn corrupt_file_reports_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn flag_beats_environment_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        save_to_path(
            &path,
            &ClientConfig {
                api_url: "https://file.example.com".to_string(),
            },
        )
        .unwrap();

        let (url, origin) = resolve_api_url(
            Some("https://flag.example.com/"),
            Some("https://env.example.com"),
            &path,
        )
        .unwrap();
        assert_eq!(url, "https://flag.example.com");
        assert_eq!(origin, ConfigOrigin::Flag);
    }

    #[test]
    fn environment_beats_file_and_blank_env_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        save_to_path(
            &path,
            &ClientConfig {
                api_url: "https://file.example.com".to_string(),
            },
        )
        .unwrap();

        let (url, origin) =
            resolve_api_url(None, Some("https://env.example.com"), &path).unwrap();
        assert_eq!(url, "https://env.example.com");
        assert_eq!(origin, ConfigOrigin::Environment);

        let (url, origin) = resolve_api_url(None, Some("   "), &path).unwrap();
        assert_eq!(url, "https://file.example.com");
        assert_eq!(origin, ConfigOrigin::File);
    }

    #[test]
    fn nothing_configured_is_a_clear_error() {
        let dir = tempdir().unwrap();
        let result = resolve_api_url(None, None, &dir.path().join("config.json"));
        assert!(matches!(result, Err(ConfigError::Missing)));
    }

    #[test]
    fn invalid_urls_are_rejected_with_the_offending_value() {
        let dir = tempdir().unwrap();
        let result = resolve_api_url(Some("ftp://api.example.com"), None, &dir.path().join("c"));
        match result {
            Err(ConfigError::InvalidUrl(url)) => assert_eq!(url, "ftp://api.example.com"),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }
}
