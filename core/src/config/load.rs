use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

/// Get the default jobq data directory: ~/.jobq
pub fn get_jobq_data_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".jobq"))
}

/// Loads configuration with this priority:
/// an explicit path, then `~/.jobq/config.toml`, then `./config.toml`, then defaults.
/// Environment overrides are applied last.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let jobq_dir = get_jobq_data_dir()?;
    let user_config = jobq_dir.join("config.toml");
    let local_config = Path::new("config.toml");

    let mut cfg = if let Some(path) = explicit {
        read_config(path)?
    } else if user_config.exists() {
        read_config(&user_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg
        .logging
        .directory
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        cfg.logging.directory = Some(jobq_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str::<AppConfig>(s)
}

/// Applies `JOBQ_THREADS`, `JOBQ_WORKDIR`, `JOBQ_VERBOSE` and `JOBQ_DEBUG`.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("JOBQ_THREADS") {
        cfg.dispatcher.concurrency = v
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidEnv {
                key: "JOBQ_THREADS",
                value: v.clone(),
            })?;
    }
    if let Some(v) = get("JOBQ_WORKDIR") {
        cfg.workdir = v;
    }
    if let Some(v) = get("JOBQ_VERBOSE") {
        cfg.verbose = parse_bool("JOBQ_VERBOSE", &v)?;
    }
    if let Some(v) = get("JOBQ_DEBUG") {
        cfg.debug = parse_bool("JOBQ_DEBUG", &v)?;
    }

    if cfg.debug {
        cfg.logging.level = "debug".to_string();
    }
    Ok(())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}
