use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::{substitute_env, substitute_env_with},
    error::{ConfigError, Result},
    schema::{FerryConfig, Overrides},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["ferry.toml", "ferry.yaml", "ferry.yml", "ferry.json"];

/// Load config from the given path (any supported format), expanding
/// `${ENV_VAR}` placeholders from the process environment.
pub fn load_config(path: &Path) -> Result<FerryConfig> {
    let raw = read(path)?;
    parse_config(&substitute_env(&raw), path)
}

/// Like [`load_config`] with an explicit variable lookup.
pub fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FerryConfig> {
    let raw = read(path)?;
    parse_config(&substitute_env_with(&raw, lookup), path)
}

/// Returns the user-global config directory (`~/.config/ferry/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ferry").map(|d| d.config_dir().to_path_buf())
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./ferry.{toml,yaml,yml,json}`
/// 2. `<config dir>/ferry.{toml,yaml,yml,json}`
pub fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(config_dir());
    find_in(&dirs)
}

fn find_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Discover and load config from standard locations.
///
/// Returns `FerryConfig::default()` if no config file is found. A file that
/// exists but cannot be read or parsed is an error.
pub fn discover_and_load() -> Result<FerryConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(FerryConfig::default())
        },
    }
}

/// Build the effective configuration: defaults, then the config file
/// (explicit `path` or discovered), then `overrides`.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<FerryConfig> {
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => discover_and_load()?,
    };
    config.apply_overrides(overrides);
    Ok(config)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_config(raw: &str, path: &Path) -> Result<FerryConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| ConfigError::parse(path, e)),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
