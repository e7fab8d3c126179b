//! Configuration loading, env substitution and validation.
//!
//! Config files: `ferry.toml`, `ferry.yaml`, `ferry.yml` or `ferry.json`,
//! searched in `./` then the user config directory. CLI flags and their
//! environment variables override file values.
//!
//! Supports `${ENV_VAR}` substitution in the raw file text.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{ConfigError, Result},
    loader::{config_dir, discover_and_load, find_config_file, load, load_config},
    schema::{FerryConfig, HealthConfig, Overrides, ReactionsConfig, SupervisorSettings},
    validate::{ValidatedConfig, validate},
};
