//! Centralized path resolution for wpsite
//!
//! # Environment Variables
//!
//! - `WPSITE_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/wpsite`)
//! - `WPSITE_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `WPSITE_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/wpsite` (if set)
//! 3. `~/.config/wpsite`
//!
//! For state_dir():
//! 1. `WPSITE_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/wpsite` (if set)
//! 3. `~/.local/state/wpsite`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "WPSITE_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "WPSITE_STATE_DIR";

const APP_DIR: &str = "wpsite";

/// Get the wpsite config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(&env_lookup, dirs::home_dir().as_deref())
}

/// Get the wpsite state directory path
pub fn state_dir() -> Result<PathBuf> {
    resolve_state_dir(&env_lookup, dirs::home_dir().as_deref())
}

/// Default config file: `<config_dir>/config.toml`
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default state file: `<state_dir>/state.toml`
pub fn state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("state.toml"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn resolve_config_dir(env: &dyn Fn(&str) -> Option<String>, home: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = env(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Some(xdg_config) = env("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = home.context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

fn resolve_state_dir(env: &dyn Fn(&str) -> Option<String>, home: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = env(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Some(xdg_state) = env("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join(APP_DIR);
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    let home = home.context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join(APP_DIR);
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
