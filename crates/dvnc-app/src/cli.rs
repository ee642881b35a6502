//! CLI argument definitions for the dvnc binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use dvnc_core::config::DvncConfig;
use dvnc_core::types::ResolutionMode;

/// DVNC.AI, a keyword-driven chat companion for the terminal.
#[derive(Parser, Debug)]
#[command(name = "dvnc", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Remote chat endpoint. Switches resolution to remote mode.
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// TOML keyword catalog replacing the built-in one.
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DVNC_CONFIG env var > ~/.dvnc/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        pick_config_path(self.config.clone(), std::env::var("DVNC_CONFIG").ok())
    }

    /// Resolve the remote endpoint override.
    ///
    /// Priority: --endpoint flag > DVNC_ENDPOINT env var. `None` keeps the
    /// config file's resolver settings.
    pub fn resolve_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| std::env::var("DVNC_ENDPOINT").ok())
            .filter(|e| !e.trim().is_empty())
    }

    /// Resolve the log level. Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Apply flag overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut DvncConfig) {
        apply_endpoint(config, self.resolve_endpoint());
        if let Some(ref path) = self.catalog {
            config.catalog.path = Some(path.clone());
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn pick_config_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(p) = flag {
        return p;
    }
    if let Some(p) = env {
        return PathBuf::from(p);
    }
    default_config_path()
}

fn apply_endpoint(config: &mut DvncConfig, endpoint: Option<String>) {
    if let Some(endpoint) = endpoint {
        config.resolver.mode = ResolutionMode::Remote;
        config.resolver.endpoint = Some(endpoint);
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".dvnc").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".dvnc").join("config.toml");
    }
    PathBuf::from("config.toml")
}
