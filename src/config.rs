//! Shell configuration
//!
//! Loads [`ShellConfig`] from YAML. Path resolution order for [`ShellConfig::from_env`]:
//! 1. `CLASS_SHELL_CONFIG` environment variable (explicit override)
//! 2. `class_shell.yaml` in the working directory
//! 3. Built-in defaults

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const CONFIG_ENV: &str = "CLASS_SHELL_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "class_shell.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Appended to the session breadcrumb
    pub prompt_marker: String,
    /// Joins parent session names in the prompt
    pub path_separator: String,
    /// Print the usage banner when an interactive session starts
    pub banner: bool,
    /// Colour errors, comments and the status hint
    pub color: bool,
    /// Persist accepted lines here
    pub history_file: Option<PathBuf>,
    /// `EnvFilter` directives; `RUST_LOG` wins when set
    pub log_filter: String,
    /// Log to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt_marker: "> ".to_string(),
            path_separator: "/".to_string(),
            banner: true,
            color: true,
            history_file: None,
            log_filter: "warn".to_string(),
            log_file: None,
        }
    }
}

impl ShellConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse shell config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shell config {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid shell config {}", path.display()))?;
        info!(path = %path.display(), "loaded shell config");
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).is_file() {
            return Self::load(DEFAULT_CONFIG_FILE);
        }
        Ok(Self::default())
    }
}

/// Install the global tracing subscriber for a binary
pub fn init_tracing(config: &ShellConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ShellConfig::from_yaml("banner: false\nhistory_file: .history\n").unwrap();
        assert!(!config.banner);
        assert_eq!(config.history_file, Some(PathBuf::from(".history")));
        assert_eq!(config.prompt_marker, "> ");
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "path_separator: '\\'\ncolor: false").unwrap();
        let config = ShellConfig::load(file.path()).unwrap();
        assert_eq!(config.path_separator, "\\");
        assert!(!config.color);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(ShellConfig::from_yaml("banner: [not, a, bool]").is_err());
        assert!(ShellConfig::load("/definitely/not/here.yaml").is_err());
    }
}
