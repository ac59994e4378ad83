use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cli: CliConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CliConfig {
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Name of an environment variable holding a session token.
    #[serde(default)]
    pub session_env: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            session_env: None,
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("op")
}

impl CliConfig {
    /// Session token read from `session_env`, if configured and non-empty.
    pub fn session_token(&self) -> Option<String> {
        let var = self.session_env.as_deref()?;
        std::env::var(var).ok().filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configuration used when no file is present: `op` from `PATH`, no session.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.cli.binary.as_os_str().is_empty() {
        anyhow::bail!("cli.binary must not be empty");
    }

    if let Some(var) = &config.cli.session_env {
        if var.is_empty() || var.contains('=') {
            anyhow::bail!("cli.session_env must be a valid environment variable name");
        }
    }

    match config.logging.level.to_ascii_lowercase().as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => {}
        other => anyhow::bail!(
            "Unknown logging level: '{}'. Must be error, warn, info, debug, or trace.",
            other
        ),
    }

    Ok(config)
}
