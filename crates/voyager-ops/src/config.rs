//! Configuration for the operations layer.
//!
//! Precedence, lowest to highest: defaults, the JSON config file, `.env`,
//! process environment. Callers apply CLI flags on top.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

/// Parameters read once at startup to decide how the first schema arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapParams {
    /// GraphQL endpoint to introspect.
    pub endpoint: Option<String>,
    /// Send credentials with the introspection request.
    pub with_credentials: bool,
    /// Preset to apply without showing the chooser.
    pub preset: Option<String>,
}

/// Configuration for voyager operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GraphQL endpoint to introspect at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Attach credentials to introspection requests.
    #[serde(default)]
    pub with_credentials: bool,

    /// Bearer token sent when credentials are enabled.
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,

    /// Preset applied at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Presets file (name -> introspection) or directory of `*.json` files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presets_path: Option<PathBuf>,

    /// Introspection request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Port for `voyager serve`.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    4300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            with_credentials: false,
            auth_token: None,
            preset: None,
            presets_path: None,
            timeout_secs: default_timeout_secs(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from disk with environment overrides.
    pub fn load() -> OpsResult<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                serde_json::from_str(&contents)?
            }
            _ => Self::default(),
        };

        config.with_env_overrides()
    }

    /// Apply `VOYAGER_*` environment variables.
    pub fn with_env_overrides(self) -> OpsResult<Self> {
        let mut config = self;

        if let Ok(url) = std::env::var("VOYAGER_URL") {
            config.endpoint = Some(url);
        }
        if let Ok(flag) = std::env::var("VOYAGER_WITH_CREDENTIALS") {
            config.with_credentials = parse_flag(&flag)?;
        }
        if let Ok(token) = std::env::var("VOYAGER_AUTH_TOKEN") {
            config.auth_token = Some(token);
        }
        if let Ok(preset) = std::env::var("VOYAGER_PRESET") {
            config.preset = Some(preset);
        }
        if let Ok(path) = std::env::var("VOYAGER_PRESETS") {
            config.presets_path = Some(PathBuf::from(path));
        }
        if let Ok(timeout) = std::env::var("VOYAGER_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| OpsError::Configuration(format!("Invalid number: {}", timeout)))?;
        }

        Ok(config)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> OpsResult<()> {
        if let Some(path) = Self::config_file_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&path, contents)?;
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "voyager", "voyager")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Startup parameters derived from this configuration.
    pub fn bootstrap_params(&self) -> BootstrapParams {
        BootstrapParams {
            endpoint: self.endpoint.clone(),
            with_credentials: self.with_credentials,
            preset: self.preset.clone(),
        }
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "endpoint" => self.endpoint.clone(),
            "with_credentials" => Some(self.with_credentials.to_string()),
            "auth_token" => self.auth_token.as_ref().map(|_| "***".to_string()),
            "preset" => self.preset.clone(),
            "presets_path" => self.presets_path.as_ref().map(|p| p.display().to_string()),
            "timeout_secs" => Some(self.timeout_secs.to_string()),
            "port" => Some(self.port.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> OpsResult<()> {
        match key {
            "endpoint" => self.endpoint = Some(value.to_string()),
            "with_credentials" => self.with_credentials = parse_flag(value)?,
            "auth_token" => self.auth_token = Some(value.to_string()),
            "preset" => self.preset = Some(value.to_string()),
            "presets_path" => self.presets_path = Some(PathBuf::from(value)),
            "timeout_secs" => {
                self.timeout_secs = value
                    .parse()
                    .map_err(|_| OpsError::Configuration(format!("Invalid number: {}", value)))?;
            }
            "port" => {
                self.port = value
                    .parse()
                    .map_err(|_| OpsError::Configuration(format!("Invalid port: {}", value)))?;
            }
            _ => {
                return Err(OpsError::Configuration(format!(
                    "Unknown config key: {}",
                    key
                )));
            }
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> OpsResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(OpsError::Configuration(format!(
            "Invalid boolean: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.bootstrap_params(), BootstrapParams::default());
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut config = Config::default();
        config.set("endpoint", "https://api.example.com/graphql").unwrap();
        config.set("with_credentials", "true").unwrap();
        config.set("auth_token", "secret").unwrap();

        assert_eq!(
            config.get("endpoint").as_deref(),
            Some("https://api.example.com/graphql")
        );
        assert_eq!(config.get("with_credentials").as_deref(), Some("true"));
        assert_eq!(config.get("auth_token").as_deref(), Some("***"));

        let params = config.bootstrap_params();
        assert!(params.with_credentials);
        assert_eq!(params.endpoint.as_deref(), Some("https://api.example.com/graphql"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("timeout_secs", "soon").is_err());
        assert!(config.set("with_credentials", "maybe").is_err());
        assert!(config.set("color", "blue").is_err());
    }

    #[test]
    fn test_token_never_serialized() {
        let config = Config {
            auth_token: Some("secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
