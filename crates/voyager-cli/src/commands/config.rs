//! Config command implementation.
//!
//! Manages CLI configuration.

use anyhow::Result;
use voyager_ops::Config;

const KEYS: &[&str] = &[
    "endpoint",
    "with_credentials",
    "auth_token",
    "preset",
    "presets_path",
    "timeout_secs",
    "port",
];

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("Voyager CLI Configuration");
    println!("{:-<40}", "");

    for key in KEYS {
        let value = config.get(key).unwrap_or_else(|| "(not set)".to_string());
        println!("{:<20} {}", format!("{}:", key), value);
    }

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    config.set(key, value)?;

    if key == "auth_token" {
        println!("✅ Set auth_token");
        println!("⚠️  Tokens are not written to the config file. Use VOYAGER_AUTH_TOKEN instead.");
        return Ok(());
    }

    config.save()?;
    println!("Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, KEYS.join(", "));
    }

    let value = config.get(key).unwrap_or_else(|| "(not set)".to_string());
    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
