use std::fs;
use tracing::{debug, error, info};

use crate::types::server_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(&contents)?;

    info!("Configuration loaded successfully");
    debug!("Config: {:?}", config);

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.database.path.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "database path cannot be empty".into(),
        ));
    }

    if config.auth.token_ttl_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "token_ttl_minutes must be greater than 0".into(),
        ));
    }

    // The key path is resolved once at startup; an empty path would make the
    // key manager silently regenerate into the working directory every boot.
    if config.auth.key_path.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "key_path cannot be empty".into(),
        ));
    }

    Ok(())
}
