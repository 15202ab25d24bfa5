use super::types::*;
use crate::config::{expand_env_vars, expand_tilde};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let (config, _) = load_config_with_yaml(path)?;
    Ok(config)
}

/// Load config and return both the parsed config and the original YAML string
pub fn load_config_with_yaml(path: &Path) -> Result<(Config, String), ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // Expand environment variables in the YAML string before parsing
    let yaml_string = expand_env_vars(&yaml_string);

    let mut config: Config = serde_yaml::from_str(&yaml_string).map_err(|e| {
        // Wrap error with file context
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })?;

    config.player.events_path = expand_tilde(&config.player.events_path);

    validate_config(&config)?;

    Ok((config, yaml_string))
}

/// Validate a parsed config, collecting every violation into one error
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.event.end_time <= config.event.start_time {
        errors.push(format!(
            "event.end_time ({}) must be after event.start_time ({})",
            config.event.end_time, config.event.start_time
        ));
    }

    if config.telemetry.batch_size == 0 {
        errors.push("telemetry.batch_size must be at least 1".to_string());
    }

    if config.telemetry.retry.max_attempts == 0 {
        errors.push("telemetry.retry.max_attempts must be at least 1".to_string());
    }

    if config.telemetry.retry.max_queued_batches == 0 {
        errors.push("telemetry.retry.max_queued_batches must be at least 1".to_string());
    }

    if let Err(e) = config.telemetry.endpoint.parse::<reqwest::Url>() {
        errors.push(format!(
            "telemetry.endpoint '{}' is not a valid URL: {}",
            config.telemetry.endpoint, e
        ));
    }

    if let Some(endpoint) = &config.identity.profile_endpoint {
        if let Err(e) = endpoint.parse::<reqwest::Url>() {
            errors.push(format!(
                "identity.profile_endpoint '{}' is not a valid URL: {}",
                endpoint, e
            ));
        }
    }

    match config.identity.mode {
        IdentityMode::Hosted => {
            for (field, value) in [
                ("authority", &config.identity.authority),
                ("client_id", &config.identity.client_id),
                ("redirect_uri", &config.identity.redirect_uri),
            ] {
                if value.as_deref().map_or(true, str::is_empty) {
                    errors.push(format!("identity.{} is required in hosted mode", field));
                }
            }
        }
        IdentityMode::Dev => {
            if config.identity.dev_user.is_none() {
                errors.push("identity.dev_user is required in dev mode".to_string());
            }
        }
    }

    if config.player.events_path.as_os_str().is_empty() {
        errors.push("player.events_path must not be empty".to_string());
    }

    if config.registration.unit_price == 0 {
        errors.push("registration.unit_price must be at least 1".to_string());
    }

    if config.stub.listen.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!(
            "stub.listen '{}' is not a valid socket address",
            config.stub.listen
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
