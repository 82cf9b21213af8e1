// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and sane
//! token limits.

use crate::diagnostic::ConfigError;
use crate::model::LeadflowConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeadflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.agent.log_level
            ),
        });
    }

    if config.openai.model.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.model must not be empty".to_string(),
        });
    }

    if config.openai.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "openai.max_tokens must be at least 1".to_string(),
        });
    }

    if config.openai.api_base.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.api_base must not be empty".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate host looks like a valid IP or hostname.
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "gateway.host `{host}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.gateway.channel_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.channel_capacity must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LeadflowConfig;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&LeadflowConfig::default()).is_ok());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = LeadflowConfig::default();
        config.agent.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("log_level")));
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut config = LeadflowConfig::default();
        config.openai.max_tokens = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let mut config = LeadflowConfig::default();
        config.storage.database_path = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = LeadflowConfig::default();
        config.agent.log_level = "loud".into();
        config.openai.model = "".into();
        config.gateway.host = "".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
