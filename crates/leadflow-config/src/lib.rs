// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Leadflow engine.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and Elm-style diagnostic error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use leadflow_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Agent name: {}", config.agent.name);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LeadflowConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to rich miette diagnostics with typo suggestions
///
/// Returns either a valid `LeadflowConfig` or a list of diagnostic errors.
pub fn load_and_validate() -> Result<LeadflowConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information.
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<LeadflowConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read the content of every TOML file in the lookup hierarchy that exists.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/leadflow/leadflow.toml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("leadflow/leadflow.toml"));
    }
    candidates.push(std::path::PathBuf::from("leadflow.toml"));

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_inline_config_loads() {
        let config = load_and_validate_str(
            r#"
            [agent]
            name = "smarttech"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.name, "smarttech");
        assert_eq!(config.agent.log_level, "debug");
    }

    #[test]
    fn invalid_log_level_surfaces_validation_error() {
        let errors = load_and_validate_str(
            r#"
            [agent]
            log_level = "shouty"
            "#,
        )
        .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("log_level")));
    }

    #[test]
    fn unknown_key_gets_a_suggestion() {
        let errors = load_and_validate_str(
            r#"
            [openai]
            modle = "gpt-4.1-mini"
            "#,
        )
        .unwrap_err();
        assert!(!errors.is_empty());
        let rendered = errors[0].to_string();
        assert!(rendered.contains("modle"));
    }
}
