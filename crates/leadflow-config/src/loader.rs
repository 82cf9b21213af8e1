// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./leadflow.toml` > `~/.config/leadflow/leadflow.toml`
//! > `/etc/leadflow/leadflow.toml` with environment variable overrides via the
//! `LEADFLOW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LeadflowConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/leadflow/leadflow.toml` (system-wide)
/// 3. `~/.config/leadflow/leadflow.toml` (user XDG config)
/// 4. `./leadflow.toml` (local directory)
/// 5. `LEADFLOW_*` environment variables
pub fn load_config() -> Result<LeadflowConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LeadflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LeadflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::file("/etc/leadflow/leadflow.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("leadflow/leadflow.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("leadflow.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `LEADFLOW_OPENAI_API_KEY` must map to
/// `openai.api_key`, not `openai.api.key`.
fn env_provider() -> Env {
    Env::prefixed("LEADFLOW_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: LEADFLOW_OPENAI_API_KEY -> "openai_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_values_over_defaults() {
        let config = load_config_from_str(
            r#"
            [agent]
            name = "smarttech"

            [gateway]
            port = 9090
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.name, "smarttech");
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.storage.database_path, "leadflow.db");
    }

    #[test]
    fn load_from_str_rejects_unknown_section_keys() {
        let result = load_config_from_str(
            r#"
            [storage]
            databse_path = "oops.db"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "leadflow");
        assert_eq!(config.openai.max_tokens, 1024);
    }
}
