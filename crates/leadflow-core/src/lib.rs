// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadflow lead-qualification engine.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Leadflow workspace. The provider,
//! storage, and broadcast collaborators all implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LeadflowError;
pub use types::{AdapterType, HealthStatus, Lead, LeadId, Qualification, TurnOutcome};

// Re-export all adapter traits at crate root.
pub use traits::{
    BroadcastAdapter, PluginAdapter, ProviderAdapter, StorageAdapter, TokenFragment,
    TokenStream,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn leadflow_error_has_all_variants() {
        // Verify all 9 error variants exist and can be constructed.
        let _config = LeadflowError::Config("test".into());
        let _storage = LeadflowError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = LeadflowError::Provider {
            message: "test".into(),
            source: None,
        };
        let _broadcast = LeadflowError::Broadcast {
            message: "test".into(),
            source: None,
        };
        let _invalid = LeadflowError::InvalidLeadId("x".into());
        let _not_found = LeadflowError::LeadNotFound("x".into());
        let _missing = LeadflowError::MissingEmail;
        let _in_progress = LeadflowError::TurnInProgress("x".into());
        let _internal = LeadflowError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips() {
        for variant in [
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Broadcast,
        ] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compiles only if every adapter trait is accessible through the
        // public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_broadcast_adapter<T: BroadcastAdapter>() {}
    }
}
