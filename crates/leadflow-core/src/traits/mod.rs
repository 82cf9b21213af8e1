// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.

pub mod adapter;
pub mod broadcast;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use broadcast::BroadcastAdapter;
pub use provider::{ProviderAdapter, TokenFragment, TokenStream};
pub use storage::StorageAdapter;
