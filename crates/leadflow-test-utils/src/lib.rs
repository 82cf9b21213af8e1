// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadflow integration tests.
//!
//! Mock adapters (provider, broadcast, failure-injecting storage) and a
//! full-pipeline harness over temp SQLite storage.

pub mod flaky_storage;
pub mod harness;
pub mod mock_broadcast;
pub mod mock_provider;

pub use flaky_storage::FlakyStorage;
pub use harness::TestHarness;
pub use mock_broadcast::{CapturingBroadcast, FailingBroadcast, PublishedRecord};
pub use mock_provider::{MockProvider, MockTurn};
