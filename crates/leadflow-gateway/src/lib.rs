// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Leadflow engine.
//!
//! The gateway is the I/O boundary around the turn pipeline: it accepts
//! conversation turns over REST, exposes the admin lead listing, and
//! bridges WebSocket subscribers onto the broadcast hub. It holds no
//! pipeline logic of its own; everything after the synchronous phase of a
//! turn reaches clients through the hub.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
