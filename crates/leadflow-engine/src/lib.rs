// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming turn pipeline for the Leadflow engine.
//!
//! A turn is one user-message-in, AI-reply-out cycle for a lead. The
//! pipeline consumes an incremental token stream from the provider,
//! demultiplexes qualification markers from user-visible text, accumulates
//! the full reply, persists the turn exactly once at finalize, and fans
//! chunk and completion events out to subscribers:
//!
//! - [`demux`]: strips trailing control markers from fragments
//! - [`accumulator`]: grows the full reply for one turn
//! - [`turn`]: the per-turn state machine with the exactly-once terminal event
//! - [`orchestrator`]: lead resolution, per-lead mutual exclusion, launch

pub mod accumulator;
pub mod demux;
pub mod orchestrator;
pub mod turn;

pub use accumulator::TurnAccumulator;
pub use demux::{split_marker, STRONG_MARKER, WEAK_MARKER};
pub use orchestrator::{TurnOrchestrator, TurnReceipt};
pub use turn::{TurnPhase, TurnRunner};
