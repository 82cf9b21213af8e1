// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marker demultiplexer: separates the qualification control character from
//! user-visible text, one fragment at a time.
//!
//! The model appends a single marker as the absolute last character of its
//! final output fragment: `#` for a strong lead, `*` for a weak one. This
//! module assumes the marker only ever arrives at the end of a fragment; a
//! marker split across fragment boundaries or buried mid-prose is not
//! detected. That assumption is inherited from the upstream prompt contract
//! and is a known precision gap, kept for simplicity rather than papered
//! over with cross-fragment buffering.

use leadflow_core::TurnOutcome;

/// Marker character signalling a strong (hot) lead.
pub const STRONG_MARKER: char = '#';

/// Marker character signalling a weak lead.
pub const WEAK_MARKER: char = '*';

/// Splits one fragment into visible text and a qualification outcome.
///
/// Pure per-fragment transform: trailing whitespace is ignored when looking
/// for the marker, and exactly one trailing marker character is stripped.
/// Callers must suppress emission when the returned text is empty or
/// whitespace-only, while still recording the outcome.
pub fn split_marker(fragment: &str) -> (String, TurnOutcome) {
    let trimmed = fragment.trim_end();
    if let Some(rest) = trimmed.strip_suffix(STRONG_MARKER) {
        (rest.to_string(), TurnOutcome::Strong)
    } else if let Some(rest) = trimmed.strip_suffix(WEAK_MARKER) {
        (rest.to_string(), TurnOutcome::Weak)
    } else {
        (fragment.to_string(), TurnOutcome::None)
    }
}
