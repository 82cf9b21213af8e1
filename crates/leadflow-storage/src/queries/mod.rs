// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the single-writer database handle.

pub mod leads;
pub mod messages;
