// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for OpenAI Chat Completions streaming responses.
//!
//! OpenAI emits data-only SSE events: each event is `data: {json}` with a
//! final `data: [DONE]` sentinel. Converts a reqwest response byte stream
//! into typed [`StreamEvent`] variants using the `eventsource-stream` crate
//! for SSE protocol compliance.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use leadflow_core::LeadflowError;

use crate::types::ChatCompletionChunk;

/// Typed events from the OpenAI streaming protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant text.
    Delta(String),
    /// The `[DONE]` sentinel: the completion is finished.
    Done,
}

/// Parses a reqwest streaming response into a stream of typed [`StreamEvent`]s.
///
/// Chunks without text content (role preludes, finish_reason-only chunks)
/// are skipped; malformed JSON surfaces as a provider error item.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LeadflowError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                if event.data.trim() == "[DONE]" {
                    return Some(Ok(StreamEvent::Done));
                }
                match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                    Ok(chunk) => chunk
                        .choices
                        .first()
                        .and_then(|choice| choice.delta.content.clone())
                        .filter(|text| !text.is_empty())
                        .map(|text| Ok(StreamEvent::Delta(text))),
                    Err(e) => Some(Err(LeadflowError::Provider {
                        message: format!("failed to parse completion chunk: {e}"),
                        source: Some(Box::new(e)),
                    })),
                }
            }
            Err(e) => Some(Err(LeadflowError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}
