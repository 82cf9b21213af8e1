// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the token-stream source (the model backend).

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ChatMessage;

/// One incremental piece of model output text, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenFragment {
    pub text: String,
}

/// An in-flight token stream for a single turn, terminated by natural
/// stream end or an error item.
pub type TokenStream =
    Pin<Box<dyn Stream<Item = Result<TokenFragment, LeadflowError>> + Send>>;

/// Adapter for the generative model backend.
///
/// The model is opaque to the engine: given the conversation so far, it
/// yields a sequence of text fragments. Any embedded control markers ride
/// inside the fragment text and are the demultiplexer's business, not the
/// provider's.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Opens a token stream for the next reply given the full chat history.
    async fn stream_turn(
        &self,
        history: &[ChatMessage],
    ) -> Result<TokenStream, LeadflowError>;
}
