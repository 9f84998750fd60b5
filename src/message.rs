//! Boundary types for the hosting message platform
//!
//! The platform's own message shapes stay opaque: the core only cares
//! whether an event carries one media item and what its text was.

use serde::{Deserialize, Serialize};

/// An inbound platform event, reduced to what the core consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel the event arrived on
    pub channel: String,

    /// Chat within the channel
    pub chat_id: String,

    /// Message text, if any
    pub text: Option<String>,

    /// URL of the single attached media item, if any
    pub media_url: Option<String>,
}

impl InboundMessage {
    /// Create an inbound message
    pub fn new(channel: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            text: None,
            media_url: None,
        }
    }

    /// Attach message text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach a media reference
    pub fn with_media(mut self, media_url: impl Into<String>) -> Self {
        self.media_url = Some(media_url.into());
        self
    }

    /// Whether the event carries a media item
    pub fn has_media(&self) -> bool {
        self.media_url.is_some()
    }
}
