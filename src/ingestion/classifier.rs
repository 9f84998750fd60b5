//! External classifier boundary and verdict parsing
//!
//! The classifier is a black box: image bytes plus the surrounding chat
//! text go in, a free-text verdict comes out. The expected shape is
//!
//! ```text
//! NO
//! ```
//!
//! to reject, or
//!
//! ```text
//! YES
//! <label>:<usage>
//! ```
//!
//! to accept with a tag description. Anything else is tolerated: an
//! acceptance with a broken tag line still commits, under a placeholder
//! tag, because the acceptance signal itself is unambiguous.

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Token opening an acceptance verdict
const ACCEPT_TOKEN: &str = "YES";

/// Tag used when an accepted verdict carries no usable tag line
pub const PLACEHOLDER_TAG: &str = "uncategorized:no usage notes";

/// Parsed classifier verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the item under the given tag
    Accept { tag: String },
    /// Not worth keeping
    Reject,
}

/// Parse a raw classifier reply into a verdict
///
/// Only a reply opening with the acceptance token accepts; everything
/// else (`NO`, empty lines, unrelated chatter) rejects. A malformed or
/// missing tag line degrades to [`PLACEHOLDER_TAG`] instead of dropping
/// the acceptance.
pub fn parse_verdict(raw: &str) -> Verdict {
    let trimmed = raw.trim();
    if !trimmed.starts_with(ACCEPT_TOKEN) {
        return Verdict::Reject;
    }

    let tag_line = trimmed
        .lines()
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty());

    let tag = match tag_line {
        Some(line) if line.contains(':') => line.to_string(),
        _ => PLACEHOLDER_TAG.to_string(),
    };

    Verdict::Accept { tag }
}

/// Black-box classifier: image bytes + context text → raw verdict text
#[async_trait]
pub trait MemeClassifier: Send + Sync {
    async fn classify(&self, image: &[u8], context_text: &str) -> Result<String>;
}

/// Classifier backed by an OpenAI-style vision chat endpoint
pub struct HttpClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    /// Create a classifier against the configured endpoint
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Instruction sent alongside the image
    fn build_prompt(context_text: &str) -> String {
        format!(
            "Look at this image. The message accompanying it was: \"{}\". \
             If the image would work as a reaction meme, reply with the single \
             word YES on the first line, then one line of the form label:usage \
             describing it (for example: confused cat:react to baffling statements). \
             Otherwise reply NO.",
            context_text
        )
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl MemeClassifier for HttpClassifier {
    async fn classify(&self, image: &[u8], context_text: &str) -> Result<String> {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": Self::build_prompt(context_text) },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/jpeg;base64,{}", encoded) }
                    }
                ]
            }],
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Transient(format!(
                "classifier returned status {}",
                response.status()
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(Error::Verdict("empty classifier reply".to_string()));
        }

        Ok(content)
    }
}
