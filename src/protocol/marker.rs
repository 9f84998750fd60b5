//! Marker grammar embedded in generated free text
//!
//! The generator asks for a meme by writing a single directive line
//! inside otherwise unstructured output:
//!
//! ```text
//! haha that reminds me of something
//! SEND_MEME: confused cat
//! anyway, as I was saying
//! ```
//!
//! Everything before the token is spoken text, the remainder of the
//! token's line names the wanted meme, and everything after that line
//! break is spoken text again. The token itself must never reach the
//! platform, whatever shape the generator produced.

use crate::repository::MemeRecord;
use crate::retrieval::RetrievalEngine;
use regex::Regex;

/// Token a generator embeds to request meme insertion
pub const MARKER_TOKEN: &str = "SEND_MEME";

/// Characters accidentally wrapped around the descriptor by some
/// generators
const DESCRIPTOR_WRAPPERS: &[char] = &['[', ']', '(', ')', '{', '}', '"', '\'', '`'];

/// One piece of a rewritten reply
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Spoken text, free of protocol syntax
    Text(String),
    /// A resolved meme to insert at this position
    Media(MemeRecord),
}

/// Split of a marker-bearing text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarker {
    /// Spoken text before the token
    pub pre: String,
    /// Cleaned request descriptor from the token's line
    pub descriptor: String,
    /// Spoken text after the token's line
    pub post: String,
}

/// Parses the marker grammar and rewrites generator output into
/// segments
pub struct MarkerParser {
    pattern: Regex,
}

impl MarkerParser {
    /// Compile the marker pattern
    pub fn new() -> Self {
        let pattern = Regex::new(&format!(
            r"(?s)^(?P<pre>.*?){}\s*:(?P<desc>[^\n]*)(?:\n(?P<post>.*))?$",
            MARKER_TOKEN
        ))
        .expect("marker pattern is valid");
        Self { pattern }
    }

    /// Split text at the first marker, if any
    pub fn parse(&self, text: &str) -> Option<ParsedMarker> {
        let captures = self.pattern.captures(text)?;

        let descriptor = captures
            .name("desc")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .trim()
            .trim_matches(DESCRIPTOR_WRAPPERS)
            .trim()
            .to_string();

        Some(ParsedMarker {
            pre: captures
                .name("pre")
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim_end()
                .to_string(),
            descriptor,
            post: captures
                .name("post")
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim()
                .to_string(),
        })
    }

    /// Drop any stray marker syntax from spoken text
    ///
    /// A repeated or malformed directive is cut from the token to the
    /// end of its line; lines left empty disappear.
    pub fn scrub(&self, text: &str) -> String {
        if !text.contains(MARKER_TOKEN) {
            return text.to_string();
        }
        text.lines()
            .filter_map(|line| {
                let kept = match line.find(MARKER_TOKEN) {
                    Some(at) => line[..at].trim_end(),
                    None => line,
                };
                if kept.is_empty() && line.contains(MARKER_TOKEN) {
                    None
                } else {
                    Some(kept)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Rewrite generator output into an ordered segment sequence
    ///
    /// Text without the token passes through unchanged. With a token,
    /// the descriptor is resolved fuzzily; an unresolved descriptor
    /// degrades to text-only output. No segment ever carries the token.
    pub async fn compose(&self, text: &str, engine: &RetrievalEngine) -> Vec<Segment> {
        let parsed = match self.parse(text) {
            Some(parsed) => parsed,
            None => {
                // Partial marker (token without a descriptor line) still
                // must not leak
                let scrubbed = self.scrub(text);
                if scrubbed.is_empty() {
                    return Vec::new();
                }
                return vec![Segment::Text(scrubbed)];
            }
        };

        let mut segments = Vec::new();
        if !parsed.pre.is_empty() {
            segments.push(Segment::Text(self.scrub(&parsed.pre)));
        }
        if !parsed.descriptor.is_empty() {
            if let Some(record) = engine.match_fuzzy(&parsed.descriptor).await {
                segments.push(Segment::Media(record));
            }
        }
        let post = self.scrub(&parsed.post);
        if !post.is_empty() {
            segments.push(Segment::Text(post));
        }
        segments
    }
}

impl Default for MarkerParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the menu hint handed to the generator: the sampled tag list
/// plus the one line explaining how to use the marker
pub fn menu_prompt(descriptions: &[String]) -> String {
    let mut prompt = String::from(
        "You have a meme library. To attach one meme to your reply, add a \
         line of the form `",
    );
    prompt.push_str(MARKER_TOKEN);
    prompt.push_str(
        ": <description>` naming one of the memes below; the line will be \
         replaced by the image. At most one per reply.\nAvailable memes:\n",
    );
    for description in descriptions {
        prompt.push_str("- ");
        prompt.push_str(description);
        prompt.push('\n');
    }
    prompt
}
