//! Command protocol: the marker grammar generators use to request meme
//! insertion, and the rewrite into text/media segments

mod marker;

pub use marker::{menu_prompt, MarkerParser, ParsedMarker, Segment, MARKER_TOKEN};
