//! Content-addressed meme repository
//!
//! Owns the persisted record set and the binary payloads behind it,
//! enforcing hash-based dedup and atomic index persistence.

mod store;
mod types;

pub use store::{BatchDeleteOutcome, MemeStore};
pub use types::{content_hash, MemeRecord, MemeSource};
