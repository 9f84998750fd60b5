//! Gateway: service wiring and the meme administration API

mod handler;
mod service;

pub use handler::{memes_router, MemesState};
pub use service::MemeGateway;
