//! Ingestion pipeline: cooldown gating, media fetch, classification,
//! race-safe commit

mod classifier;
mod cooldown;
mod fetcher;
mod pipeline;

pub use classifier::{parse_verdict, HttpClassifier, MemeClassifier, Verdict, PLACEHOLDER_TAG};
pub use cooldown::CooldownGate;
pub use fetcher::{HttpFetcher, MediaFetcher};
pub use pipeline::{AttemptOutcome, IngestionPipeline};
