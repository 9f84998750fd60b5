//! MemeVault - Meme curation and retrieval gateway
//!
//! MemeVault curates a growing library of tagged reaction memes for a
//! conversational agent: it decides which incoming images are worth
//! keeping, stores them deduplicated, and lets the agent pull one back
//! into its replies through a small embedded directive.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Hosting platform                         │
//! │   inbound events                         outbound segments   │
//! └───────┬──────────────────────────────────────────▲───────────┘
//!         │                                          │
//! ┌───────▼──────────────────────────────────────────┴───────────┐
//! │                       MemeGateway                            │
//! │                                                              │
//! │  media event            text generation                      │
//! │       │                       │                              │
//! │  ┌────▼────────────┐     ┌────▼─────────────┐                │
//! │  │ IngestionPipeline│     │ CommandProtocol │                │
//! │  │  cooldown gate   │     │  menu hint      │                │
//! │  │  fetch + dedup   │     │  marker rewrite │                │
//! │  │  classifier call │     └────┬────────────┘                │
//! │  └────┬────────────┘          │                              │
//! │       │ commit           ┌────▼────────────┐                 │
//! │       │                  │ RetrievalEngine │                 │
//! │       │                  │  exact / fuzzy  │                 │
//! │       │                  │  menu sampling  │                 │
//! │  ┌────▼──────────────────┴─────────────────┐                 │
//! │  │                MemeStore                │                 │
//! │  │   JSON index + payload files, dedup     │                 │
//! │  └─────────────────────────────────────────┘                 │
//! │                                                              │
//! │  axum admin API: upload / delete / tag / settings            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`repository`]: content-addressed record store with atomic JSON
//!   index persistence
//! - [`retrieval`]: exact and fuzzy tag matching, menu sampling
//! - [`ingestion`]: cooldown-gated classification pipeline
//! - [`protocol`]: marker grammar and reply rewriting
//! - [`settings`]: runtime-tunable knobs with their admin endpoints
//! - [`gateway`]: service wiring and the meme administration API
//! - [`config`]: startup configuration

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ingestion;
pub mod message;
pub mod protocol;
pub mod repository;
pub mod retrieval;
pub mod settings;

pub use config::MemeVaultConfig;
pub use error::{Error, Result};
