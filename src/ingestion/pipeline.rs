//! Asynchronous ingestion pipeline
//!
//! One attempt per qualifying inbound media event, run on its own task
//! so the event-delivery path never blocks. An attempt moves through
//! cooldown admission → fetch → dedup → classification → commit, and any
//! failure along the way drops the attempt after a diagnostic: a flaky
//! network or classifier must never disturb the surrounding
//! conversation.

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::ingestion::classifier::{parse_verdict, MemeClassifier, Verdict};
use crate::ingestion::cooldown::CooldownGate;
use crate::ingestion::fetcher::MediaFetcher;
use crate::repository::{content_hash, MemeRecord, MemeSource, MemeStore};
use crate::settings::SettingsStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// How a single ingestion attempt ended
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// Dropped at the gate; the cooldown window was still open
    CoolingDown,
    /// Payload bytes are already in the store; classifier not consulted
    DuplicateContent,
    /// Classifier declined the item
    Rejected,
    /// A new record was committed
    Committed(MemeRecord),
}

/// Ingestion pipeline shared by all inbound media events
pub struct IngestionPipeline {
    store: Arc<MemeStore>,
    settings: Arc<SettingsStore>,
    gate: Arc<CooldownGate>,
    fetcher: Arc<dyn MediaFetcher>,
    classifier: Arc<dyn MemeClassifier>,
    fetch_timeout: Duration,
    classify_timeout: Duration,
}

impl IngestionPipeline {
    /// Wire a pipeline over its collaborators
    pub fn new(
        store: Arc<MemeStore>,
        settings: Arc<SettingsStore>,
        gate: Arc<CooldownGate>,
        fetcher: Arc<dyn MediaFetcher>,
        classifier: Arc<dyn MemeClassifier>,
        config: &IngestionConfig,
    ) -> Self {
        Self {
            store,
            settings,
            gate,
            fetcher,
            classifier,
            fetch_timeout: config.fetch_timeout(),
            classify_timeout: config.classify_timeout(),
        }
    }

    /// Run one attempt in the background; the caller returns immediately
    pub fn spawn_attempt(self: Arc<Self>, media_url: String, context_text: String) {
        let pipeline = self;
        tokio::spawn(async move {
            match pipeline.run_attempt(&media_url, &context_text).await {
                Ok(AttemptOutcome::Committed(record)) => {
                    tracing::info!(id = %record.id, tag = %record.tag, "Auto-collected meme");
                }
                Ok(outcome) => {
                    tracing::debug!(?outcome, url = %media_url, "Ingestion attempt ended without commit");
                }
                Err(e) => {
                    tracing::debug!(error = %e, url = %media_url, "Ingestion attempt dropped");
                }
            }
        });
    }

    /// Run one attempt to completion
    ///
    /// The cooldown window is claimed at admission, before anything that
    /// can fail, so repeated media floods cost at most one classifier
    /// call per window regardless of outcome.
    pub async fn run_attempt(
        &self,
        media_url: &str,
        context_text: &str,
    ) -> Result<AttemptOutcome> {
        let settings = self.settings.get().await;
        if !self.gate.try_acquire(settings.cooldown()) {
            return Ok(AttemptOutcome::CoolingDown);
        }

        let payload = timeout(self.fetch_timeout, self.fetcher.fetch(media_url))
            .await
            .map_err(|_| Error::Transient("media fetch timed out".to_string()))??;

        let hash = content_hash(&payload);
        if self.store.contains_hash(&hash).await {
            return Ok(AttemptOutcome::DuplicateContent);
        }

        let raw_verdict = timeout(
            self.classify_timeout,
            self.classifier.classify(&payload, context_text),
        )
        .await
        .map_err(|_| Error::Transient("classifier timed out".to_string()))??;

        match parse_verdict(&raw_verdict) {
            Verdict::Reject => Ok(AttemptOutcome::Rejected),
            Verdict::Accept { tag } => {
                let record = self
                    .store
                    .create(
                        &payload,
                        file_name_hint(media_url),
                        &tag,
                        MemeSource::Auto,
                    )
                    .await?;
                Ok(AttemptOutcome::Committed(record))
            }
        }
    }
}

/// Last path segment of the media URL, used only as an extension hint
fn file_name_hint(media_url: &str) -> Option<&str> {
    media_url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
}
