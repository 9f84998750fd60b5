//! Gateway service wiring
//!
//! `MemeGateway` owns the repository, the retrieval engine, the
//! ingestion pipeline, and the marker parser, and exposes the three
//! entry points the hosting platform calls: inbound event handling,
//! menu context for the generator, and reply composition.

use crate::config::MemeVaultConfig;
use crate::error::Result;
use crate::ingestion::{
    CooldownGate, HttpClassifier, HttpFetcher, IngestionPipeline, MediaFetcher, MemeClassifier,
};
use crate::message::InboundMessage;
use crate::protocol::{menu_prompt, MarkerParser, Segment};
use crate::repository::{MemeRecord, MemeStore};
use crate::retrieval::RetrievalEngine;
use crate::settings::SettingsStore;
use rand::Rng;
use std::sync::Arc;

/// MemeVault gateway service
pub struct MemeGateway {
    store: Arc<MemeStore>,
    settings: Arc<SettingsStore>,
    retrieval: RetrievalEngine,
    pipeline: Arc<IngestionPipeline>,
    parser: MarkerParser,
}

impl MemeGateway {
    /// Build the gateway with HTTP-backed fetcher and classifier
    pub async fn new(config: &MemeVaultConfig) -> Result<Self> {
        let fetcher: Arc<dyn MediaFetcher> = Arc::new(HttpFetcher::new());
        let classifier: Arc<dyn MemeClassifier> =
            Arc::new(HttpClassifier::new(config.classifier.clone()));
        Self::with_components(config, fetcher, classifier).await
    }

    /// Build the gateway over explicit fetcher/classifier
    /// implementations
    pub async fn with_components(
        config: &MemeVaultConfig,
        fetcher: Arc<dyn MediaFetcher>,
        classifier: Arc<dyn MemeClassifier>,
    ) -> Result<Self> {
        let base_dir = config.storage.base_dir.clone();
        let store = Arc::new(MemeStore::new(base_dir.clone()).await?);
        let settings = Arc::new(SettingsStore::new(base_dir).await?);

        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            settings.clone(),
            Arc::new(CooldownGate::new()),
            fetcher,
            classifier,
            &config.ingestion,
        ));

        Ok(Self {
            retrieval: RetrievalEngine::new(store.clone()),
            store,
            settings,
            pipeline,
            parser: MarkerParser::new(),
        })
    }

    /// Shared handle to the repository
    pub fn store(&self) -> Arc<MemeStore> {
        self.store.clone()
    }

    /// Shared handle to the runtime settings
    pub fn settings(&self) -> Arc<SettingsStore> {
        self.settings.clone()
    }

    /// The retrieval engine
    pub fn retrieval(&self) -> &RetrievalEngine {
        &self.retrieval
    }

    /// Feed an inbound platform event into the gateway
    ///
    /// Media-bearing events start an ingestion attempt in the
    /// background; the call itself never blocks on fetch or
    /// classification.
    pub fn handle_inbound(&self, message: &InboundMessage) {
        let Some(media_url) = &message.media_url else {
            return;
        };
        let context_text = message.text.clone().unwrap_or_default();
        self.pipeline
            .clone()
            .spawn_attempt(media_url.clone(), context_text);
    }

    /// Menu hint for the generator, or `None` when this reply should
    /// not offer memes
    ///
    /// The reply probability gates the hint as a whole; an empty
    /// library also yields `None`.
    pub async fn menu_context(&self) -> Option<String> {
        let settings = self.settings.get().await;

        let roll = rand::thread_rng().gen_range(0..100u8);
        if roll >= settings.reply_probability {
            return None;
        }

        let menu = self.retrieval.sample_menu(settings.menu_sample_cap).await;
        if menu.is_empty() {
            return None;
        }
        Some(menu_prompt(&menu))
    }

    /// Rewrite generator output into platform-ready segments
    pub async fn compose_reply(&self, generated_text: &str) -> Vec<Segment> {
        self.parser.compose(generated_text, &self.retrieval).await
    }

    /// Serve an explicit "send me a meme" request
    ///
    /// Keyword requests match literally against the tags; an empty
    /// keyword draws from the whole library.
    pub async fn pick_meme(&self, keyword: &str) -> Option<MemeRecord> {
        self.retrieval.match_exact(keyword).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::repository::MemeSource;
    use crate::settings::SettingsPatch;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StaticFetcher;

    #[async_trait]
    impl MediaFetcher for StaticFetcher {
        async fn fetch(&self, _media_url: &str) -> Result<Bytes> {
            Ok(Bytes::from_static(b"fetched-media"))
        }
    }

    struct AcceptingClassifier;

    #[async_trait]
    impl MemeClassifier for AcceptingClassifier {
        async fn classify(&self, _image: &[u8], _context_text: &str) -> Result<String> {
            Ok("YES\ndog:zoomies".to_string())
        }
    }

    async fn make_gateway() -> (MemeGateway, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = MemeVaultConfig::default();
        config.storage.base_dir = dir.path().to_path_buf();

        let gateway = MemeGateway::with_components(
            &config,
            Arc::new(StaticFetcher),
            Arc::new(AcceptingClassifier),
        )
        .await
        .unwrap();
        (gateway, dir)
    }

    #[tokio::test]
    async fn test_inbound_media_is_ingested() {
        let (gateway, _dir) = make_gateway().await;

        let message = InboundMessage::new("telegram", "chat-1")
            .with_text("look at him go")
            .with_media("https://cdn.example/dog.gif");
        gateway.handle_inbound(&message);

        for _ in 0..50 {
            if gateway.store().len().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let records = gateway.store().list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag, "dog:zoomies");
        assert_eq!(records[0].source, MemeSource::Auto);
    }

    #[tokio::test]
    async fn test_inbound_without_media_is_ignored() {
        let (gateway, _dir) = make_gateway().await;

        gateway.handle_inbound(&InboundMessage::new("telegram", "chat-1").with_text("words only"));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(gateway.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_menu_context_empty_library_is_none() {
        let (gateway, _dir) = make_gateway().await;
        assert!(gateway.menu_context().await.is_none());
    }

    #[tokio::test]
    async fn test_menu_context_zero_probability_is_none() {
        let (gateway, _dir) = make_gateway().await;
        gateway
            .store()
            .create(b"bytes", None, "dog:zoomies", MemeSource::Manual)
            .await
            .unwrap();
        gateway
            .settings()
            .update(SettingsPatch {
                reply_probability: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(gateway.menu_context().await.is_none());
    }

    #[tokio::test]
    async fn test_menu_context_lists_tags() {
        let (gateway, _dir) = make_gateway().await;
        gateway
            .store()
            .create(b"bytes", None, "dog:zoomies", MemeSource::Manual)
            .await
            .unwrap();

        let context = gateway.menu_context().await.unwrap();
        assert!(context.contains("dog:zoomies"));
        assert!(context.contains("SEND_MEME"));
    }

    #[tokio::test]
    async fn test_compose_reply_round_trip() {
        let (gateway, _dir) = make_gateway().await;
        gateway
            .store()
            .create(b"bytes", None, "dog:zoomies", MemeSource::Manual)
            .await
            .unwrap();

        let segments = gateway
            .compose_reply("haha nice\nSEND_MEME: dog zoomies")
            .await;

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::Text("haha nice".to_string()));
        assert!(matches!(segments[1], Segment::Media(_)));
    }

    #[tokio::test]
    async fn test_pick_meme_by_keyword() {
        let (gateway, _dir) = make_gateway().await;
        gateway
            .store()
            .create(b"aaa", None, "dog:zoomies", MemeSource::Manual)
            .await
            .unwrap();
        gateway
            .store()
            .create(b"bbb", None, "cat:judging", MemeSource::Manual)
            .await
            .unwrap();

        let picked = gateway.pick_meme("zoomies").await.unwrap();
        assert_eq!(picked.tag, "dog:zoomies");

        // No keyword draws from the whole library
        assert!(gateway.pick_meme("").await.is_some());

        assert!(gateway.pick_meme("no such meme").await.is_none());
    }

    #[tokio::test]
    async fn test_admin_tag_edit_flow() {
        let (gateway, _dir) = make_gateway().await;
        let store = gateway.store();

        let record = store
            .create(b"bytes", None, "dog:happy", MemeSource::Manual)
            .await
            .unwrap();
        store.update_tag(&record.id, "dog:sad").await.unwrap();

        let listed = store.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tag, "dog:sad");
        assert_eq!(listed[0].source, record.source);
        assert_eq!(listed[0].content_hash, record.content_hash);

        let err = store.delete("unknown-id").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
