//! Tag matching and menu sampling over the repository snapshot

use crate::repository::{MemeRecord, MemeStore};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Fixed bonus a literal substring hit adds to the similarity score.
/// Keeps exact hits dominant without making them absolute.
const SUBSTRING_BONUS: f64 = 0.5;

/// Minimum score a fuzzy match must exceed to be accepted
const MIN_ACCEPT_SCORE: f64 = 0.1;

/// Selects memes by tag similarity and samples menu hints
pub struct RetrievalEngine {
    store: Arc<MemeStore>,
}

impl RetrievalEngine {
    /// Create an engine reading through the given store
    pub fn new(store: Arc<MemeStore>) -> Self {
        Self { store }
    }

    /// Pick a record whose tag contains `query` literally
    ///
    /// Ties are broken uniformly at random. An empty query with a
    /// non-empty library falls back to a uniform pick over everything.
    pub async fn match_exact(&self, query: &str) -> Option<MemeRecord> {
        let records = self.store.list().await;
        if records.is_empty() {
            return None;
        }

        let query = query.trim();
        let matches: Vec<&MemeRecord> = if query.is_empty() {
            records.iter().collect()
        } else {
            records.iter().filter(|r| r.tag.contains(query)).collect()
        };

        let mut rng = rand::thread_rng();
        matches.choose(&mut rng).map(|r| (*r).clone())
    }

    /// Pick the record whose tag is most similar to `query`
    ///
    /// Scores are normalized Levenshtein similarity in [0, 1] plus a
    /// fixed bonus for literal substring hits. Returns `None` when the
    /// best score does not exceed the acceptance threshold. On equal
    /// scores the first record in index order wins.
    pub async fn match_fuzzy(&self, query: &str) -> Option<MemeRecord> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let records = self.store.list().await;

        let mut best: Option<(&MemeRecord, f64)> = None;
        for record in &records {
            let mut score = strsim::normalized_levenshtein(query, &record.tag);
            if record.tag.contains(query) {
                score += SUBSTRING_BONUS;
            }
            // Strict comparison keeps the earliest record on ties
            if best.map_or(true, |(_, current)| score > current) {
                best = Some((record, score));
            }
        }

        best.filter(|(_, score)| *score > MIN_ACCEPT_SCORE)
            .map(|(record, _)| record.clone())
    }

    /// Bounded sample of distinct tag descriptions
    ///
    /// Returns every description when the library holds at most
    /// `max_size` of them, otherwise a uniform sample of exactly
    /// `max_size` without replacement.
    pub async fn sample_menu(&self, max_size: usize) -> Vec<String> {
        let records = self.store.list().await;

        let mut descriptions: Vec<String> = Vec::new();
        for record in &records {
            if !descriptions.contains(&record.tag) {
                descriptions.push(record.tag.clone());
            }
        }

        if descriptions.len() <= max_size {
            return descriptions;
        }

        let mut rng = rand::thread_rng();
        descriptions
            .choose_multiple(&mut rng, max_size)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemeSource;
    use tempfile::TempDir;

    async fn engine_with_tags(tags: &[&str]) -> (RetrievalEngine, Arc<MemeStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemeStore::new(dir.path().to_path_buf()).await.unwrap());
        for (i, tag) in tags.iter().enumerate() {
            store
                .create(format!("payload-{}", i).as_bytes(), None, tag, MemeSource::Manual)
                .await
                .unwrap();
        }
        (RetrievalEngine::new(store.clone()), store, dir)
    }

    #[tokio::test]
    async fn test_empty_library_matches_nothing() {
        let (engine, _store, _dir) = engine_with_tags(&[]).await;
        assert!(engine.match_exact("dog").await.is_none());
        assert!(engine.match_fuzzy("dog").await.is_none());
        assert!(engine.sample_menu(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_substring_match() {
        let (engine, _store, _dir) =
            engine_with_tags(&["doggo:happy dance", "cat:judging you"]).await;

        let picked = engine.match_exact("doggo").await.unwrap();
        assert_eq!(picked.tag, "doggo:happy dance");

        assert!(engine.match_exact("zebra").await.is_none());
    }

    #[tokio::test]
    async fn test_exact_empty_query_picks_from_whole_library() {
        let (engine, _store, _dir) = engine_with_tags(&["a:1", "b:2"]).await;
        let picked = engine.match_exact("").await.unwrap();
        assert!(picked.tag == "a:1" || picked.tag == "b:2");
    }

    #[tokio::test]
    async fn test_fuzzy_empty_query_is_none() {
        let (engine, _store, _dir) = engine_with_tags(&["a:1"]).await;
        assert!(engine.match_fuzzy("").await.is_none());
        assert!(engine.match_fuzzy("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_exact_tag_dominates() {
        let (engine, _store, _dir) = engine_with_tags(&[
            "dog:happy",
            "dog:happier than ever",
            "cat:unimpressed",
        ])
        .await;

        let picked = engine.match_fuzzy("dog:happy").await.unwrap();
        assert_eq!(picked.tag, "dog:happy");
    }

    #[tokio::test]
    async fn test_fuzzy_substring_bonus_beats_plain_similarity() {
        let (engine, _store, _dir) =
            engine_with_tags(&["doggo dancing wildly", "dog"]).await;

        // "doggo" is a substring of the first tag; the bonus must beat
        // the higher raw edit similarity of the short second tag.
        let picked = engine.match_fuzzy("doggo").await.unwrap();
        assert_eq!(picked.tag, "doggo dancing wildly");
    }

    #[tokio::test]
    async fn test_fuzzy_below_threshold_is_none() {
        let (engine, _store, _dir) = engine_with_tags(&["absolutely unrelated"]).await;
        assert!(engine.match_fuzzy("q").await.is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_tie_keeps_first_in_index_order() {
        let (engine, store, _dir) = engine_with_tags(&["aa", "ab"]).await;

        // Both tags score identically against "ac"; the winner must be
        // whichever record the index yields first.
        let expected = store
            .list()
            .await
            .into_iter()
            .next()
            .unwrap();
        let picked = engine.match_fuzzy("ac").await.unwrap();
        assert_eq!(picked.id, expected.id);
    }

    #[tokio::test]
    async fn test_sample_menu_returns_all_when_small() {
        let (engine, _store, _dir) = engine_with_tags(&["a:1", "b:2", "c:3"]).await;
        let menu = engine.sample_menu(10).await;
        assert_eq!(menu.len(), 3);
    }

    #[tokio::test]
    async fn test_sample_menu_bounded_and_distinct() {
        let tags: Vec<String> = (0..20).map(|i| format!("tag-{}:usage", i)).collect();
        let refs: Vec<&str> = tags.iter().map(|s| s.as_str()).collect();
        let (engine, _store, _dir) = engine_with_tags(&refs).await;

        let menu = engine.sample_menu(5).await;
        assert_eq!(menu.len(), 5);

        let mut unique = menu.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), menu.len());
    }

    #[tokio::test]
    async fn test_sample_menu_deduplicates_descriptions() {
        let (engine, _store, _dir) = engine_with_tags(&["same:tag", "same:tag"]).await;
        let menu = engine.sample_menu(10).await;
        assert_eq!(menu, vec!["same:tag".to_string()]);
    }
}
