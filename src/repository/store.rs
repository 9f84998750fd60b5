//! Content-addressed meme store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base_dir>/
//! ├── index.json        — id → record mapping, replaced atomically
//! └── media/
//!     ├── <id>.<ext>    — one payload file per record
//!     └── ...
//! ```
//!
//! The in-memory index is the single source of truth while the process
//! runs. Every mutation flushes the full index with a write-then-rename
//! so a crash can never leave a truncated index behind. Readers see the
//! last fully flushed snapshot.

use crate::error::{Error, Result};
use crate::repository::types::{
    content_hash, payload_extension, IndexEntry, MemeRecord, MemeSource, PersistedRecord,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Per-id results of a batch delete
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDeleteOutcome {
    /// Ids that were removed
    pub deleted: Vec<String>,
    /// Ids that were not present
    pub missing: Vec<String>,
}

/// Content-addressed meme store backed by a JSON index and a media
/// directory
pub struct MemeStore {
    media_dir: PathBuf,
    index_path: PathBuf,
    index: RwLock<BTreeMap<String, MemeRecord>>,
}

impl MemeStore {
    /// Open (or initialize) a store under the given base directory
    ///
    /// A missing or malformed index file starts the store empty rather
    /// than failing startup. Legacy bare-string index entries are
    /// migrated to full records and flushed back once.
    pub async fn new(base_dir: PathBuf) -> Result<Self> {
        let media_dir = base_dir.join("media");
        let index_path = base_dir.join("index.json");
        tokio::fs::create_dir_all(&media_dir).await?;

        let (records, migrated) = Self::load_index(&index_path, &media_dir).await;
        let store = Self {
            media_dir,
            index_path,
            index: RwLock::new(records),
        };

        if migrated {
            let index = store.index.write().await;
            if let Err(e) = store.flush(&index).await {
                tracing::warn!("Failed to persist migrated index: {}", e);
            }
        }

        Ok(store)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Store a new payload under the given tag
    ///
    /// Rejects byte-identical content with [`Error::Duplicate`]. On any
    /// persistence failure the index and the media directory are rolled
    /// back to their prior state; a partially created record is never
    /// visible.
    pub async fn create(
        &self,
        payload: &[u8],
        original_name: Option<&str>,
        tag: &str,
        source: MemeSource,
    ) -> Result<MemeRecord> {
        let hash = content_hash(payload);

        let mut index = self.index.write().await;
        if index.values().any(|r| r.content_hash == hash) {
            return Err(Error::Duplicate(hash));
        }

        let created_at = now_millis();
        let mut id = format!("{}-{}", created_at, &hash[..8]);
        let mut suffix = 1;
        while index.contains_key(&id) {
            id = format!("{}-{}-{}", created_at, &hash[..8], suffix);
            suffix += 1;
        }
        let file_name = format!("{}.{}", id, payload_extension(original_name));

        let payload_path = self.media_dir.join(&file_name);
        tokio::fs::write(&payload_path, payload).await?;

        let record = MemeRecord {
            id: id.clone(),
            tag: tag.to_string(),
            source,
            content_hash: hash,
            file_name,
            created_at,
        };
        index.insert(id.clone(), record.clone());

        if let Err(e) = self.flush(&index).await {
            index.remove(&id);
            if let Err(rm) = tokio::fs::remove_file(&payload_path).await {
                tracing::warn!(
                    "Failed to remove payload after aborted create {}: {}",
                    payload_path.display(),
                    rm
                );
            }
            return Err(e);
        }

        Ok(record)
    }

    /// Delete a record and its payload file
    ///
    /// The index entry is authoritative: once the updated index is
    /// flushed the record is gone even if the payload file cannot be
    /// removed (the orphan is logged and left behind).
    pub async fn delete(&self, id: &str) -> Result<MemeRecord> {
        let mut index = self.index.write().await;
        let record = index
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Err(e) = self.flush(&index).await {
            index.insert(record.id.clone(), record);
            return Err(e);
        }
        drop(index);

        self.remove_payload(&record).await;
        Ok(record)
    }

    /// Delete several records, each independently; the index is flushed
    /// once at the end
    pub async fn batch_delete(&self, ids: &[String]) -> Result<BatchDeleteOutcome> {
        let mut index = self.index.write().await;

        let mut removed = Vec::new();
        let mut missing = Vec::new();
        for id in ids {
            match index.remove(id) {
                Some(record) => removed.push(record),
                None => missing.push(id.clone()),
            }
        }

        if !removed.is_empty() {
            if let Err(e) = self.flush(&index).await {
                for record in removed {
                    index.insert(record.id.clone(), record);
                }
                return Err(e);
            }
        }
        drop(index);

        futures::future::join_all(removed.iter().map(|record| self.remove_payload(record))).await;
        let deleted = removed.into_iter().map(|record| record.id).collect();

        Ok(BatchDeleteOutcome { deleted, missing })
    }

    /// Replace the tag of an existing record
    pub async fn update_tag(&self, id: &str, tag: &str) -> Result<MemeRecord> {
        let mut index = self.index.write().await;

        let previous;
        let updated = {
            let record = index
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            previous = record.tag.clone();
            record.tag = tag.to_string();
            record.clone()
        };

        if let Err(e) = self.flush(&index).await {
            if let Some(record) = index.get_mut(id) {
                record.tag = previous;
            }
            return Err(e);
        }

        Ok(updated)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of all records, in index order
    pub async fn list(&self) -> Vec<MemeRecord> {
        self.index.read().await.values().cloned().collect()
    }

    /// Look up a single record
    pub async fn get(&self, id: &str) -> Option<MemeRecord> {
        self.index.read().await.get(id).cloned()
    }

    /// Whether any live record holds this content hash
    pub async fn contains_hash(&self, hash: &str) -> bool {
        self.index
            .read()
            .await
            .values()
            .any(|r| r.content_hash == hash)
    }

    /// Number of live records
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Absolute path of a record's payload file
    pub fn payload_path(&self, record: &MemeRecord) -> PathBuf {
        self.media_dir.join(&record.file_name)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Load the index file, tolerating absence and corruption
    async fn load_index(
        index_path: &Path,
        media_dir: &Path,
    ) -> (BTreeMap<String, MemeRecord>, bool) {
        let raw = match tokio::fs::read_to_string(index_path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read index {}: {}", index_path.display(), e);
                }
                return (BTreeMap::new(), false);
            }
        };

        let entries: BTreeMap<String, IndexEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Malformed index {}, starting empty: {}",
                    index_path.display(),
                    e
                );
                return (BTreeMap::new(), false);
            }
        };

        let mut records = BTreeMap::new();
        let mut migrated = false;
        for (id, entry) in entries {
            match entry {
                IndexEntry::Record(persisted) => {
                    records.insert(id.clone(), MemeRecord::from_persisted(id, persisted));
                }
                IndexEntry::LegacyTag(tag) => {
                    match Self::migrate_legacy(media_dir, &id, tag).await {
                        Some(record) => {
                            records.insert(id.clone(), record);
                            migrated = true;
                        }
                        None => {
                            tracing::warn!("Dropping legacy entry without payload: {}", id);
                            migrated = true;
                        }
                    }
                }
            }
        }

        (records, migrated)
    }

    /// Rebuild a full record from a legacy `file name → tag` entry by
    /// hashing the payload still on disk
    async fn migrate_legacy(media_dir: &Path, file_name: &str, tag: String) -> Option<MemeRecord> {
        let payload = tokio::fs::read(media_dir.join(file_name)).await.ok()?;
        Some(MemeRecord {
            id: file_name.to_string(),
            tag,
            source: MemeSource::Manual,
            content_hash: content_hash(&payload),
            file_name: file_name.to_string(),
            created_at: leading_millis(file_name),
        })
    }

    /// Write the full index atomically (temp file, then rename)
    async fn flush(&self, index: &BTreeMap<String, MemeRecord>) -> Result<()> {
        let persisted: BTreeMap<String, PersistedRecord> = index
            .values()
            .cloned()
            .map(MemeRecord::into_persisted)
            .collect();
        let json = serde_json::to_string_pretty(&persisted)?;

        let tmp_path = self.index_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.index_path).await?;
        Ok(())
    }

    /// Best-effort payload removal after a record left the index
    async fn remove_payload(&self, record: &MemeRecord) {
        let path = self.media_dir.join(&record.file_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove payload {}: {}", path.display(), e);
            }
        }
    }
}

/// Current time in unix milliseconds
fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Leading digits of a legacy file name, used as its creation time
fn leading_millis(file_name: &str) -> u64 {
    let digits: String = file_name.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn make_store() -> (MemeStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MemeStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_create_stores_payload_and_record() {
        let (store, _dir) = make_store().await;

        let record = store
            .create(b"payload-bytes", Some("cat.png"), "cat:confused", MemeSource::Manual)
            .await
            .unwrap();

        assert_eq!(record.tag, "cat:confused");
        assert_eq!(record.source, MemeSource::Manual);
        assert_eq!(record.content_hash, content_hash(b"payload-bytes"));
        assert!(record.file_name.ends_with(".png"));

        let on_disk = tokio::fs::read(store.payload_path(&record)).await.unwrap();
        assert_eq!(on_disk, b"payload-bytes");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_content() {
        let (store, _dir) = make_store().await;

        store
            .create(b"same", None, "first", MemeSource::Auto)
            .await
            .unwrap();
        let err = store
            .create(b"same", None, "second", MemeSource::Manual)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Duplicate(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_payload() {
        let (store, _dir) = make_store().await;

        let record = store
            .create(b"bytes", None, "tag", MemeSource::Manual)
            .await
            .unwrap();
        let path = store.payload_path(&record);
        assert!(path.exists());

        store.delete(&record.id).await.unwrap();

        assert!(store.list().await.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let (store, _dir) = make_store().await;
        store
            .create(b"bytes", None, "tag", MemeSource::Manual)
            .await
            .unwrap();

        let err = store.delete("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_batch_delete_partial() {
        let (store, _dir) = make_store().await;

        let a = store
            .create(b"aaa", None, "a", MemeSource::Manual)
            .await
            .unwrap();
        let b = store
            .create(b"bbb", None, "b", MemeSource::Manual)
            .await
            .unwrap();

        let outcome = store
            .batch_delete(&[a.id.clone(), "ghost".to_string(), b.id.clone()])
            .await
            .unwrap();

        assert_eq!(outcome.deleted, vec![a.id, b.id]);
        assert_eq!(outcome.missing, vec!["ghost".to_string()]);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_tag_preserves_identity() {
        let (store, _dir) = make_store().await;

        let record = store
            .create(b"bytes", None, "dog:happy", MemeSource::Auto)
            .await
            .unwrap();
        let updated = store.update_tag(&record.id, "dog:sad").await.unwrap();

        assert_eq!(updated.tag, "dog:sad");
        assert_eq!(updated.source, record.source);
        assert_eq!(updated.content_hash, record.content_hash);

        let listed = store.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tag, "dog:sad");

        let err = store.update_tag("missing", "x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_contains_hash() {
        let (store, _dir) = make_store().await;

        store
            .create(b"bytes", None, "tag", MemeSource::Auto)
            .await
            .unwrap();

        assert!(store.contains_hash(&content_hash(b"bytes")).await);
        assert!(!store.contains_hash(&content_hash(b"other")).await);
    }

    #[tokio::test]
    async fn test_reload_round_trip() {
        let dir = TempDir::new().unwrap();

        let id = {
            let store = MemeStore::new(dir.path().to_path_buf()).await.unwrap();
            store
                .create(b"bytes", Some("dog.jpg"), "dog:happy", MemeSource::Auto)
                .await
                .unwrap()
                .id
        };

        let store = MemeStore::new(dir.path().to_path_buf()).await.unwrap();
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.tag, "dog:happy");
        assert_eq!(record.source, MemeSource::Auto);
        assert!(store.payload_path(&record).exists());
    }

    #[tokio::test]
    async fn test_malformed_index_starts_empty() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("index.json"), "not valid json")
            .await
            .unwrap();

        let store = MemeStore::new(dir.path().to_path_buf()).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_legacy_entries_are_migrated() {
        let dir = TempDir::new().unwrap();
        let media_dir = dir.path().join("media");
        tokio::fs::create_dir_all(&media_dir).await.unwrap();
        tokio::fs::write(media_dir.join("1722000.jpg"), b"legacy-bytes")
            .await
            .unwrap();
        tokio::fs::write(
            dir.path().join("index.json"),
            r#"{"1722000.jpg": "dog:happy", "gone.jpg": "lost:forever"}"#,
        )
        .await
        .unwrap();

        let store = MemeStore::new(dir.path().to_path_buf()).await.unwrap();

        // Migrated entry has the full canonical shape
        let record = store.get("1722000.jpg").await.unwrap();
        assert_eq!(record.tag, "dog:happy");
        assert_eq!(record.content_hash, content_hash(b"legacy-bytes"));
        assert_eq!(record.file_name, "1722000.jpg");
        assert_eq!(record.created_at, 1722000);

        // Entry without a payload file is dropped
        assert!(store.get("gone.jpg").await.is_none());

        // Migration was flushed back in canonical form
        let raw = tokio::fs::read_to_string(dir.path().join("index.json"))
            .await
            .unwrap();
        assert!(raw.contains("content_hash"));
        assert!(!raw.contains("lost:forever"));
    }

    #[tokio::test]
    async fn test_flush_leaves_no_temp_file() {
        let (store, dir) = make_store().await;
        store
            .create(b"bytes", None, "tag", MemeSource::Manual)
            .await
            .unwrap();

        assert!(dir.path().join("index.json").exists());
        assert!(!dir.path().join("index.json.tmp").exists());
    }
}
