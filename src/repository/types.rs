//! Record types for the meme repository

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance of a stored meme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemeSource {
    /// Saved explicitly by an operator
    Manual,
    /// Accepted by the ingestion classifier
    Auto,
}

/// A persisted meme entry
///
/// The record exclusively owns the payload file named by `file_name`
/// under the store's media directory: deleting the record deletes the
/// file. `source` and `content_hash` are immutable after creation; only
/// `tag` can change, through the tag-update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeRecord {
    /// Stable identifier: `<created_at millis>-<hash prefix>`
    pub id: String,

    /// Free-form descriptor, typically `"label:usage"`
    pub tag: String,

    /// Provenance, set at creation
    pub source: MemeSource,

    /// Lowercase hex SHA-256 of the payload bytes
    pub content_hash: String,

    /// Payload file name under the media directory
    pub file_name: String,

    /// Ingestion time in unix milliseconds
    pub created_at: u64,
}

/// On-disk shape of a single index entry (the record minus its id, which
/// is the map key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub tag: String,
    pub source: MemeSource,
    pub content_hash: String,
    pub file_name: String,
    #[serde(default)]
    pub created_at: u64,
}

/// One entry of the index file
///
/// Early index revisions mapped a file name directly to its tag string;
/// those are accepted on load and normalized into full records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndexEntry {
    Record(PersistedRecord),
    LegacyTag(String),
}

impl MemeRecord {
    /// Split into map key and persisted value for the index file
    pub fn into_persisted(self) -> (String, PersistedRecord) {
        (
            self.id,
            PersistedRecord {
                tag: self.tag,
                source: self.source,
                content_hash: self.content_hash,
                file_name: self.file_name,
                created_at: self.created_at,
            },
        )
    }

    /// Rebuild a record from its index key and persisted value
    pub fn from_persisted(id: String, persisted: PersistedRecord) -> Self {
        Self {
            id,
            tag: persisted.tag,
            source: persisted.source,
            content_hash: persisted.content_hash,
            file_name: persisted.file_name,
            created_at: persisted.created_at,
        }
    }
}

/// Lowercase hex SHA-256 of a payload
pub fn content_hash(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// File extension carried over from an original file name, falling back
/// to `bin` when there is none usable
pub fn payload_extension(original_name: Option<&str>) -> &str {
    original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let a = content_hash(b"same bytes");
        let b = content_hash(b"same bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"other bytes"));
    }

    #[test]
    fn test_payload_extension() {
        assert_eq!(payload_extension(Some("cat.jpg")), "jpg");
        assert_eq!(payload_extension(Some("archive.tar.gz")), "gz");
        assert_eq!(payload_extension(Some("no_extension")), "bin");
        assert_eq!(payload_extension(Some("weird.!!")), "bin");
        assert_eq!(payload_extension(Some("trailing.")), "bin");
        assert_eq!(payload_extension(None), "bin");
    }

    #[test]
    fn test_index_entry_accepts_both_shapes() {
        let full: IndexEntry = serde_json::from_str(
            r#"{"tag":"dog:happy","source":"auto","content_hash":"ab","file_name":"x.jpg"}"#,
        )
        .unwrap();
        assert!(matches!(full, IndexEntry::Record(_)));

        let legacy: IndexEntry = serde_json::from_str(r#""dog:happy""#).unwrap();
        match legacy {
            IndexEntry::LegacyTag(tag) => assert_eq!(tag, "dog:happy"),
            other => panic!("expected legacy entry, got {:?}", other),
        }
    }

    #[test]
    fn test_persisted_round_trip() {
        let record = MemeRecord {
            id: "1722-abcd1234".to_string(),
            tag: "cat:confused".to_string(),
            source: MemeSource::Manual,
            content_hash: "ff".to_string(),
            file_name: "1722-abcd1234.png".to_string(),
            created_at: 1722,
        };

        let (id, persisted) = record.clone().into_persisted();
        let rebuilt = MemeRecord::from_persisted(id, persisted);
        assert_eq!(rebuilt, record);
    }
}
