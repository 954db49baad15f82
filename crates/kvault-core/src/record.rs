//! The `Record` data model and the JSON document codec for record sets.
//!
//! A backup artifact's plaintext is one JSON document holding a list of
//! records. Keys are hierarchical with `/` as the separator; values are
//! opaque bytes, carried in the JSON as standard base64 text:
//!
//! ```json
//! [{"key": "a/b/c", "value": "dGVzdA=="}]
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::KvaultResult;

/// One key/value pair from the cluster-store dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Decode a plaintext backup document into records.
pub fn parse_records(data: &[u8]) -> KvaultResult<Vec<Record>> {
    let records = serde_json::from_slice(data).context("decoding record document")?;
    Ok(records)
}

/// Encode records into a plaintext backup document.
///
/// Pretty-printed, matching the layout of legacy artifacts.
pub fn encode_records(records: &[Record]) -> KvaultResult<Vec<u8>> {
    let data = serde_json::to_vec_pretty(records).context("encoding record document")?;
    Ok(data)
}

/// Drop records whose key starts with any prefix in the comma-separated
/// exclusion list. A leading `/` on each prefix is trimmed before matching;
/// empty prefixes never match. Input order is preserved.
pub fn exclude_prefixes(records: Vec<Record>, excludes: &str) -> Vec<Record> {
    if excludes.is_empty() {
        return records;
    }
    let prefixes: Vec<&str> = excludes
        .split(',')
        .map(|p| p.trim_start_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();
    records
        .into_iter()
        .filter(|rec| !prefixes.iter().any(|p| rec.key.starts_with(p)))
        .collect()
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_base64_value() {
        let json = r#"[{"key":"a/b/c","value":"dGVzdA=="}]"#;
        let records = parse_records(json.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "a/b/c");
        assert_eq!(records[0].value, b"test");
    }

    #[test]
    fn test_record_document_roundtrip() {
        let records = vec![
            Record::new("app/config/db", b"postgres://".to_vec()),
            Record::new("leaf", vec![0u8, 1, 2, 255]),
        ];
        let data = encode_records(&records).unwrap();
        let decoded = parse_records(&data).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_exclude_prefixes_drops_matches() {
        let records = vec![
            Record::new("app/secrets/token", b"x".to_vec()),
            Record::new("app/config/db", b"y".to_vec()),
            Record::new("other/key", b"z".to_vec()),
        ];
        let kept = exclude_prefixes(records, "/app/secrets,missing");
        let keys: Vec<&str> = kept.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["app/config/db", "other/key"]);
    }

    #[test]
    fn test_exclude_prefixes_empty_list_keeps_all() {
        let records = vec![Record::new("a", b"1".to_vec()), Record::new("b", b"2".to_vec())];
        let kept = exclude_prefixes(records.clone(), "");
        assert_eq!(kept, records);
    }

    #[test]
    fn test_exclude_prefixes_bare_slash_is_not_match_everything() {
        let records = vec![Record::new("a/b", b"1".to_vec())];
        let kept = exclude_prefixes(records.clone(), "/");
        assert_eq!(kept, records);
    }
}
