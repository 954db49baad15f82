//! Hierarchical key path transformer.
//!
//! Rewrites the directory portion of record keys during restore (and for
//! key filtering on backup). Rules come from a comma-separated flag value
//! of `from,to` pairs: `"/old,/new,/a,/b"` relocates anything under
//! `/old` to `/new`, then anything under `/a` to `/b`.
//!
//! Only the directory prefix of a key is rewritten. The final path
//! segment is reattached unchanged, so a pattern can never rename the
//! leaf itself. Keys with no `/` pass through untouched.

use tracing::info;

use crate::error::{KvaultError, KvaultResult};
use crate::record::Record;

/// Audit event for one relocated key. Both sides are kept so callers can
/// report exactly what moved where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: String,
    pub to: String,
}

/// Multi-pattern substring replacer over directory prefixes.
#[derive(Debug, Clone, Default)]
pub struct PathTransformer {
    pairs: Vec<(String, String)>,
}

impl PathTransformer {
    /// Build a transformer from a comma-separated pair list. An empty
    /// string yields a no-op; an odd number of entries is `BadTransform`.
    pub fn new(pairs_csv: &str) -> KvaultResult<Self> {
        let mut pairs = Vec::new();
        if !pairs_csv.is_empty() {
            let split: Vec<&str> = pairs_csv.split(',').collect();
            if split.len() % 2 != 0 {
                return Err(KvaultError::BadTransform);
            }
            for chunk in split.chunks(2) {
                pairs.push((chunk[0].to_string(), chunk[1].to_string()));
            }
        }
        Ok(Self { pairs })
    }

    /// True when no pairs are configured. A no-op transformer must not
    /// scan any keys, so `apply` short-circuits on this.
    pub fn is_noop(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Rewrite record keys in place, returning one `Relocation` per key
    /// that actually changed.
    pub fn apply(&self, records: &mut [Record]) -> Vec<Relocation> {
        if self.is_noop() {
            return Vec::new();
        }

        let mut moved = Vec::new();
        for rec in records.iter_mut() {
            // split with str::split rather than a path library: trailing
            // separators mark empty folders in the store and must survive
            let segments: Vec<&str> = rec.key.split('/').collect();
            if segments.len() < 2 {
                continue;
            }
            let dir = segments[..segments.len() - 1].join("/");
            let new_key = format!("{}/{}", self.replace_all(&dir), segments[segments.len() - 1]);
            if new_key != rec.key {
                info!(from = %rec.key, to = %new_key, "relocating key");
                moved.push(Relocation {
                    from: rec.key.clone(),
                    to: new_key.clone(),
                });
                rec.key = new_key;
            }
        }
        moved
    }

    /// Leftmost-match, non-overlapping substring replacement. At each
    /// position the pairs are tried in configuration order, so earlier
    /// pairs win when several patterns could match. Empty patterns never
    /// match.
    fn replace_all(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut i = 0;
        'scan: while i < input.len() {
            for (from, to) in &self.pairs {
                if !from.is_empty() && input[i..].starts_with(from.as_str()) {
                    out.push_str(to);
                    i += from.len();
                    continue 'scan;
                }
            }
            match input[i..].chars().next() {
                Some(ch) => {
                    out.push(ch);
                    i += ch.len_utf8();
                }
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(keys: &[&str]) -> Vec<Record> {
        keys.iter().map(|k| Record::new(*k, b"v".to_vec())).collect()
    }

    #[test]
    fn test_directory_prefix_rewritten() {
        let t = PathTransformer::new("/old,/new").unwrap();
        let mut recs = records(&["/old/child/leaf"]);
        let moved = t.apply(&mut recs);
        assert_eq!(recs[0].key, "/new/child/leaf");
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].from, "/old/child/leaf");
        assert_eq!(moved[0].to, "/new/child/leaf");
    }

    #[test]
    fn test_leaf_segment_never_rewritten() {
        // pattern also occurs in the final segment; only the directory
        // portion may change
        let t = PathTransformer::new("old,new").unwrap();
        let mut recs = records(&["old/old"]);
        t.apply(&mut recs);
        assert_eq!(recs[0].key, "new/old");
    }

    #[test]
    fn test_key_without_directory_passes_through() {
        let t = PathTransformer::new("/old,/new").unwrap();
        let mut recs = records(&["leaf"]);
        let moved = t.apply(&mut recs);
        assert_eq!(recs[0].key, "leaf");
        assert!(moved.is_empty());
    }

    #[test]
    fn test_odd_pair_count_is_bad_transform() {
        let err = PathTransformer::new("/a,/b,/c").unwrap_err();
        assert!(matches!(err, KvaultError::BadTransform));
    }

    #[test]
    fn test_empty_spec_is_noop() {
        let t = PathTransformer::new("").unwrap();
        assert!(t.is_noop());
        let mut recs = records(&["/old/leaf", "plain"]);
        let moved = t.apply(&mut recs);
        assert!(moved.is_empty());
        assert_eq!(recs[0].key, "/old/leaf");
    }

    #[test]
    fn test_earlier_pair_wins_at_same_position() {
        let t = PathTransformer::new("ab,X,a,Y").unwrap();
        let mut recs = records(&["abc/leaf"]);
        t.apply(&mut recs);
        assert_eq!(recs[0].key, "Xc/leaf");
    }

    #[test]
    fn test_non_overlapping_replacement() {
        // after a match the scan resumes past the replaced text, so the
        // substitution output is never rescanned
        let t = PathTransformer::new("aa,a").unwrap();
        let mut recs = records(&["aaaa/leaf"]);
        t.apply(&mut recs);
        assert_eq!(recs[0].key, "aa/leaf");
    }

    #[test]
    fn test_unchanged_key_yields_no_relocation() {
        let t = PathTransformer::new("/old,/new").unwrap();
        let mut recs = records(&["/other/leaf"]);
        let moved = t.apply(&mut recs);
        assert!(moved.is_empty());
    }

    #[test]
    fn test_trailing_separator_preserved() {
        // empty-folder keys end in '/'; the empty final segment must be
        // reattached so the marker survives a relocation
        let t = PathTransformer::new("/old,/new").unwrap();
        let mut recs = records(&["/old/folder/"]);
        t.apply(&mut recs);
        assert_eq!(recs[0].key, "/new/folder/");
    }
}
