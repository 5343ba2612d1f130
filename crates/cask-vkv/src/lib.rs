//! Versioned key-value store for the cask stack.
//!
//! Every key carries a full time-ordered version history. Point reads hit
//! one `(key, version)` pair, per-key scans walk the history in ascending
//! version order, and key enumeration walks keys byte-wise. Keys and values
//! are opaque bytes; higher layers typically store blob hashes in the
//! values, rooting a content-addressed DAG at named keys.
//!
//! All keys share one byte-ordered namespace in the backing database (see
//! [`codec`]); per-key min/max/count counters (see [`counters`]) make
//! latest-version reads cheap.

pub mod codec;
pub mod counters;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::VkvStore;
pub use error::{VkvError, VkvResult};
pub use types::{KeyValue, KeyValueVersions};

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (tempfile::TempDir, VkvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VkvStore::open(&dir.path().join("vkv")).unwrap();
        (dir, store)
    }

    #[test]
    fn key_scan_with_range_and_limit() {
        let (_dir, store) = open();
        for key in [b"a".as_slice(), b"b", b"ba", b"c"] {
            store.put(key, b"v", Some(1)).unwrap();
        }

        assert_eq!(
            store.keys(b"a", b"b\xff", 0).unwrap(),
            vec![b"a".to_vec(), b"b".to_vec(), b"ba".to_vec()]
        );
        assert_eq!(
            store.keys(b"", b"\xff", 2).unwrap(),
            vec![b"a".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn keys_appear_once_regardless_of_version_count() {
        let (_dir, store) = open();
        store.put(b"k", b"v1", Some(100)).unwrap();
        store.put(b"k", b"v2", Some(200)).unwrap();
        store.put(b"k", b"v3", Some(300)).unwrap();

        assert_eq!(store.keys(b"", b"\xff", 0).unwrap(), vec![b"k".to_vec()]);
    }

    #[test]
    fn key_prefix_enumeration_is_exact() {
        let (_dir, store) = open();
        for key in [
            b"app/a".as_slice(),
            b"app/b",
            b"apple",
            b"aqua",
            b"banana",
        ] {
            store.put(key, b"v", Some(1)).unwrap();
        }

        let got = store.keys(b"app", b"app\xff", 0).unwrap();
        assert_eq!(
            got,
            vec![b"app/a".to_vec(), b"app/b".to_vec(), b"apple".to_vec()]
        );
    }

    #[test]
    fn prefix_scan_covers_non_ascii_keys() {
        let (_dir, store) = open();
        // "app中" encodes to app ‖ [0xE4, 0xB8, 0xAD]; a UTF-8 "\u{ff}"
        // sentinel ([0xC3, 0xBF]) would sort before it and drop it. The raw
        // 0xFF upper bound covers every key starting with the prefix.
        let cjk = "app\u{4e2d}".as_bytes();
        store.put(b"app/a", b"v", Some(1)).unwrap();
        store.put(cjk, b"v", Some(1)).unwrap();
        store.put(b"aqua", b"v", Some(1)).unwrap();

        let got = store.keys(b"app", b"app\xff", 0).unwrap();
        assert_eq!(got, vec![b"app/a".to_vec(), cjk.to_vec()]);
    }

    #[test]
    fn keys_with_inverted_range_is_empty() {
        let (_dir, store) = open();
        store.put(b"k", b"v", Some(1)).unwrap();
        assert!(store.keys(b"z", b"a", 0).unwrap().is_empty());
    }

    #[test]
    fn scan_order_is_strictly_ascending() {
        let (_dir, store) = open();
        // Insert in a scrambled order, including versions around byte
        // boundaries of the big-endian suffix.
        for v in [300u64, 1, 256, 255, 70000, 2, 65535] {
            store
                .put(b"k", format!("{v}").as_bytes(), Some(v))
                .unwrap();
        }

        let history = store.versions(b"k", 0, u64::MAX, 0).unwrap();
        let versions: Vec<u64> = history.versions.iter().map(|kv| kv.version).collect();
        assert_eq!(versions, vec![1, 2, 255, 256, 300, 65535, 70000]);
        for kv in &history.versions {
            assert_eq!(kv.value, format!("{}", kv.version).into_bytes());
        }
    }

    #[test]
    fn latest_version_matches_version_max() {
        let (_dir, store) = open();
        for v in [50u64, 10, 40, 30] {
            store.put(b"k", b"v", Some(v)).unwrap();
        }
        let latest = store.get(b"k", None).unwrap();
        assert_eq!(latest.version, store.version_max(b"k").unwrap());
        assert_eq!(latest.version, 50);
    }

    #[test]
    fn histories_of_many_keys_stay_separate() {
        let (_dir, store) = open();
        for key in ["x", "y", "z"] {
            for v in 1..=5u64 {
                store
                    .put(key.as_bytes(), format!("{key}{v}").as_bytes(), Some(v))
                    .unwrap();
            }
        }

        for key in ["x", "y", "z"] {
            assert_eq!(store.version_count(key.as_bytes()).unwrap(), 5);
            let history = store.versions(key.as_bytes(), 0, u64::MAX, 0).unwrap();
            assert_eq!(history.versions.len(), 5);
            assert_eq!(history.versions[0].value, format!("{key}1").into_bytes());
        }
        assert_eq!(
            store.keys(b"", b"\xff", 0).unwrap(),
            vec![b"x".to_vec(), b"y".to_vec(), b"z".to_vec()]
        );
    }
}
