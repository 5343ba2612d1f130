//! The blob engine: content-addressed put/get over packed files plus the
//! derived index, including the recovery scan.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use cask_types::Hash;
use tracing::{debug, warn};

use crate::config::BlobsConfig;
use crate::error::{BlobError, BlobResult};
use crate::files::BlobsFiles;
use crate::index::{BlobIndex, IndexEntry};
use crate::record::{self, HEADER_SIZE};

/// Append-only, content-addressed blob store.
///
/// Blobs are write-once: a second put of an existing hash is a successful
/// no-op. The index entry for a blob is published only after its record is
/// durable, so any entry visible to a reader points at readable bytes.
pub struct BlobStore {
    files: BlobsFiles,
    index: BlobIndex,
    config: BlobsConfig,
    closed: AtomicBool,
}

impl BlobStore {
    /// Open (or create) a blob store in `dir`.
    ///
    /// Runs the recovery scan when the index is missing, empty, or its
    /// recorded head lags the data files (a crash, or the index directory
    /// was deleted).
    pub fn open(dir: &Path, config: BlobsConfig) -> BlobResult<Self> {
        let files = BlobsFiles::open(dir, &config)?;
        let index = BlobIndex::open(&dir.join("index"))?;
        let store = Self {
            files,
            index,
            config,
            closed: AtomicBool::new(false),
        };
        store.recover_if_needed()?;
        Ok(store)
    }

    /// Store a blob under its hash.
    ///
    /// Verifies `hash` against the bytes, appends the encoded record, then
    /// publishes the index entry. A put of an already-stored hash is a
    /// no-op.
    pub fn put(&self, hash: &Hash, data: &[u8]) -> BlobResult<()> {
        self.ensure_open()?;
        if data.len() > record::MAX_BLOB_SIZE {
            return Err(BlobError::InvalidArgument(format!(
                "blob too large: {} bytes",
                data.len()
            )));
        }
        let computed = Hash::compute(data);
        if computed != *hash {
            return Err(BlobError::HashMismatch {
                expected: *hash,
                computed,
            });
        }
        if self.index.has(hash)? {
            return Ok(());
        }

        let record = record::encode_record(data, self.config.compression)?;
        let flags = record[4];
        let (file_number, offset, size) = self.files.append(&record)?;
        self.index.put(
            hash,
            &IndexEntry {
                file_number,
                offset,
                size,
                flags,
            },
        )?;
        let (head_number, head_size) = self.files.active_state();
        self.index.set_head(head_number, head_size)?;
        Ok(())
    }

    /// Fetch a blob by hash.
    ///
    /// The record is re-verified end to end: header, length, and the SHA-1
    /// of the decoded payload. A mismatch is reported as corruption, never
    /// silently repaired.
    pub fn get(&self, hash: &Hash) -> BlobResult<Vec<u8>> {
        self.ensure_open()?;
        if self.config.write_only {
            return Err(BlobError::WriteOnly);
        }
        let entry = self.index.get(hash)?.ok_or(BlobError::NotFound(*hash))?;
        let record = self
            .files
            .read(entry.file_number, entry.offset, entry.size)?;
        if record.len() < HEADER_SIZE {
            return Err(BlobError::CorruptRecord {
                file_number: entry.file_number,
                offset: entry.offset,
                reason: "record shorter than header".into(),
            });
        }
        let mut header = [0u8; HEADER_SIZE];
        header.copy_from_slice(&record[..HEADER_SIZE]);
        let (flags, length) =
            record::parse_header(&header).map_err(|reason| BlobError::CorruptRecord {
                file_number: entry.file_number,
                offset: entry.offset,
                reason,
            })?;
        if length as usize != record.len() - HEADER_SIZE {
            return Err(BlobError::CorruptRecord {
                file_number: entry.file_number,
                offset: entry.offset,
                reason: format!(
                    "length mismatch: header says {length}, record holds {}",
                    record.len() - HEADER_SIZE
                ),
            });
        }
        let data = record::decode_payload(flags, &record[HEADER_SIZE..])?;
        let computed = Hash::compute(&data);
        if computed != *hash {
            return Err(BlobError::CorruptBlob {
                hash: *hash,
                computed,
            });
        }
        Ok(data)
    }

    /// Check whether a blob is stored. Index lookup only.
    pub fn stat(&self, hash: &Hash) -> BlobResult<bool> {
        self.ensure_open()?;
        if self.config.write_only {
            return Err(BlobError::WriteOnly);
        }
        self.index.has(hash)
    }

    /// All stored hashes, in hash order. Scans the index, not the data
    /// files.
    pub fn enumerate(&self) -> BlobResult<Vec<Hash>> {
        self.ensure_open()?;
        self.index.hashes()
    }

    /// Flush, sync and mark the store closed. A second call is an error.
    pub fn close(&self) -> BlobResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(BlobError::Closed);
        }
        self.files.sync()?;
        let (head_number, head_size) = self.files.active_state();
        self.index.set_head(head_number, head_size)?;
        self.index.flush()?;
        Ok(())
    }

    fn ensure_open(&self) -> BlobResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BlobError::Closed);
        }
        Ok(())
    }

    fn recover_if_needed(&self) -> BlobResult<()> {
        let (active_number, active_size) = self.files.active_state();
        if self.index.head()? == Some((active_number, active_size)) {
            return Ok(());
        }
        if active_number == 0 && active_size == 0 {
            // Fresh store; publish the head so the next open is clean.
            self.index.set_head(0, 0)?;
            return Ok(());
        }
        self.rebuild_index()
    }

    /// Rebuild the index by scanning every data file from offset 0.
    ///
    /// Idempotent: existing index entries win, re-scanned records map to the
    /// same locations. This is the only repair path.
    fn rebuild_index(&self) -> BlobResult<()> {
        debug!("rebuilding blob index from data files");
        let (active_number, _) = self.files.active_state();
        for number in self.files.file_numbers()? {
            let path = self.files.path(number);
            let file_len = std::fs::metadata(&path)?.len();
            let scanned = self.scan_file(number)?;
            if scanned < file_len {
                if number == active_number {
                    warn!(
                        number,
                        scanned, file_len, "truncating active data file to last good offset"
                    );
                    self.files.truncate_active(scanned)?;
                } else {
                    warn!(number, scanned, file_len, "sealed data file has a bad tail");
                }
            }
        }
        let (head_number, head_size) = self.files.active_state();
        self.index.set_head(head_number, head_size)?;
        self.index.flush()?;
        Ok(())
    }

    /// Scan one data file, indexing every decodable record. Returns the
    /// offset just past the last good record.
    fn scan_file(&self, number: u32) -> BlobResult<u64> {
        let file = File::open(self.files.path(number))?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;
        let mut indexed = 0usize;

        while offset + HEADER_SIZE as u64 <= file_len {
            let mut header = [0u8; HEADER_SIZE];
            reader.read_exact(&mut header)?;
            let (flags, length) = match record::parse_header(&header) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    warn!(number, offset, reason = %reason, "bad record header; stopping scan");
                    break;
                }
            };
            let record_len = HEADER_SIZE as u64 + length as u64;
            if offset + record_len > file_len {
                warn!(number, offset, "truncated record; stopping scan");
                break;
            }
            let mut payload = vec![0u8; length as usize];
            reader.read_exact(&mut payload)?;
            let data = match record::decode_payload(flags, &payload) {
                Ok(data) => data,
                Err(e) => {
                    warn!(number, offset, error = %e, "undecodable payload; stopping scan");
                    break;
                }
            };
            let hash = Hash::compute(&data);
            self.index.put(
                &hash,
                &IndexEntry {
                    file_number: number,
                    offset,
                    size: record_len as u32,
                    flags,
                },
            )?;
            indexed += 1;
            offset += record_len;
        }

        debug!(number, indexed, offset, "scanned data file");
        Ok(offset)
    }
}
