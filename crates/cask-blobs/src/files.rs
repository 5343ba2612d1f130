//! The rotating family of packed data files.
//!
//! Data files are named `blobs-%05d` and live directly in the store
//! directory. Exactly one file, the highest-numbered one, is the active
//! append target; a file is sealed implicitly when a higher-numbered file is
//! created. Appends are serialized by a single writer lock; reads go through
//! positioned I/O on cached read-only handles and never contend with the
//! writer.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::{BlobsConfig, SyncMode};
use crate::error::BlobResult;

fn file_name(number: u32) -> String {
    format!("blobs-{number:05}")
}

/// The active append target.
struct ActiveFile {
    number: u32,
    file: File,
    size: u64,
}

/// Bounded LRU of read-only data file handles, most recently used first.
struct HandleCache {
    cap: usize,
    entries: Vec<(u32, Arc<File>)>,
}

impl HandleCache {
    fn get(&mut self, dir: &Path, number: u32) -> io::Result<Arc<File>> {
        if let Some(pos) = self.entries.iter().position(|(n, _)| *n == number) {
            let entry = self.entries.remove(pos);
            let handle = entry.1.clone();
            self.entries.insert(0, entry);
            return Ok(handle);
        }
        let handle = Arc::new(File::open(dir.join(file_name(number)))?);
        self.entries.insert(0, (number, handle.clone()));
        self.entries.truncate(self.cap.max(1));
        Ok(handle)
    }
}

/// The packed-file writer: append, positioned read, rotation.
pub struct BlobsFiles {
    dir: PathBuf,
    max_file_size: u64,
    sync_mode: SyncMode,
    writer: Mutex<ActiveFile>,
    handles: Mutex<HandleCache>,
}

impl BlobsFiles {
    /// Open the data file family in `dir`, creating the directory and the
    /// first file if needed. The highest-numbered file becomes the active
    /// append target if its size is below the cap; otherwise the next file
    /// in the sequence is created.
    pub fn open(dir: &Path, config: &BlobsConfig) -> BlobResult<Self> {
        fs::create_dir_all(dir)?;

        let mut numbers = Self::scan_dir(dir)?;
        numbers.sort_unstable();

        let active = match numbers.last() {
            None => Self::open_active(dir, 0)?,
            Some(&highest) => {
                let size = fs::metadata(dir.join(file_name(highest)))?.len();
                if size < config.max_file_size {
                    Self::open_active(dir, highest)?
                } else {
                    Self::open_active(dir, highest + 1)?
                }
            }
        };
        debug!(number = active.number, size = active.size, "active data file");

        Ok(Self {
            dir: dir.to_path_buf(),
            max_file_size: config.max_file_size,
            sync_mode: config.sync_mode,
            writer: Mutex::new(active),
            handles: Mutex::new(HandleCache {
                cap: config.handle_cache_size,
                entries: Vec::new(),
            }),
        })
    }

    /// Append an encoded record to the active file.
    ///
    /// Returns `(file_number, offset, length)` for the written record. The
    /// active file is rotated once it reaches the size cap; the cap is soft,
    /// so one record may push a file past it.
    pub fn append(&self, record: &[u8]) -> BlobResult<(u32, u64, u32)> {
        use std::io::Write;

        let mut w = self.writer.lock().expect("writer lock poisoned");
        let number = w.number;
        let offset = w.size;
        w.file.write_all(record)?;
        if self.sync_mode == SyncMode::EveryWrite {
            w.file.sync_all()?;
        }
        w.size += record.len() as u64;

        if w.size >= self.max_file_size {
            self.rotate(&mut w)?;
        }
        Ok((number, offset, record.len() as u32))
    }

    /// Read `length` bytes at `offset` from the given data file.
    ///
    /// Positioned read on a shared read-only handle; does not take the
    /// writer lock.
    pub fn read(&self, number: u32, offset: u64, length: u32) -> BlobResult<Vec<u8>> {
        let handle = {
            let mut handles = self.handles.lock().expect("handle cache lock poisoned");
            handles.get(&self.dir, number)?
        };
        let mut buf = vec![0u8; length as usize];
        handle.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    }

    /// Truncate the active file to `offset`, discarding a bad tail found
    /// during recovery.
    pub fn truncate_active(&self, offset: u64) -> BlobResult<()> {
        let mut w = self.writer.lock().expect("writer lock poisoned");
        w.file.set_len(offset)?;
        w.file.sync_all()?;
        w.size = offset;
        Ok(())
    }

    /// Seal the active file and start the next one, regardless of size.
    pub fn seal_current(&self) -> BlobResult<()> {
        let mut w = self.writer.lock().expect("writer lock poisoned");
        self.rotate(&mut w)
    }

    /// Flush the active file to disk.
    pub fn sync(&self) -> BlobResult<()> {
        let w = self.writer.lock().expect("writer lock poisoned");
        w.file.sync_all()?;
        Ok(())
    }

    /// Number and current size of the active file.
    pub fn active_state(&self) -> (u32, u64) {
        let w = self.writer.lock().expect("writer lock poisoned");
        (w.number, w.size)
    }

    /// All data file numbers present on disk, ascending.
    pub fn file_numbers(&self) -> BlobResult<Vec<u32>> {
        let mut numbers = Self::scan_dir(&self.dir)?;
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Path of the given data file.
    pub fn path(&self, number: u32) -> PathBuf {
        self.dir.join(file_name(number))
    }

    fn rotate(&self, w: &mut ActiveFile) -> BlobResult<()> {
        w.file.sync_all()?;
        let next = w.number + 1;
        debug!(sealed = w.number, next, "rotating data file");
        *w = Self::open_active(&self.dir, next)?;
        Ok(())
    }

    fn open_active(dir: &Path, number: u32) -> BlobResult<ActiveFile> {
        let path = dir.join(file_name(number));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(ActiveFile { number, file, size })
    }

    fn scan_dir(dir: &Path) -> BlobResult<Vec<u32>> {
        let mut numbers = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(name = ?entry.file_name(), "skipping non-utf8 entry in blobs directory");
                continue;
            };
            let Some(suffix) = name.strip_prefix("blobs-") else {
                // The index database lives alongside the data files.
                if name != "index" {
                    warn!(name, "skipping unrecognized entry in blobs directory");
                }
                continue;
            };
            match suffix.parse::<u32>() {
                Ok(number) => numbers.push(number),
                Err(_) => {
                    warn!(name, "skipping data file with unparsable sequence number");
                }
            }
        }
        Ok(numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(max_file_size: u64) -> BlobsConfig {
        BlobsConfig {
            max_file_size,
            ..BlobsConfig::default()
        }
    }

    #[test]
    fn open_creates_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();
        assert_eq!(files.active_state(), (0, 0));
        assert!(dir.path().join("blobs-00000").exists());
    }

    #[test]
    fn append_returns_increasing_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();

        let (n1, off1, len1) = files.append(b"first").unwrap();
        let (n2, off2, _) = files.append(b"second").unwrap();
        assert_eq!((n1, off1), (0, 0));
        assert_eq!(n2, 0);
        assert_eq!(off2, len1 as u64);
    }

    #[test]
    fn read_back_written_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();

        files.append(b"aaaa").unwrap();
        let (n, off, len) = files.append(b"payload").unwrap();
        assert_eq!(files.read(n, off, len).unwrap(), b"payload");
    }

    #[test]
    fn rotation_after_cap() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &small_config(10)).unwrap();

        let (n1, _, _) = files.append(b"0123456789ab").unwrap();
        assert_eq!(n1, 0);
        // The first append pushed the file past the cap; the next lands in
        // a fresh file.
        let (n2, off2, _) = files.append(b"xyz").unwrap();
        assert_eq!(n2, 1);
        assert_eq!(off2, 0);
        assert_eq!(files.file_numbers().unwrap(), vec![0, 1]);
    }

    #[test]
    fn sealed_files_stay_readable_after_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &small_config(4)).unwrap();

        let (n1, off1, len1) = files.append(b"sealed").unwrap();
        files.append(b"next").unwrap();
        assert_eq!(files.read(n1, off1, len1).unwrap(), b"sealed");
    }

    #[test]
    fn reopen_resumes_highest_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let files = BlobsFiles::open(dir.path(), &small_config(4)).unwrap();
            files.append(b"full!").unwrap();
        }
        let files = BlobsFiles::open(dir.path(), &small_config(4)).unwrap();
        // blobs-00000 is at the cap, so blobs-00001 becomes active.
        assert_eq!(files.active_state(), (1, 0));
    }

    #[test]
    fn reopen_keeps_partial_file_active() {
        let dir = tempfile::tempdir().unwrap();
        {
            let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();
            files.append(b"abc").unwrap();
        }
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();
        assert_eq!(files.active_state(), (0, 3));
    }

    #[test]
    fn truncate_active_discards_tail() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();

        files.append(b"keep").unwrap();
        files.append(b"drop").unwrap();
        files.truncate_active(4).unwrap();
        assert_eq!(files.active_state(), (0, 4));

        let (_, off, _) = files.append(b"new").unwrap();
        assert_eq!(off, 4);
        assert_eq!(files.read(0, 0, 4).unwrap(), b"keep");
        assert_eq!(files.read(0, 4, 3).unwrap(), b"new");
    }

    #[test]
    fn seal_current_rotates_early() {
        let dir = tempfile::tempdir().unwrap();
        let files = BlobsFiles::open(dir.path(), &BlobsConfig::default()).unwrap();

        let (n1, off1, len1) = files.append(b"in the first file").unwrap();
        files.seal_current().unwrap();
        assert_eq!(files.active_state(), (1, 0));

        let (n2, _, _) = files.append(b"in the second file").unwrap();
        assert_eq!((n1, n2), (0, 1));
        assert_eq!(files.read(n1, off1, len1).unwrap(), b"in the first file");
    }

    #[test]
    fn handle_cache_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let config = BlobsConfig {
            max_file_size: 2,
            handle_cache_size: 2,
            ..BlobsConfig::default()
        };
        let files = BlobsFiles::open(dir.path(), &config).unwrap();

        let mut locations = Vec::new();
        for i in 0..5u8 {
            locations.push(files.append(&[i, i]).unwrap());
        }
        // Reading all five files cycles handles through the 2-slot cache.
        for (i, (n, off, len)) in locations.iter().enumerate() {
            let expected = [i as u8, i as u8];
            assert_eq!(files.read(*n, *off, *len).unwrap(), expected);
        }
        assert!(files.handles.lock().unwrap().entries.len() <= 2);
    }
}
