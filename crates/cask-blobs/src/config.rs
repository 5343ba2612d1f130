/// Fsync strategy for blob appends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

impl Default for SyncMode {
    fn default() -> Self {
        Self::EveryWrite
    }
}

/// Configuration for a blob store.
#[derive(Clone, Debug)]
pub struct BlobsConfig {
    /// Soft size cap for one data file; the active file is rotated once it
    /// reaches this size (default: 256 MiB).
    pub max_file_size: u64,
    /// Snappy-compress payloads of 512 bytes or more.
    pub compression: bool,
    /// Disable reads entirely; used by mirror targets.
    pub write_only: bool,
    /// Fsync strategy for appends.
    pub sync_mode: SyncMode,
    /// Maximum number of cached read-only data file handles.
    pub handle_cache_size: usize,
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024,
            compression: true,
            write_only: false,
            sync_mode: SyncMode::default(),
            handle_cache_size: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = BlobsConfig::default();
        assert_eq!(c.max_file_size, 256 * 1024 * 1024);
        assert!(c.compression);
        assert!(!c.write_only);
        assert_eq!(c.sync_mode, SyncMode::EveryWrite);
        assert_eq!(c.handle_cache_size, 8);
    }
}
