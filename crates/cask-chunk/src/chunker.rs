//! Content-defined chunking with a rolling hash.
//!
//! Cut points depend only on the bytes inside a fixed window, so an edit
//! perturbs its neighborhood and the remaining chunks realign, letting edits
//! of large payloads share storage.

/// Rolling hash window in bytes.
const WINDOW_SIZE: usize = 64;

/// Per-byte mixing table, derived from a fixed seed so cut points are stable
/// across processes and versions.
const TABLE: [u64; 256] = build_table();

const fn splitmix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

const fn build_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut i = 0;
    while i < 256 {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        table[i] = splitmix64(state);
        i += 1;
    }
    table
}

/// Content-defined chunker.
///
/// Splits payloads at positions where the rolling hash of the trailing
/// window matches the cut mask, bounded by a minimum and maximum chunk size.
/// The same input always yields the same cuts.
#[derive(Clone, Debug)]
pub struct Chunker {
    min_size: usize,
    max_size: usize,
    cut_mask: u64,
}

impl Chunker {
    /// Create a chunker with explicit bounds.
    ///
    /// `avg_bits` sets the cut mask: a cut fires roughly every
    /// `2^avg_bits` bytes of content between the size bounds.
    pub fn new(min_size: usize, avg_bits: u32, max_size: usize) -> Self {
        assert!(min_size >= WINDOW_SIZE, "min chunk must cover the window");
        assert!(max_size >= min_size, "max chunk must be >= min chunk");
        Self {
            min_size,
            max_size,
            cut_mask: (1u64 << avg_bits) - 1,
        }
    }

    /// Split `data` into content-defined chunks.
    ///
    /// Every chunk except the last is within `[min_size, max_size]`; the
    /// concatenation of all chunks is `data`. Empty input yields no chunks.
    pub fn split<'a>(&self, data: &'a [u8]) -> Vec<&'a [u8]> {
        let mut chunks = Vec::new();
        let mut window = [0u8; WINDOW_SIZE];
        let mut window_pos = 0usize;
        let mut hash = 0u64;
        let mut start = 0usize;

        for (pos, &byte) in data.iter().enumerate() {
            let outgoing = window[window_pos];
            window[window_pos] = byte;
            window_pos = (window_pos + 1) % WINDOW_SIZE;
            // Buzhash update; with a 64-byte window the outgoing byte's
            // contribution has rotated a full cycle, so it cancels as-is.
            hash = hash.rotate_left(1) ^ TABLE[outgoing as usize] ^ TABLE[byte as usize];

            let len = pos + 1 - start;
            if len >= self.max_size || (len >= self.min_size && hash & self.cut_mask == 0) {
                chunks.push(&data[start..pos + 1]);
                start = pos + 1;
            }
        }
        if start < data.len() {
            chunks.push(&data[start..]);
        }
        chunks
    }
}

impl Default for Chunker {
    /// Production bounds: 256 KiB minimum, ~1 MiB average, 4 MiB maximum.
    fn default() -> Self {
        Self::new(256 * 1024, 20, 4 * 1024 * 1024)
    }
}
