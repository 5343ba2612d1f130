//! On-disk blob record encoding.
//!
//! ```text
//! [4 bytes: magic "BLOB"]
//! [1 byte: flags (bit 0 = Snappy-compressed payload)]
//! [4 bytes: payload length (big-endian u32), post-compression]
//! [N bytes: payload]
//! ```

use crate::error::{BlobError, BlobResult};

/// Magic prefix of every record.
pub const MAGIC: &[u8; 4] = b"BLOB";

/// Record header size: magic + flags + length.
pub const HEADER_SIZE: usize = 9;

/// Flags bit 0: the payload is Snappy-compressed.
pub const FLAG_COMPRESSED: u8 = 1;

/// Payloads below this size are stored uncompressed even when compression is
/// enabled; Snappy gains nothing on tiny blobs.
pub const COMPRESSION_THRESHOLD: usize = 512;

/// Maximum blob size the format can address.
pub const MAX_BLOB_SIZE: usize = i32::MAX as usize;

/// Encode a blob into its on-disk record.
///
/// Compresses with Snappy when `compress` is set and the blob is at least
/// [`COMPRESSION_THRESHOLD`] bytes.
pub fn encode_record(data: &[u8], compress: bool) -> BlobResult<Vec<u8>> {
    let (flags, payload) = if compress && data.len() >= COMPRESSION_THRESHOLD {
        let compressed = snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| BlobError::Compression(e.to_string()))?;
        (FLAG_COMPRESSED, compressed)
    } else {
        (0u8, data.to_vec())
    };

    let mut record = Vec::with_capacity(HEADER_SIZE + payload.len());
    record.extend_from_slice(MAGIC);
    record.push(flags);
    record.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Parse and validate a record header. Returns `(flags, payload length)`.
pub fn parse_header(header: &[u8; HEADER_SIZE]) -> Result<(u8, u32), String> {
    if &header[0..4] != MAGIC {
        return Err(format!("bad magic: {:02x?}", &header[0..4]));
    }
    let flags = header[4];
    let length = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);
    if length as usize > MAX_BLOB_SIZE {
        return Err(format!("record length {length} out of range"));
    }
    Ok((flags, length))
}

/// Recover the original blob bytes from a record payload.
pub fn decode_payload(flags: u8, payload: &[u8]) -> BlobResult<Vec<u8>> {
    if flags & FLAG_COMPRESSED != 0 {
        snap::raw::Decoder::new()
            .decompress_vec(payload)
            .map_err(|e| BlobError::Compression(e.to_string()))
    } else {
        Ok(payload.to_vec())
    }
}
