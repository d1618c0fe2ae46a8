use std::io::{Read, Write};

use lz4_flex::frame::{FrameDecoder, FrameEncoder};

/// Compresses `data` with an LZ4 frame. Returns `None` (rather than an error) if compression
/// fails for any reason, so callers can fall back to keeping the original bytes — history
/// snapshots must never be lost just because compression didn't pan out.
pub fn compress(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = FrameEncoder::new(Vec::new());
    encoder.write_all(data).ok()?;
    encoder.finish().ok()
}

/// Decompresses an LZ4 frame produced by [`compress`]. `original_size` is used only to
/// pre-size the output buffer; a mismatch doesn't cause an error, since [`Read::read_to_end`]
/// grows the buffer as needed.
pub fn decompress(compressed: &[u8], original_size: usize) -> Option<Vec<u8>> {
    let mut decoder = FrameDecoder::new(compressed);
    let mut out = Vec::with_capacity(original_size);
    decoder.read_to_end(&mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_data() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(&data).unwrap();
        let restored = decompress(&compressed, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn round_trips_empty_input() {
        let compressed = compress(&[]).unwrap();
        let restored = decompress(&compressed, 0).unwrap();
        assert!(restored.is_empty());
    }
}
