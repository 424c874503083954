use crate::types::Delta;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

const GZIP_LEVEL: u32 = 6;

/// Gzip-serializes a delta set at the wire-format compression level.
pub fn compress_deltas(deltas: &[Delta]) -> std::io::Result<Vec<u8>> {
    let json = serde_json::to_vec(deltas).unwrap_or_default();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(GZIP_LEVEL));
    encoder.write_all(&json)?;
    encoder.finish()
}

pub fn decompress_deltas(compressed: &[u8]) -> std::io::Result<Vec<Delta>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json).unwrap_or_default())
}

/// Size, in bytes, `deltas` would occupy once gzip-compressed. Used to
/// account compression savings without actually transporting the bytes.
pub fn estimate_compressed_size(deltas: &[Delta]) -> usize {
    compress_deltas(deltas).map(|b| b.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeltaOperation, SyncPriority};
    use chrono::Utc;

    fn sample_delta() -> Delta {
        Delta {
            delta_id: "d1".to_string(),
            entity_type: "product".to_string(),
            entity_id: "1".to_string(),
            operation: DeltaOperation::Update,
            old_version: Some(1),
            new_version: 2,
            old_checksum: Some("aaa".to_string()),
            new_checksum: "bbb".to_string(),
            data: None,
            patch: None,
            priority: SyncPriority::Medium,
            timestamp: Utc::now(),
            compressed: false,
            size_bytes: 0,
        }
    }

    #[test]
    fn compress_then_decompress_round_trips() {
        let deltas = vec![sample_delta()];
        let compressed = compress_deltas(&deltas).unwrap();
        let restored = decompress_deltas(&compressed).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].delta_id, "d1");
    }

    #[test]
    fn compressed_output_starts_with_gzip_magic() {
        let compressed = compress_deltas(&[sample_delta()]).unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }
}
