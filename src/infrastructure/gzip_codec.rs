//! Gzip decoding of report payloads.

use crate::domain::errors::IngestionError;
use flate2::read::GzDecoder;
use std::io::Read;

/// Decompresses a gzip payload into UTF-8 text.
///
/// Empty, truncated, non-gzip or non-UTF-8 input is an error; partial output
/// is never returned.
pub fn decompress(bytes: &[u8]) -> Result<String, IngestionError> {
    if bytes.is_empty() {
        return Err(IngestionError::DecompressionFailed(
            "empty payload".to_string(),
        ));
    }

    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| IngestionError::DecompressionFailed(e.to_string()))?;

    String::from_utf8(out)
        .map_err(|e| IngestionError::DecompressionFailed(format!("payload is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decompress_round_trip() {
        let text = "Units\tDeveloper Proceeds\n1\t8.49\n";
        assert_eq!(decompress(&gzip(text)).unwrap(), text);
    }

    #[test]
    fn test_truncated_payload_fails() {
        let payload = gzip(&"Units\tDeveloper Proceeds\n1\t8.49\n".repeat(50));
        let truncated = &payload[..payload.len() / 2];
        assert!(matches!(
            decompress(truncated),
            Err(IngestionError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_plain_text_fails() {
        assert!(matches!(
            decompress(b"Units\tDeveloper Proceeds\n"),
            Err(IngestionError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_empty_payload_fails() {
        assert!(matches!(
            decompress(&[]),
            Err(IngestionError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let payload = encoder.finish().unwrap();
        let err = decompress(&payload).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
