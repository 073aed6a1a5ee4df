//! Compression of stored snapshots.
//!
//! Text is gzipped and then base64-encoded so the result can live anywhere a
//! string can.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::error::{FeatureError, FeatureResult};

/// Compress text into a base64 string.
pub fn compress(text: &str) -> FeatureResult<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| FeatureError::Compression(e.to_string()))?;
    let bytes = encoder
        .finish()
        .map_err(|e| FeatureError::Compression(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

/// Reverse [`compress`].
pub fn decompress(data: &str) -> FeatureResult<String> {
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|e| FeatureError::Compression(e.to_string()))?;
    let mut text = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| FeatureError::Compression(e.to_string()))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_text() {
        assert_eq!(decompress(&compress("").unwrap()).unwrap(), "");
    }

    #[test]
    fn multibyte_text() {
        let text = "Schöne Grüße — 🐉";
        assert_eq!(decompress(&compress(text).unwrap()).unwrap(), text);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decompress("not base64!"),
            Err(FeatureError::Compression(_))
        ));
        // valid base64, not gzip
        assert!(matches!(
            decompress("aGVsbG8="),
            Err(FeatureError::Compression(_))
        ));
    }

    proptest! {
        #[test]
        fn decompress_reverses_compress(text in ".{0,256}") {
            let packed = compress(&text).unwrap();
            prop_assert_eq!(decompress(&packed).unwrap(), text);
        }
    }
}
