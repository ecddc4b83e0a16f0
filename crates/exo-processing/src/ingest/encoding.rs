//! Byte decoding for uploaded catalogs.
//!
//! Decoding never fails: malformed sequences become U+FFFD unless a
//! fallback single-byte encoding is configured.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use tracing::{debug, warn};

/// Decoded file contents.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// Name of the encoding that was used.
    pub encoding: &'static str,
    /// True when malformed sequences were replaced.
    pub had_errors: bool,
}

/// Guess UTF-16 without a BOM from the position of NUL bytes in the first
/// kilobyte. ASCII text in UTF-16 has a NUL in every other byte.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let sample = &bytes[..bytes.len().min(1024)];
    if sample.len() < 4 {
        return None;
    }
    let pairs = sample.len() / 2;
    let even_nuls = sample.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_nuls = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count();

    if odd_nuls * 10 >= pairs * 9 && even_nuls == 0 {
        Some(UTF_16LE)
    } else if even_nuls * 10 >= pairs * 9 && odd_nuls == 0 {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Decode raw bytes to text.
///
/// Order of preference: byte order mark, BOM-less UTF-16, UTF-8. When UTF-8
/// decoding hits malformed input and `fallback` is set, the whole input is
/// decoded with `fallback` instead.
pub fn decode(bytes: &[u8], fallback: Option<&'static Encoding>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        debug!("Found {} byte order mark", encoding.name());
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            encoding: encoding.name(),
            had_errors,
        };
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        debug!("Input looks like BOM-less {}", encoding.name());
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        return DecodedText {
            text: text.into_owned(),
            encoding: encoding.name(),
            had_errors,
        };
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if had_errors {
        if let Some(encoding) = fallback {
            warn!("Input is not valid UTF-8; decoding as {}", encoding.name());
            let (text, fallback_errors) = encoding.decode_without_bom_handling(bytes);
            return DecodedText {
                text: text.into_owned(),
                encoding: encoding.name(),
                had_errors: fallback_errors,
            };
        }
        warn!("Input is not valid UTF-8; malformed bytes were replaced");
    }

    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8.name(),
        had_errors,
    }
}
