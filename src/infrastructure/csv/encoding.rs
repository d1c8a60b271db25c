// ============================================================
// ENCODING FALLBACK
// ============================================================
// Decode raw bytes with an ordered list of candidate encodings

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::domain::error::{AppError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Look up an encoding by label, also accepting spellings like `latin-1` or `utf_8`.
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    Encoding::for_label(label.as_bytes()).or_else(|| {
        let compact: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();
        Encoding::for_label(compact.as_bytes())
    })
}

/// Decode `bytes` with the first candidate that yields no malformed sequences.
///
/// Returns the text and the label (as given) of the winning encoding. Unknown
/// labels count as failed attempts. When nothing works the error lists every
/// label that was tried.
pub fn decode_with_fallback(bytes: &[u8], candidates: &[String]) -> Result<(String, String)> {
    let mut attempted = Vec::with_capacity(candidates.len());

    for label in candidates {
        attempted.push(label.clone());

        let Some(encoding) = encoding_for_label(label) else {
            debug!(encoding = %label, "Unknown encoding label, skipping");
            continue;
        };

        let payload = if encoding == UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };

        match encoding.decode_without_bom_handling_and_without_replacement(payload) {
            Some(text) => return Ok((text.into_owned(), label.clone())),
            None => debug!(encoding = %label, "Payload is not valid in this encoding"),
        }
    }

    Err(AppError::Encoding { attempted })
}
