//! Documents embedded in URLs
//!
//! Short documents can travel in a query parameter instead of through the
//! share backend. Encoding is URL-safe base64 without padding. Decoding is
//! lenient: anything that does not decode cleanly is taken as literal text.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::Engine;

/// Standard alphabet that, like browsers' `atob`, ignores stray bits in the
/// last character
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Encode a document for a query parameter
pub fn encode_document(markdown: &str) -> String {
    URL_SAFE_NO_PAD.encode(markdown.as_bytes())
}

/// Decode a query parameter produced by [`encode_document`], falling back
/// to the (percent-decoded) parameter itself
pub fn decode_document(param: &str) -> String {
    if param.is_empty() {
        return String::new();
    }

    let decoded = urlencoding::decode(param)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| param.to_string());

    // Form encoding may have turned '+' into ' '
    let base64: String = decoded
        .replace(' ', "+")
        .replace('-', "+")
        .replace('_', "/");

    let body = base64.trim_end_matches('=');
    let padding = base64.len() - body.len();
    if body.is_empty()
        || padding > 2
        || !body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return decoded;
    }

    if body.len() % 4 == 1 {
        return decoded;
    }

    let padded = format!("{}{}", body, "=".repeat((4 - body.len() % 4) % 4));
    match LENIENT.decode(padded) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or(decoded),
        Err(_) => decoded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_url_safe() {
        let markdown = "# Plan ✓\n\n- ship? >>>";
        let encoded = encode_document(markdown);

        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
        assert_eq!(decode_document(&encoded), markdown);
    }

    #[test]
    fn test_decode_accepts_standard_alphabet_and_padding() {
        // "hi?" in standard base64 with padding
        assert_eq!(decode_document("aGk/"), "hi?");
        assert_eq!(decode_document("aGk%3D"), "hi");
        assert_eq!(decode_document("aGk="), "hi");
    }

    #[test]
    fn test_decode_ignores_trailing_bits() {
        // 'l' carries bits past the end of "hi"
        assert_eq!(decode_document("aGl"), "hi");
        assert_eq!(decode_document("aGl="), "hi");
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(decode_document("Hello%20world!"), "Hello world!");
        assert_eq!(decode_document(""), "");
        // Valid alphabet but impossible length
        assert_eq!(decode_document("abcde"), "abcde");
    }

    #[test]
    fn test_invalid_utf8_passes_through() {
        // 0xFF 0xFE is not UTF-8
        assert_eq!(decode_document("__4"), "__4");
    }
}
