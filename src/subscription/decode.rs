// src/subscription/decode.rs
//! Speculative base64 decoding for subscription payloads.
//!
//! Subscription feeds are frequently served as one base64 blob wrapping a
//! newline-separated URI list. Which alphabet a feed uses (standard or
//! URL-safe) and whether it keeps the `=` padding varies from publisher to
//! publisher, so the decoder accepts all of them at once.
//!
//! The decode never fails observably: when the text is not base64 (or does not
//! decode to UTF-8) the input comes back unchanged as `Cow::Borrowed`.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

/// Standard alphabet, padding optional, lenient about trailing bits.
/// URL-safe input is mapped onto this alphabet before decoding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode `text` into raw bytes, or `None` if it is not base64 in any of the
/// supported variants. ASCII whitespace is ignored so line-wrapped blobs work.
pub fn decode_bytes(text: &str) -> Option<Vec<u8>> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    LENIENT.decode(cleaned.as_bytes()).ok()
}

/// Try to reverse one base64 layer on `text`.
///
/// Returns `Cow::Owned` with the decoded text when decoding applied, otherwise
/// the original input as `Cow::Borrowed`.
pub fn decode(text: &str) -> Cow<'_, str> {
    match decode_bytes(text).map(String::from_utf8) {
        Some(Ok(decoded)) => Cow::Owned(decoded),
        _ => Cow::Borrowed(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
    use base64::Engine as _;

    #[test]
    fn decodes_every_supported_variant() {
        // ">>>" and "???" land on 3-byte boundaries: "Pj4+" and "Pz8/" in the
        // standard alphabet, "Pj4-" and "Pz8_" in url-safe. The tail forces padding.
        let raw = "vless://x>>>???a";
        for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
            let enc = engine.encode(raw);
            assert_eq!(decode(&enc), raw, "variant output: {enc}");
        }
    }

    #[test]
    fn line_wrapped_blob_is_accepted() {
        let enc = STANDARD.encode("trojan://pw@host:443\nvless://id@host:443\n");
        let (head, tail) = enc.split_at(20);
        let wrapped = format!("{head}\r\n{tail}\n");
        assert_eq!(decode(&wrapped), "trojan://pw@host:443\nvless://id@host:443\n");
    }

    #[test]
    fn plain_text_is_returned_unchanged() {
        for s in ["vless://abc\nvmess://def", "hello world!", "", "   ", "{\"a\":1}"] {
            let out = decode(s);
            assert!(matches!(out, Cow::Borrowed(_)), "expected no-op for {s:?}");
            assert_eq!(out, s);
        }
    }

    #[test]
    fn non_utf8_payload_is_left_alone() {
        let enc = STANDARD.encode([0xffu8, 0xfe, 0x00, 0x80]);
        assert_eq!(decode(&enc), enc.as_str());
        assert_eq!(decode_bytes(&enc), Some(vec![0xff, 0xfe, 0x00, 0x80]));
    }
}
