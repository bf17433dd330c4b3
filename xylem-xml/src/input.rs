//! Input preparation: encoding detection and line-ending normalization.
//!
//! The buffer produced here is the buffer the structural index owns; all
//! spans point into it. Normalization therefore happens once, up front,
//! per XML 1.0 §2.11.

use memchr::memchr;

use crate::error::{Error, Result};
use crate::ParseMode;

/// Decode BOM-detected UTF-16, validate UTF-8 and normalize `\r\n`/`\r`
/// to `\n`. Lenient mode substitutes U+FFFD for undecodable sequences.
pub fn prepare(bytes: &[u8], mode: ParseMode) -> Result<Vec<u8>> {
    let encoding = match encoding_rs::Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => encoding_rs::UTF_8,
    };
    // decode() strips the BOM and replaces malformed sequences
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors && mode.is_strict() {
        return Err(Error::InvalidEncoding);
    }
    let buf = normalize_newlines(text.as_ref());
    if buf.len() > u32::MAX as usize {
        return Err(Error::InputTooLarge);
    }
    Ok(buf)
}

fn normalize_newlines(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    if memchr(b'\r', bytes).is_none() {
        return bytes.to_vec();
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(off) = memchr(b'\r', &bytes[i..]) {
        let at = i + off;
        out.extend_from_slice(&bytes[i..at]);
        out.push(b'\n');
        i = at + 1;
        if bytes.get(i) == Some(&b'\n') {
            i += 1;
        }
    }
    out.extend_from_slice(&bytes[i..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_utf8() {
        assert_eq!(prepare(b"<a/>", ParseMode::Strict).unwrap(), b"<a/>");
    }

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(
            prepare(b"\xEF\xBB\xBF<a/>", ParseMode::Strict).unwrap(),
            b"<a/>"
        );
    }

    #[test]
    fn decodes_utf16_le() {
        let mut doc = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            doc.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(prepare(&doc, ParseMode::Strict).unwrap(), b"<a/>");
    }

    #[test]
    fn decodes_utf16_be() {
        let mut doc = vec![0xFE, 0xFF];
        for unit in "<a/>".encode_utf16() {
            doc.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(prepare(&doc, ParseMode::Strict).unwrap(), b"<a/>");
    }

    #[test]
    fn normalizes_line_endings() {
        assert_eq!(
            prepare(b"<a>1\r\n2\r3\n4</a>", ParseMode::Strict).unwrap(),
            b"<a>1\n2\n3\n4</a>"
        );
    }

    #[test]
    fn invalid_utf8_strict_vs_lenient() {
        let doc = b"<a>\xFF</a>";
        assert_eq!(prepare(doc, ParseMode::Strict), Err(Error::InvalidEncoding));
        let lenient = prepare(doc, ParseMode::Lenient).unwrap();
        assert_eq!(lenient, "<a>\u{FFFD}</a>".as_bytes());
    }
}
