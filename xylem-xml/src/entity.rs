//! Entity and character-reference handling.
//!
//! The scanner never rewrites character data; it only flags runs that
//! contain `&`. Decoding happens here, on demand, when an accessor asks for
//! the value. Only the five predefined entities and numeric character
//! references are expanded — anything else is preserved verbatim (strict
//! parses have already rejected it during scanning).

use std::borrow::Cow;

use memchr::memchr;

use crate::chars;
use crate::error::{Error, Result};

/// Decode `&lt; &gt; &amp; &apos; &quot;` and `&#N;`/`&#xN;` references.
///
/// Infallible: malformed or unknown references pass through untouched.
/// Returns a borrow when the input contains no `&`.
pub fn decode(raw: &str) -> Cow<'_, str> {
    let bytes = raw.as_bytes();
    let first = match memchr(b'&', bytes) {
        Some(i) => i,
        None => return Cow::Borrowed(raw),
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut rest = &raw[first..];
    loop {
        // rest starts at an '&'
        match parse_reference(rest.as_bytes()) {
            Some((decoded, len)) => {
                out.push(decoded);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
        match memchr(b'&', rest.as_bytes()) {
            Some(i) => {
                out.push_str(&rest[..i]);
                rest = &rest[i..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    Cow::Owned(out)
}

/// Parse one reference at the start of `bytes` (which begins with `&`).
/// Returns the decoded char and the byte length consumed, including `;`.
fn parse_reference(bytes: &[u8]) -> Option<(char, usize)> {
    let semi = find_semicolon(bytes)?;
    let body = &bytes[1..semi];
    let c = match body {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"apos" => '\'',
        b"quot" => '"',
        _ => {
            if let Some(hex) = body.strip_prefix(b"#x") {
                char_ref(hex, 16)?
            } else if let Some(dec) = body.strip_prefix(b"#") {
                char_ref(dec, 10)?
            } else {
                return None;
            }
        }
    };
    Some((c, semi + 1))
}

// References are short (the longest predefined is `&quot;` and numeric
// references may carry leading zeros); cap the search so a bare '&' in a
// long run does not scan the whole remainder.
const MAX_REFERENCE_LEN: usize = 16;

fn find_semicolon(bytes: &[u8]) -> Option<usize> {
    let window = &bytes[..bytes.len().min(MAX_REFERENCE_LEN)];
    memchr(b';', window)
}

fn char_ref(digits: &[u8], radix: u32) -> Option<char> {
    if digits.is_empty() {
        return None;
    }
    let s = std::str::from_utf8(digits).ok()?;
    let n = u32::from_str_radix(s, radix).ok()?;
    let c = char::from_u32(n)?;
    chars::is_xml_char(c).then_some(c)
}

/// Strict-mode validation of the reference starting at `input[at]` (an
/// `&`). Returns the reference length. Decoding stays lazy; this only
/// enforces the well-formedness rules.
pub(crate) fn validate_reference(input: &[u8], at: usize) -> Result<usize> {
    let bytes = &input[at..];
    debug_assert_eq!(bytes.first(), Some(&b'&'));
    let semi = match find_semicolon(bytes) {
        Some(i) => i,
        None => {
            let window = &bytes[..bytes.len().min(MAX_REFERENCE_LEN)];
            if memchr(b'<', window).is_some() {
                // a reference cannot span markup; this '&' is bare
                return Err(Error::UnknownEntity(at));
            }
            // a truncated buffer is indistinguishable from a bare '&'
            if bytes.len() < MAX_REFERENCE_LEN {
                return Err(Error::UnexpectedEof);
            }
            return Err(Error::UnknownEntity(at));
        }
    };
    let body = &bytes[1..semi];
    match body {
        b"lt" | b"gt" | b"amp" | b"apos" | b"quot" => Ok(semi + 1),
        _ if body.starts_with(b"#") => {
            let (digits, radix) = match body.strip_prefix(b"#x") {
                Some(hex) => (hex, 16),
                None => (&body[1..], 10),
            };
            match char_ref(digits, radix) {
                Some(_) => Ok(semi + 1),
                None => Err(Error::InvalidCharRef(at)),
            }
        }
        _ => Err(Error::UnknownEntity(at)),
    }
}
