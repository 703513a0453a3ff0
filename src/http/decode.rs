//! Percent-decoding of URL-encoded values.
//!
//! Only `%XX` escapes are decoded. `+` stays a `+`: form-style
//! `+`-as-space decoding is not applied.

use crate::errors::ErrorKind;
use memchr::memchr_iter;
use std::borrow::Cow;

/// Decodes `%XX` escapes and returns the result as UTF-8.
///
/// - empty input gives `""`
/// - input without `%` is returned borrowed, only validated
/// - a `%` not followed by two hex digits is kept literally together with
///   whatever follows it, so the decoder never fails on a bad escape
///
/// # Errors
/// [`ErrorKind::InvalidEncoding`] if the decoded bytes are not valid UTF-8.
/// Use [`unquote_lossy`] to replace invalid sequences instead.
///
/// # Examples
/// ```
/// use micro_web::unquote;
///
/// assert_eq!(unquote(b"").unwrap(), "");
/// assert_eq!(unquote(b"a%20b").unwrap(), "a b");
/// assert_eq!(unquote(b"100%25").unwrap(), "100%");
/// assert_eq!(unquote(b"%D0%BA%D0%BE%D1%82").unwrap(), "кот");
///
/// // Malformed escapes are kept
/// assert_eq!(unquote(b"50%").unwrap(), "50%");
/// assert_eq!(unquote(b"%zz%4").unwrap(), "%zz%4");
///
/// // No form decoding
/// assert_eq!(unquote(b"a+b").unwrap(), "a+b");
///
/// assert!(unquote(b"%FF").is_err());
/// ```
pub fn unquote(input: &[u8]) -> Result<Cow<'_, str>, ErrorKind> {
    match decode_bytes(input) {
        Cow::Borrowed(bytes) => simdutf8::basic::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| ErrorKind::InvalidEncoding),
        Cow::Owned(bytes) => String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|_| ErrorKind::InvalidEncoding),
    }
}

/// Same as [`unquote`], but invalid UTF-8 is replaced with `U+FFFD`
/// instead of failing.
///
/// ```
/// use micro_web::unquote_lossy;
///
/// assert_eq!(unquote_lossy(b"ok%FF"), "ok\u{FFFD}");
/// assert_eq!(unquote_lossy(b"a%2Fb"), "a/b");
/// ```
pub fn unquote_lossy(input: &[u8]) -> Cow<'_, str> {
    match decode_bytes(input) {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
        Cow::Owned(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Cow::Owned(text),
            Err(err) => Cow::Owned(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        },
    }
}

// Decodes escapes at the byte level. Allocates only if there is a `%`.
fn decode_bytes(input: &[u8]) -> Cow<'_, [u8]> {
    let mut percents = memchr_iter(b'%', input).peekable();

    let Some(&first) = percents.peek() else {
        return Cow::Borrowed(input);
    };

    let mut result = Vec::with_capacity(input.len());
    result.extend_from_slice(&input[..first]);

    while let Some(pos) = percents.next() {
        let segment_end = percents.peek().copied().unwrap_or(input.len());
        let segment = &input[pos + 1..segment_end];

        match segment {
            [high, low, rest @ ..] if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() => {
                result.push((hex_value(*high) << 4) | hex_value(*low));
                result.extend_from_slice(rest);
            }
            _ => {
                tracing::debug!(position = pos, "malformed percent escape kept as is");

                result.push(b'%');
                result.extend_from_slice(segment);
            }
        }
    }

    Cow::Owned(result)
}

#[inline(always)]
const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
