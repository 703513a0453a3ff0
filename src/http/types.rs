//! Static protocol tables: status codes with their reason phrases and the
//! file extension to MIME type mapping.
//!
//! Both tables are plain `const` data generated by macros. Nothing here is
//! initialised at runtime, so lookups are safe from any thread without locking.

use crate::errors::ErrorKind;
use memchr::memrchr;

// TO LOWER CASE

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    //   x0    x1    x2    x3    x4    x5    x6    x7    x8    x9    xA    xB    xC    xD    xE    xF
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // 0x
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, // 1x
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, // 2x
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, // 3x
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 4x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, // 5x
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 6x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F, // 7x
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, // 8x
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F, // 9x
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, // Ax
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, // Bx
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF, // Cx
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF, // Dx
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF, // Ex
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF, // Fx
];

#[inline(always)]
pub(crate) fn into_lower_case(src: &[u8], result: &mut [u8]) -> usize {
    let len = src.len().min(result.len());
    for i in 0..len {
        result[i] = ASCII_TABLE[src[i] as usize];
    }
    len
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])*
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        /// HTTP status codes known to the server.
        ///
        /// The reason phrases are fixed and sent exactly as listed, e.g.
        /// `404 Not found`. A code outside this table cannot be represented,
        /// so a response with an unknown status can never be emitted. Raw
        /// numbers are converted with [`StatusCode::try_from`], which fails
        /// with [`ErrorKind::UnknownStatus`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])*
            $name = $num,
        )+ }

        impl StatusCode {
            /// Every status code of the table, in ascending order.
            pub const ALL: &'static [StatusCode] = &[$(StatusCode::$name,)+];

            /// Looks up a status code by its number.
            #[inline]
            pub const fn from_u16(code: u16) -> Option<Self> {
                match code {
                    $($num => Some(StatusCode::$name),)+
                    _ => None,
                }
            }

            /// Returns the reason phrase, e.g. `"Not found"` for `404`.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }

            // Returns the whole status line, e.g. `"HTTP/1.0 200 Ok\r\n"`.
            #[inline]
            pub(crate) const fn status_line(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => concat!("HTTP/1.0 ", $num, " ", $str, "\r\n"),
                )+ }
            }
        }
    }
}

impl StatusCode {
    /// Returns the numeric code.
    #[inline(always)]
    pub const fn as_u16(&self) -> u16 {
        *self as u16
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = ErrorKind;

    #[inline]
    fn try_from(code: u16) -> Result<Self, Self::Error> {
        StatusCode::from_u16(code).ok_or(ErrorKind::UnknownStatus(code))
    }
}

impl From<StatusCode> for u16 {
    #[inline(always)]
    fn from(status: StatusCode) -> u16 {
        status.as_u16()
    }
}

/// Returns the reason phrase for a raw status code, `None` if the code is
/// not in the table.
///
/// ```
/// use micro_web::reason_phrase;
///
/// assert_eq!(reason_phrase(404), Some("Not found"));
/// assert_eq!(reason_phrase(299), None);
/// ```
#[inline]
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code).map(|status| status.reason())
}

set_status_codes! {
    // 1xx
    Continue = (100, "Continue");
    SwitchingProtocols = (101, "Switching protocols");
    Processing = (102, "Processing");

    // 2xx
    Ok = (200, "Ok");
    Created = (201, "Created");
    Accepted = (202, "Accepted");
    NonAuthoritativeInformation = (203, "Non authoritative information");
    /// The body is still sent if the caller supplies one.
    NoContent = (204, "No content");
    ResetContent = (205, "Reset content");
    PartialContent = (206, "Partial content");
    MultiStatus = (207, "Multi status");
    AlreadyReported = (208, "Already reported");
    ImUsed = (226, "Im used");

    // 3xx
    MultipleChoices = (300, "Multiple choices");
    /// Pair with a `Location:` line in the extra headers.
    MovedPermanently = (301, "Moved permanently");
    /// Pair with a `Location:` line in the extra headers.
    Found = (302, "Found");
    SeeOther = (303, "See other");
    NotModified = (304, "Not modified");
    UseProxy = (305, "Use proxy");
    TemporaryRedirect = (307, "Temporary redirect");
    PermanentRedirect = (308, "Permanent redirect");

    // 4xx
    /// The usual answer to an [`ErrorKind`] produced by the request parser.
    BadRequest = (400, "Bad request");
    Unauthorized = (401, "Unauthorized");
    PaymentRequired = (402, "Payment required");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not found");
    MethodNotAllowed = (405, "Method not allowed");
    NotAcceptable = (406, "Not acceptable");
    ProxyAuthenticationRequired = (407, "Proxy authentication required");
    RequestTimeout = (408, "Request timeout");
    Conflict = (409, "Conflict");
    Gone = (410, "Gone");
    LengthRequired = (411, "Length required");
    PreconditionFailed = (412, "Precondition failed");
    RequestEntityTooLarge = (413, "Request entity too large");
    RequestUriTooLong = (414, "Request uri too long");
    UnsupportedMediaType = (415, "Unsupported media type");
    RequestRangeNotSatisfiable = (416, "Request range not satisfiable");
    ExpectationFailed = (417, "Expectation failed");
    /// [RFC 2324](https://datatracker.ietf.org/doc/html/rfc2324#section-2.3.2)
    IAmATeapot = (418, "I am a teapot");
    UnprocessableEntity = (422, "Unprocessable entity");
    Locked = (423, "Locked");
    FailedDependency = (424, "Failed dependency");
    UpgradeRequired = (426, "Upgrade required");
    PreconditionRequired = (428, "Precondition required");
    TooManyRequests = (429, "Too many requests");
    RequestHeaderFieldsTooLarge = (431, "Request header fields too large");

    // 5xx
    InternalServerError = (500, "Internal server error");
    NotImplemented = (501, "Not implemented");
    BadGateway = (502, "Bad gateway");
    ServiceUnavailable = (503, "Service unavailable");
    GatewayTimeout = (504, "Gateway timeout");
    HttpVersionNotSupported = (505, "Http version not supported");
    VariantAlsoNegotiates = (506, "Variant also negotiates");
    InsufficientStorage = (507, "Insufficient storage");
    LoopDetected = (508, "Loop detected");
    NotExtended = (510, "Not extended");
    NetworkAuthenticationRequired = (511, "Network authentication required");
}

// MIME TYPE

// Longest extension in the table, anything longer can't match.
const MAX_EXTENSION_LEN: usize = 4;

macro_rules! set_mime_types {
    ($(
        $name:ident = ($mime:literal, [$($ext:literal),+]);
    )+) => {
        /// MIME types served for known file extensions.
        ///
        /// Used by routers serving static files to pick a `Content-Type`.
        /// There is no content sniffing: unknown extensions yield `None`
        /// and the caller decides the fallback.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MimeType { $(
            #[doc = concat!("`", $mime, "`")]
            $name,
        )+ }

        impl MimeType {
            /// Returns the MIME type string, e.g. `"image/png"`.
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match self { $(
                    MimeType::$name => $mime,
                )+ }
            }

            /// Looks up a file extension without the leading dot.
            /// The lookup ignores ASCII case.
            ///
            /// ```
            /// use micro_web::MimeType;
            ///
            /// assert_eq!(MimeType::from_extension("png"), Some(MimeType::Png));
            /// assert_eq!(MimeType::from_extension("HTML"), Some(MimeType::Html));
            /// assert_eq!(MimeType::from_extension("exe"), None);
            /// ```
            #[inline]
            pub fn from_extension(ext: &str) -> Option<Self> {
                if ext.len() > MAX_EXTENSION_LEN {
                    return None;
                }

                let mut buffer = [0u8; MAX_EXTENSION_LEN];
                let len = into_lower_case(ext.as_bytes(), &mut buffer);

                match &buffer[..len] {
                    $($(| $ext)+ => Some(MimeType::$name),)+
                    _ => None,
                }
            }
        }
    };
}

set_mime_types! {
    Html = ("text/html", [b"htm", b"html"]);
    Text = ("text/plain", [b"txt"]);
    Png = ("image/png", [b"png"]);
    Jpeg = ("image/jpeg", [b"jpg", b"jpeg"]);
    Json = ("application/json", [b"json"]);
    Css = ("text/css", [b"css"]);
    Icon = ("image/vnd.microsoft.icon", [b"ico"]);
    Javascript = ("text/javascript", [b"js", b"cjs"]);
    Svg = ("image/svg+xml", [b"svg", b"vsg"]);
    Webp = ("image/webp", [b"webp"]);
    SourceMap = ("application/octet-stream", [b"map"]);
}

impl MimeType {
    /// Picks the MIME type from the extension of the last path segment.
    ///
    /// ```
    /// use micro_web::MimeType;
    ///
    /// assert_eq!(MimeType::from_path("/static/app.min.js"), Some(MimeType::Javascript));
    /// assert_eq!(MimeType::from_path("/img/LOGO.PNG"), Some(MimeType::Png));
    /// assert_eq!(MimeType::from_path("/v1.2/readme"), None);
    /// ```
    #[inline]
    pub fn from_path(path: &str) -> Option<Self> {
        let bytes = path.as_bytes();
        let segment_start = memrchr(b'/', bytes).map_or(0, |pos| pos + 1);
        let dot = memrchr(b'.', &bytes[segment_start..])?;

        MimeType::from_extension(&path[segment_start + dot + 1..])
    }
}

/// Returns the MIME type string for a file extension, `None` if unknown.
#[inline]
pub fn mime_type(ext: &str) -> Option<&'static str> {
    MimeType::from_extension(ext).map(|mime| mime.as_str())
}


#[cfg(test)]
mod mime_tests {
    use super::*;

    #[test]
    fn extension() {
        #[rustfmt::skip]
        let cases = [
            ("htm",  Some("text/html")),
            ("html", Some("text/html")),
            ("HtMl", Some("text/html")),
            ("txt",  Some("text/plain")),
            ("jpg",  Some("image/jpeg")),
            ("JPEG", Some("image/jpeg")),
            ("ico",  Some("image/vnd.microsoft.icon")),
            ("cjs",  Some("text/javascript")),
            ("svg",  Some("image/svg+xml")),
            ("vsg",  Some("image/svg+xml")),
            ("map",  Some("application/octet-stream")),

            ("",      None),
            (".png",  None),
            ("pngg",  None),
            ("jsonld", None),
            ("ĥtml",  None),
        ];

        for (ext, expected) in cases {
            assert_eq!(mime_type(ext), expected, "extension {ext:?}");
        }
    }

    #[test]
    fn path() {
        #[rustfmt::skip]
        let cases = [
            ("/index.html",         Some(MimeType::Html)),
            ("index.html",          Some(MimeType::Html)),
            ("/css/site.CSS",       Some(MimeType::Css)),
            ("/app.js.map",         Some(MimeType::SourceMap)),
            ("/a.b/favicon.ico",    Some(MimeType::Icon)),
            ("/logo.vsg",           Some(MimeType::Svg)),

            ("/",                   None),
            ("/a.b/noext",          None),
            ("/trailing.",          None),
            ("/archive.tar.gz",     None),
        ];

        for (path, expected) in cases {
            assert_eq!(MimeType::from_path(path), expected, "path {path:?}");
        }
    }
}
