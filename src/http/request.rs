use crate::{
    errors::ErrorKind,
    limits::ReqLimits,
    query::{parse_query_string, Query},
};
use memchr::{memchr, memmem};
use std::collections::HashMap;

/// Method [`post_params`] expects when the caller has no other preference.
pub const DEFAULT_POST_METHOD: &str = "POST";

/// Zero-copy view of one complete HTTP request.
///
/// All fields borrow from the raw buffer handed to [`Request::parse`], which
/// is never modified. Reassembling a request from several socket reads is
/// the caller's job: the buffer must already hold the whole request.
///
/// # Input format
///
/// - `SP`: one or more ASCII whitespace bytes
/// - `CRLF`: `"\r\n"`, the only accepted line terminator
///
/// ```text
/// [METHOD] SP [PATH][?QUERY] SP [VERSION] CRLF
/// [NAME]: [VALUE] CRLF
/// ...
/// CRLF
/// [BODY]
/// ```
///
/// | Part      | Rule                                                                   |
/// |-----------|------------------------------------------------------------------------|
/// | `METHOD`  | Leading run of `A-Z`, at least one letter                              |
/// | `PATH`    | Starts with `/`, longest run of `/` and `[-a-zA-Z0-9_.]`              |
/// | `QUERY`   | After the first `?`, up to the next whitespace                         |
/// | `VERSION` | Not interpreted                                                        |
/// | `BODY`    | Everything after the first blank line, taken as is                     |
///
/// The request line must be valid UTF-8. Headers are only looked at on
/// demand, see [`Request::header`].
///
/// Characters outside the path alphabet end the path: for
/// `GET /a%20b HTTP/1.0` the path is `/a`. Decode and route on the query
/// string if you need more.
///
/// # Examples
/// ```
/// use micro_web::Request;
///
/// let raw = b"GET /led/set?color=red&level=3 HTTP/1.0\r\nHost: lamp\r\n\r\n";
/// let req = Request::parse(raw).unwrap();
///
/// assert_eq!(req.method(), "GET");
/// assert_eq!(req.path(), "/led/set");
/// assert_eq!(req.query_string(), "color=red&level=3");
/// assert_eq!(req.query_params().unwrap()["level"], "3");
/// assert_eq!(req.header("host"), Some("lamp"));
/// assert_eq!(req.body(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request<'a> {
    raw: &'a [u8],

    method: &'a str,
    path: &'a str,
    query: &'a str,

    body: Option<&'a [u8]>,

    query_params: usize,
    header_count: usize,
}

impl<'a> Request<'a> {
    /// Parses a request with [`ReqLimits::default`].
    #[inline]
    pub fn parse(raw: &'a [u8]) -> Result<Self, ErrorKind> {
        Self::parse_with(raw, &ReqLimits::default())
    }

    /// Parses a request with custom limits.
    ///
    /// # Errors
    /// - [`ErrorKind::FirstLineTooLarge`]: request line over the limit
    /// - [`ErrorKind::InvalidEncoding`]: request line is not UTF-8
    /// - [`ErrorKind::InvalidMethod`]: no uppercase method token
    /// - [`ErrorKind::InvalidUrl`]: no whitespace and `/` after the method
    /// - [`ErrorKind::BodyTooLarge`]: body over the limit
    pub fn parse_with(raw: &'a [u8], limits: &ReqLimits) -> Result<Self, ErrorKind> {
        match Self::impl_parse(raw, limits) {
            Ok(request) => Ok(request),
            Err(err) => {
                tracing::debug!(error = %err, len = raw.len(), "rejected request");
                Err(err)
            }
        }
    }

    #[inline(always)]
    fn impl_parse(raw: &'a [u8], limits: &ReqLimits) -> Result<Self, ErrorKind> {
        let line = first_line(raw, limits)?;

        let (method, method_end) = parse_method(line)?;
        let path = parse_path(line, method_end)?;
        let query = parse_query(line);

        let body = split_body(raw);
        if body.is_some_and(|body| body.len() > limits.body_size) {
            return Err(ErrorKind::BodyTooLarge);
        }

        Ok(Request {
            raw,

            method,
            path,
            query,

            body,

            query_params: limits.query_params,
            header_count: limits.header_count,
        })
    }
}

// Public API
impl<'a> Request<'a> {
    /// Returns the raw request buffer.
    #[inline(always)]
    pub const fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Returns the method token, e.g. `"GET"`.
    #[inline(always)]
    pub const fn method(&self) -> &'a str {
        self.method
    }

    /// Returns the path, e.g. `"/api/users"` for `/api/users?id=1`.
    #[inline(always)]
    pub const fn path(&self) -> &'a str {
        self.path
    }

    /// Returns the raw query string without the `?`, `""` if there is none.
    #[inline(always)]
    pub const fn query_string(&self) -> &'a str {
        self.query
    }

    /// Parses the query string into a map (last duplicate wins).
    /// Values are not percent-decoded.
    ///
    /// # Errors
    /// [`ErrorKind::Query`] when there are more parameters than
    /// [`ReqLimits::query_params`].
    #[inline]
    pub fn query_params(&self) -> Result<HashMap<&'a str, &'a str>, ErrorKind> {
        Ok(Query::parse(self.query, self.query_params)?)
    }

    /// Returns the body: everything after the first blank line.
    ///
    /// `None` when there is no blank line or nothing follows it.
    #[inline(always)]
    pub const fn body(&self) -> Option<&'a [u8]> {
        self.body
    }

    /// Returns the body as UTF-8 text.
    ///
    /// # Errors
    /// [`ErrorKind::InvalidEncoding`] if the body is not valid UTF-8.
    #[inline]
    pub fn body_str(&self) -> Result<Option<&'a str>, ErrorKind> {
        self.body.map(utf8).transpose()
    }

    /// Parses the body as a query string if the method is `expected_method`.
    ///
    /// Returns `Ok(None)` for any other method, so a handler can serve
    /// `POST`, `PUT` or anything else with form-encoded bodies. A matching
    /// request without a body gives an empty map.
    ///
    /// ```
    /// use micro_web::Request;
    ///
    /// let req = Request::parse(b"PUT /cfg HTTP/1.0\r\n\r\nmode=eco&led").unwrap();
    ///
    /// assert_eq!(req.post_params("POST"), Ok(None));
    ///
    /// let params = req.post_params("PUT").unwrap().unwrap();
    /// assert_eq!(params["mode"], "eco");
    /// assert_eq!(params["led"], "");
    /// ```
    ///
    /// # Errors
    /// - [`ErrorKind::InvalidEncoding`]: body is not UTF-8
    /// - [`ErrorKind::Query`]: too many parameters
    pub fn post_params(
        &self,
        expected_method: &str,
    ) -> Result<Option<HashMap<&'a str, &'a str>>, ErrorKind> {
        if self.method != expected_method {
            return Ok(None);
        }

        let body = self.body_str()?.unwrap_or("");
        Ok(Some(Query::parse(body, self.query_params)?))
    }

    /// Returns the first header value with case-insensitive name matching.
    ///
    /// The value is trimmed of surrounding spaces and tabs. Headers that
    /// are not valid UTF-8 are skipped. At most
    /// [`ReqLimits::header_count`] lines are scanned.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        find_header(self.raw, name, self.header_count)
    }
}

// Free functions over a raw request, without limits

/// Returns the method token of a raw request.
///
/// ```
/// assert_eq!(micro_web::method(b"DELETE /x HTTP/1.0\r\n\r\n"), Ok("DELETE"));
/// ```
///
/// # Errors
/// [`ErrorKind::InvalidMethod`] if the request line does not start with
/// an uppercase letter; see also [`Request::parse_with`].
#[inline]
pub fn method(raw: &[u8]) -> Result<&str, ErrorKind> {
    let line = first_line(raw, &ReqLimits::unbounded())?;
    parse_method(line).map(|(method, _)| method)
}

/// Returns the path of a raw request.
///
/// ```
/// assert_eq!(micro_web::path(b"GET /a/b.txt?x=1 HTTP/1.0\r\n\r\n"), Ok("/a/b.txt"));
/// ```
///
/// # Errors
/// [`ErrorKind::InvalidUrl`] if no whitespace and `/` follow the method.
#[inline]
pub fn path(raw: &[u8]) -> Result<&str, ErrorKind> {
    let line = first_line(raw, &ReqLimits::unbounded())?;
    let (_, method_end) = parse_method(line)?;
    parse_path(line, method_end)
}

/// Returns the query string of a raw request, `""` if there is none.
///
/// A missing query is never an error; only an unreadable request line is.
///
/// ```
/// assert_eq!(micro_web::query_string(b"GET /?a=1&b HTTP/1.0\r\n\r\n"), Ok("a=1&b"));
/// assert_eq!(micro_web::query_string(b"GET / HTTP/1.0\r\n\r\n"), Ok(""));
/// ```
#[inline]
pub fn query_string(raw: &[u8]) -> Result<&str, ErrorKind> {
    first_line(raw, &ReqLimits::unbounded()).map(parse_query)
}

/// Parses the query string of a raw request into a map, see
/// [`parse_query_string`]. There is no parameter limit.
///
/// ```
/// let params = micro_web::query_params(b"GET /set?led=on&led=off HTTP/1.0\r\n\r\n").unwrap();
/// assert_eq!(params["led"], "off");
/// ```
///
/// # Errors
/// Those of [`query_string`].
#[inline]
pub fn query_params(raw: &[u8]) -> Result<HashMap<&str, &str>, ErrorKind> {
    query_string(raw).map(parse_query_string)
}

/// Returns everything after the first blank line, `None` if there is no
/// blank line or nothing follows it.
///
/// ```
/// assert_eq!(micro_web::body(b"POST / HTTP/1.0\r\n\r\na=1"), Some(&b"a=1"[..]));
/// assert_eq!(micro_web::body(b"GET / HTTP/1.0\r\n\r\n"), None);
/// ```
#[inline]
pub fn body(raw: &[u8]) -> Option<&[u8]> {
    split_body(raw)
}

/// Parses the body as a query string if the method is `expected_method`.
/// Pass [`DEFAULT_POST_METHOD`] for forms.
///
/// Only the method token is checked: the request target may be anything,
/// `*` or an absolute URI included. `Ok(None)` for any other method, an
/// empty map for a matching request without a body. There is no size or
/// parameter limit; use [`Request::parse_with`] for those.
///
/// ```
/// use micro_web::{post_params, DEFAULT_POST_METHOD};
///
/// let raw = b"POST /login HTTP/1.0\r\nContent-Length: 15\r\n\r\nuser=ann&pin=42";
/// let params = post_params(raw, DEFAULT_POST_METHOD).unwrap().unwrap();
/// assert_eq!(params["pin"], "42");
///
/// assert_eq!(post_params(b"GET /login HTTP/1.0\r\n\r\n", DEFAULT_POST_METHOD), Ok(None));
/// ```
///
/// # Errors
/// - [`ErrorKind::InvalidMethod`], [`ErrorKind::InvalidEncoding`] for the request line
/// - [`ErrorKind::InvalidEncoding`]: body is not UTF-8
pub fn post_params<'a>(
    raw: &'a [u8],
    expected_method: &str,
) -> Result<Option<HashMap<&'a str, &'a str>>, ErrorKind> {
    if method(raw)? != expected_method {
        return Ok(None);
    }

    let body = split_body(raw).map(utf8).transpose()?.unwrap_or("");
    Ok(Some(parse_query_string(body)))
}

/// [`post_params`] with [`DEFAULT_POST_METHOD`].
///
/// ```
/// let raw = b"POST /led HTTP/1.0\r\n\r\non=1";
/// assert_eq!(micro_web::post_params_default(raw).unwrap().unwrap()["on"], "1");
/// ```
#[inline]
pub fn post_params_default(raw: &[u8]) -> Result<Option<HashMap<&str, &str>>, ErrorKind> {
    post_params(raw, DEFAULT_POST_METHOD)
}

/// Returns the first value of the named header, ignoring ASCII case.
///
/// ```
/// let raw = b"GET / HTTP/1.0\r\nContent-Type:  text/plain \r\n\r\n";
/// assert_eq!(micro_web::header(raw, "content-type"), Some("text/plain"));
/// ```
#[inline]
pub fn header<'a>(raw: &'a [u8], name: &str) -> Option<&'a str> {
    find_header(raw, name, usize::MAX)
}

// Request line

#[inline]
fn first_line<'a>(raw: &'a [u8], limits: &ReqLimits) -> Result<&'a str, ErrorKind> {
    let max = limits.first_line_size;
    let window = &raw[..raw.len().min(max.saturating_add(2))];

    let end = match memmem::find(window, b"\r\n").filter(|end| *end <= max) {
        Some(end) => end,
        None if raw.len() <= max => raw.len(),
        None => return Err(ErrorKind::FirstLineTooLarge),
    };

    utf8(&raw[..end])
}

#[inline]
fn parse_method(line: &str) -> Result<(&str, usize), ErrorKind> {
    let end = line
        .bytes()
        .position(|byte| !byte.is_ascii_uppercase())
        .unwrap_or(line.len());

    match end {
        0 => Err(ErrorKind::InvalidMethod),
        end => Ok((&line[..end], end)),
    }
}

#[inline]
fn parse_path(line: &str, method_end: usize) -> Result<&str, ErrorKind> {
    let bytes = line.as_bytes();

    let start = bytes[method_end..]
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .map(|pos| method_end + pos)
        .filter(|start| *start > method_end)
        .ok_or(ErrorKind::InvalidUrl)?;

    if bytes[start] != b'/' {
        return Err(ErrorKind::InvalidUrl);
    }

    let end = bytes[start..]
        .iter()
        .position(|byte| !is_path_byte(*byte))
        .map_or(bytes.len(), |pos| start + pos);

    Ok(&line[start..end])
}

#[inline(always)]
const fn is_path_byte(byte: u8) -> bool {
    matches!(byte, b'/' | b'-' | b'_' | b'.' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9')
}

// `""` unless a `?` is followed by at least one byte and then whitespace
#[inline]
fn parse_query(line: &str) -> &str {
    let Some(mark) = memchr(b'?', line.as_bytes()) else {
        return "";
    };

    let start = mark + 1;
    match line.as_bytes()[start..]
        .iter()
        .position(|byte| byte.is_ascii_whitespace())
    {
        Some(len) => &line[start..start + len],
        None => "",
    }
}

// Headers & body

#[inline]
fn split_body(raw: &[u8]) -> Option<&[u8]> {
    let start = memmem::find(raw, b"\r\n\r\n")? + 4;
    raw.get(start..).filter(|body| !body.is_empty())
}

fn find_header<'a>(raw: &'a [u8], name: &str, max_count: usize) -> Option<&'a str> {
    let line_end = memmem::find(raw, b"\r\n")?;
    let block_end = memmem::find(raw, b"\r\n\r\n").map_or(raw.len(), |pos| pos + 2);
    let block = raw.get(line_end + 2..block_end)?;

    let mut start = 0;
    for _ in 0..max_count {
        if start >= block.len() {
            break;
        }

        let end = memchr(b'\n', &block[start..]).map_or(block.len(), |pos| start + pos);
        let line = &block[start..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if let Some(colon) = memchr(b':', line) {
            if line[..colon].eq_ignore_ascii_case(name.as_bytes()) {
                if let Ok(value) = utf8(trim_ows(&line[colon + 1..])) {
                    return Some(value);
                }
            }
        }

        start = end + 1;
    }

    None
}

#[inline]
fn trim_ows(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

#[inline(always)]
fn utf8(bytes: &[u8]) -> Result<&str, ErrorKind> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| ErrorKind::InvalidEncoding)
}


#[cfg(test)]
mod request_tests {
    use super::*;

    #[test]
    fn parse_valid_request() {
        let raw = b"GET /a/b?x=1 HTTP/1.0\r\nHost: localhost\r\n\r\n";
        let req = Request::parse(raw).unwrap();

        assert_eq!(req.raw(), raw);
        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.query_string(), "x=1");
        assert_eq!(req.query_params().unwrap(), HashMap::from([("x", "1")]));
        assert_eq!(req.body(), None);
        assert_eq!(req.body_str(), Ok(None));
        assert_eq!(req.header("HOST"), Some("localhost"));
    }

    #[test]
    fn parse_invalid_request() {
        #[rustfmt::skip]
        let cases: [(&[u8], ErrorKind); 5] = [
            (b"",                             ErrorKind::InvalidMethod),
            (b"hello",                        ErrorKind::InvalidMethod),
            (b"GET\r\n\r\n",                  ErrorKind::InvalidUrl),
            (b"GET index.html HTTP/1.0\r\n",  ErrorKind::InvalidUrl),
            (b"GET /\xC3 HTTP/1.0\r\n\r\n",   ErrorKind::InvalidEncoding),
        ];

        for (raw, expected) in cases {
            assert_eq!(Request::parse(raw), Err(expected), "request {raw:?}");
        }
    }

    #[test]
    fn missing_query() {
        let req = Request::parse(b"GET /status HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(req.query_string(), "");
        assert!(req.query_params().unwrap().is_empty());
        assert!(query_params(b"GET /status HTTP/1.0\r\n\r\n").unwrap().is_empty());
    }

    #[test]
    fn query_params_last_wins() {
        let params = query_params(b"GET /?a=1&b=2&a=3&flag HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(
            params,
            HashMap::from([("a", "3"), ("b", "2"), ("flag", "")])
        );
    }

    #[test]
    fn body() {
        #[rustfmt::skip]
        let cases: [(&str, Option<&str>); 6] = [
            ("POST / HTTP/1.0\r\n\r\na=1",                  Some("a=1")),
            ("POST / HTTP/1.0\r\nX: y\r\n\r\na=1\r\nb=2",   Some("a=1\r\nb=2")),
            ("POST / HTTP/1.0\r\n\r\n\r\n",                 Some("\r\n")),
            ("POST / HTTP/1.0\r\n\r\n",                     None),
            ("POST / HTTP/1.0\r\nX: y\r\n",                 None),
            ("POST /",                                      None),
        ];

        for (raw, expected) in cases {
            let expected = expected.map(str::as_bytes);

            assert_eq!(super::body(raw.as_bytes()), expected, "request {raw:?}");
            assert_eq!(Request::parse(raw.as_bytes()).unwrap().body(), expected);
        }
    }

    #[test]
    fn body_limit() {
        let limits = ReqLimits {
            body_size: 4,
            ..ReqLimits::default()
        };

        assert!(Request::parse_with(b"POST / HTTP/1.0\r\n\r\n1234", &limits).is_ok());
        assert_eq!(
            Request::parse_with(b"POST / HTTP/1.0\r\n\r\n12345", &limits),
            Err(ErrorKind::BodyTooLarge)
        );
    }

    #[test]
    fn post_params() {
        let post = b"POST /form HTTP/1.0\r\nContent-Length: 7\r\n\r\na=1&b=2";
        let get = b"GET /form?a=1 HTTP/1.0\r\n\r\n";

        assert_eq!(
            super::post_params(post, DEFAULT_POST_METHOD),
            Ok(Some(HashMap::from([("a", "1"), ("b", "2")])))
        );
        assert_eq!(super::post_params(get, DEFAULT_POST_METHOD), Ok(None));
        assert_eq!(super::post_params(post, "PUT"), Ok(None));
        assert_eq!(super::post_params(get, "GET"), Ok(Some(HashMap::new())));

        assert_eq!(post_params_default(post), super::post_params(post, "POST"));
        assert_eq!(post_params_default(get), Ok(None));
    }

    #[test]
    fn post_params_errors() {
        assert_eq!(
            super::post_params(b"POST / HTTP/1.0\r\n\r\n\xFF=1", DEFAULT_POST_METHOD),
            Err(ErrorKind::InvalidEncoding)
        );
        // A non-matching method never looks at the body
        assert_eq!(
            super::post_params(b"GET / HTTP/1.0\r\n\r\n\xFF=1", DEFAULT_POST_METHOD),
            Ok(None)
        );

        let limits = ReqLimits {
            query_params: 2,
            ..ReqLimits::default()
        };
        let req = Request::parse_with(b"POST / HTTP/1.0\r\n\r\na&b&c", &limits).unwrap();
        assert_eq!(
            req.post_params(DEFAULT_POST_METHOD),
            Err(ErrorKind::Query(crate::query::Error::OverLimit(2)))
        );
    }

    #[test]
    fn post_params_any_target() {
        type Expected = Result<Option<HashMap<&'static str, &'static str>>, ErrorKind>;

        #[rustfmt::skip]
        let cases: [(&[u8], Expected); 6] = [
            (b"GET * HTTP/1.0\r\n\r\n",                            Ok(None)),
            (b"OPTIONS * HTTP/1.0\r\n\r\na=1",                     Ok(None)),
            (b"POST * HTTP/1.0\r\n\r\na=1",                        Ok(Some(HashMap::from([("a", "1")])))),
            (b"POST http://dev/cfg HTTP/1.0\r\n\r\nx=&y",          Ok(Some(HashMap::from([("x", ""), ("y", "")])))),
            (b"POST\r\n\r\nk=v",                                    Ok(Some(HashMap::from([("k", "v")])))),
            (b"post / HTTP/1.0\r\n\r\nk=v",                        Err(ErrorKind::InvalidMethod)),
        ];

        for (raw, expected) in cases {
            assert_eq!(super::post_params(raw, DEFAULT_POST_METHOD), expected, "request {raw:?}");
        }
    }

    #[test]
    fn free_functions_are_unbounded() {
        let long_path = format!("GET /{} HTTP/1.0\r\n\r\n", "a".repeat(600));
        assert_eq!(method(long_path.as_bytes()), Ok("GET"));
        assert_eq!(path(long_path.as_bytes()).map(str::len), Ok(601));
        assert_eq!(
            Request::parse(long_path.as_bytes()),
            Err(ErrorKind::FirstLineTooLarge)
        );

        let query = (0..40).map(|i| format!("k{i}=v")).collect::<Vec<_>>().join("&");
        let raw = format!("GET /?{query} HTTP/1.0\r\n\r\n");
        assert_eq!(query_params(raw.as_bytes()).map(|params| params.len()), Ok(40));
        assert_eq!(query_string(raw.as_bytes()), Ok(query.as_str()));

        let form = (0..1000).map(|i| format!("f{i}=1")).collect::<Vec<_>>().join("&");
        let raw = format!("POST /upload HTTP/1.0\r\n\r\n{form}");
        assert!(form.len() > ReqLimits::default().body_size);

        let params = super::post_params(raw.as_bytes(), DEFAULT_POST_METHOD).unwrap().unwrap();
        assert_eq!(params.len(), 1000);
        assert_eq!(super::body(raw.as_bytes()).map(<[u8]>::len), Some(form.len()));
        assert_eq!(
            Request::parse(raw.as_bytes()),
            Err(ErrorKind::BodyTooLarge)
        );
    }

    #[test]
    fn never_mutates_input() {
        let raw = b"POST /a?b=c HTTP/1.0\r\nX: 1\r\n\r\nd=%20".to_vec();
        let copy = raw.clone();

        let req = Request::parse(&raw).unwrap();
        let _ = req.query_params();
        let _ = req.post_params(DEFAULT_POST_METHOD);
        let _ = req.header("x");

        assert_eq!(raw, copy);
    }
}
