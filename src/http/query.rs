//! Zero-copy query string parser, shared by URL queries and form bodies.

use memchr::memchr;
use std::{collections::HashMap, error, fmt};

/// Zero-copy query string parser.
///
/// Keys and values are slices of the input; nothing is copied and nothing is
/// percent-decoded. Decode single values with [`unquote`](crate::unquote)
/// when needed.
///
/// Tokenizing rules:
/// - parameters are separated by `&`
/// - a parameter is split once, on its first `=`
/// - a parameter without `=` has the value `""`
/// - a leading `?` is **not** stripped, it becomes part of the first key
///
/// # Examples
/// ```rust
/// use micro_web::query::Query;
/// use std::collections::HashMap;
///
/// // Vec keeps order and duplicates
/// let pairs: Vec<(&str, &str)> = Query::parse("led=on&level=3&blink", 10).unwrap();
/// assert_eq!(pairs, [("led", "on"), ("level", "3"), ("blink", "")]);
///
/// // HashMap keeps the last value of a key
/// let map: HashMap<&str, &str> = Query::parse("level=1&level=2", 10).unwrap();
/// assert_eq!(map["level"], "2");
///
/// assert!(Query::parse::<Vec<(&str, &str)>>("a=1&b=2", 1).is_err());
/// ```
/// Edge cases:
/// ```rust
/// use micro_web::query::Query;
///
/// let params: Vec<(&str, &str)> = Query::parse("debug&name=&=Qwe&key=a=b&&", 10).unwrap();
///
/// assert_eq!(
///     params,
///     [("debug", ""), ("name", ""), ("", "Qwe"), ("key", "a=b"), ("", ""), ("", "")]
/// );
/// ```
pub struct Query;

impl Query {
    /// Parses a query string into a new collection.
    ///
    /// `query` is taken as is, a leading `?` included. An empty `query`
    /// gives an empty collection; more than `limit` parameters is an error.
    #[inline(always)]
    pub fn parse<'a, C: QueryCollector<'a>>(query: &'a str, limit: usize) -> Result<C, Error> {
        let mut collector = C::with_capacity(limit.min(Self::CAPACITY_HINT));
        Self::parse_into(&mut collector, query, limit)?;
        Ok(collector)
    }

    /// Parses a query string into an existing collection, appending to it.
    ///
    /// The limit applies to the collection length, so parameters already
    /// present count against it.
    ///
    /// # Examples
    /// ```
    /// use micro_web::query::Query;
    ///
    /// let mut fields = Vec::new();
    /// Query::parse_into(&mut fields, "ssid=home&psk=x", 3).unwrap();
    /// Query::parse_into(&mut fields, "channel=6", 3).unwrap();
    /// assert_eq!(fields.len(), 3);
    ///
    /// // Full already
    /// assert!(Query::parse_into(&mut fields, "mode=ap", 3).is_err());
    ///
    /// // Values stay encoded
    /// let mut fields = Vec::new();
    /// Query::parse_into(&mut fields, "email=user%40example.com", 3).unwrap();
    /// assert_eq!(fields[0].1, "user%40example.com");
    /// ```
    #[inline]
    pub fn parse_into<'a, C: QueryCollector<'a>>(
        collector: &mut C,
        query: &'a str,
        limit: usize,
    ) -> Result<(), Error> {
        if query.is_empty() {
            return Ok(());
        }

        // Every `&` opens a new parameter, a trailing one included
        let mut rest = Some(query);

        while let Some(text) = rest {
            if collector.length() >= limit {
                return Err(Error::OverLimit(limit));
            }

            let (pair, tail) = split_at(text, b'&');
            let (key, value) = split_at(pair, b'=');

            collector.add_param(key, value.unwrap_or(""));
            rest = tail;
        }

        Ok(())
    }

    // Keeps small limits from turning into large upfront allocations
    const CAPACITY_HINT: usize = 16;
}

/// Parses a query string into a map, without a parameter limit.
///
/// Repeated keys keep the last value. An empty string gives an empty map.
///
/// ```
/// use micro_web::parse_query_string;
///
/// assert!(parse_query_string("").is_empty());
///
/// let params = parse_query_string("a=1&b=2&a=3&flag");
/// assert_eq!(params.len(), 3);
/// assert_eq!(params["a"], "3");
/// assert_eq!(params["b"], "2");
/// assert_eq!(params["flag"], "");
/// ```
#[inline]
pub fn parse_query_string(query: &str) -> HashMap<&str, &str> {
    let mut result = HashMap::new();
    // No limit, so parsing can't fail
    let _ = Query::parse_into(&mut result, query, usize::MAX);
    result
}

// Splits at the first `byte`. Separators are ASCII, so both halves are valid `str`s
#[inline(always)]
fn split_at(text: &str, byte: u8) -> (&str, Option<&str>) {
    match memchr(byte, text.as_bytes()) {
        Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
        None => (text, None),
    }
}

/// Destination for parsed parameters, borrowing from the input (`'a`).
///
/// # Examples
/// ```rust
/// use micro_web::query::{Query, QueryCollector};
///
/// struct Keys(Vec<String>);
///
/// impl<'a> QueryCollector<'a> for Keys {
///     fn add_param(&mut self, key: &'a str, _value: &'a str) {
///         self.0.push(key.to_uppercase());
///     }
///
///     fn length(&self) -> usize {
///         self.0.len()
///     }
///
///     fn with_capacity(capacity: usize) -> Self {
///         Keys(Vec::with_capacity(capacity))
///     }
/// }
///
/// let keys: Keys = Query::parse("a=1&b", 4).unwrap();
/// assert_eq!(keys.0, ["A", "B"]);
/// ```
pub trait QueryCollector<'a>
where
    Self: Sized,
{
    fn add_param(&mut self, key: &'a str, value: &'a str);

    /// Number of stored parameters, compared against the limit.
    // `length` rather than `len` keeps clippy from asking for `is_empty`
    fn length(&self) -> usize;

    fn with_capacity(capacity: usize) -> Self;
}

impl<'a> QueryCollector<'a> for Vec<(&'a str, &'a str)> {
    #[inline(always)]
    fn add_param(&mut self, key: &'a str, value: &'a str) {
        self.push((key, value));
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }
}

// Last value wins
impl<'a> QueryCollector<'a> for HashMap<&'a str, &'a str> {
    #[inline(always)]
    fn add_param(&mut self, key: &'a str, value: &'a str) {
        self.insert(key, value);
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }
}

/// Query parsing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// More parameters than allowed; holds the limit.
    OverLimit(usize),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OverLimit(limit) => {
                write!(f, "Query parameter limit exceeded: limit={}", limit)
            }
        }
    }
}
