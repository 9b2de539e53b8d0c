use std::collections::HashMap;
use std::fmt;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";

/// HTTP request methods.
///
/// Only GET, HEAD and POST are served. Anything else is carried as `Other`
/// so the connection handler can name it in the 501 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Submit data to a CGI program
    POST,
    /// Any other token, kept verbatim
    Other(String),
}

/// Represents a parsed HTTP request from a client.
///
/// Only `Content-Type` and `Content-Length` survive parsing; every other
/// header is dropped by the parser. The body is empty unless the request is
/// a POST with a positive `Content-Length`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// Method token exactly as the client sent it (e.g., "post")
    pub method_token: String,
    /// The request-target exactly as sent (e.g., "/cgi-bin/adder?1&2")
    pub target: String,
    /// Protocol version token; empty when the client omitted it
    pub version: String,
    /// Recognized headers keyed by their canonical name
    pub headers: HashMap<String, String>,
    /// Raw POST body
    pub body: Vec<u8>,
}

impl Method {
    /// Parses a method token. Matching is ASCII case-insensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use tiny_web::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("head"), Method::HEAD);
    /// assert_eq!(Method::from_token("PUT"), Method::Other("PUT".to_string()));
    /// ```
    pub fn from_token(s: &str) -> Self {
        if s.eq_ignore_ascii_case("GET") {
            Method::GET
        } else if s.eq_ignore_ascii_case("HEAD") {
            Method::HEAD
        } else if s.eq_ignore_ascii_case("POST") {
            Method::POST
        } else {
            Method::Other(s.to_string())
        }
    }

    /// Whether the server implements this method.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Method::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Request {
    /// Retrieves a recognized header value by its canonical name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Raw `Content-Type` value, empty when the client sent none.
    pub fn content_type(&self) -> &str {
        self.header(CONTENT_TYPE).unwrap_or("")
    }

    /// Raw `Content-Length` value, empty when the client sent none.
    pub fn raw_content_length(&self) -> &str {
        self.header(CONTENT_LENGTH).unwrap_or("")
    }

    /// Declared body length.
    ///
    /// Reads the leading decimal digits of the raw value; a missing header
    /// or a value without leading digits counts as 0.
    pub fn content_length(&self) -> usize {
        parse_leading_digits(self.raw_content_length())
    }
}

fn parse_leading_digits(raw: &str) -> usize {
    let raw = raw.trim_start();
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().unwrap_or(0)
}
