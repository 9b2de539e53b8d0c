use crate::http::request::{CONTENT_LENGTH, CONTENT_TYPE, Method};
use std::collections::HashMap;
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest request or header line accepted, terminator included.
pub const MAX_LINE: usize = 8192;

/// Headers the parser keeps. Matched by case-insensitive prefix.
const RECOGNIZED_HEADERS: [&str; 2] = [CONTENT_TYPE, CONTENT_LENGTH];

#[derive(Debug)]
pub enum ParseError {
    /// Peer closed the connection before sending a request line
    Closed,
    /// A line exceeded `MAX_LINE` bytes
    LineTooLong,
    Io(std::io::Error),
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Closed => f.write_str("connection closed before request line"),
            ParseError::LineTooLong => write!(f, "line longer than {} bytes", MAX_LINE),
            ParseError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// First line of a request, split into its three tokens.
///
/// `target` and `version` are empty when the client sent fewer tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// Method token as sent, before case folding
    pub method_token: String,
    pub target: String,
    pub version: String,
}

/// Reads and tokenizes the request line.
///
/// Tokens past the third are ignored.
pub async fn read_request_line<R>(reader: &mut R) -> Result<RequestLine, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let raw = read_line(reader).await?;
    if raw.is_empty() {
        return Err(ParseError::Closed);
    }

    let line = String::from_utf8_lossy(&raw);
    let mut parts = line.split_whitespace();

    let method_token = parts.next().unwrap_or("").to_string();
    let method = Method::from_token(&method_token);
    let target = parts.next().unwrap_or("").to_string();
    let version = parts.next().unwrap_or("").to_string();

    Ok(RequestLine {
        method,
        method_token,
        target,
        version,
    })
}

/// Reads header lines up to the blank line (or EOF), keeping only the
/// recognized ones.
pub async fn read_headers<R>(reader: &mut R) -> Result<HashMap<String, String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HashMap::new();

    loop {
        let raw = read_line(reader).await?;
        if raw.is_empty() {
            break;
        }

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if line.is_empty() {
            break;
        }

        match recognize_header(line) {
            Some((name, value)) => {
                headers.insert(name.to_string(), value.to_string());
            }
            None => tracing::debug!(header = line, "Ignoring header"),
        }
    }

    Ok(headers)
}

/// Reads a POST body of at most `length` bytes, and never more than
/// `MAX_LINE` whatever the client declared.
///
/// This is a single line-oriented read: a `\n` before the limit ends the
/// body there, newline included.
pub async fn read_body<R>(reader: &mut R, length: usize) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let limit = length.min(MAX_LINE);
    let mut body = Vec::with_capacity(limit);
    if limit == 0 {
        return Ok(body);
    }

    (&mut *reader)
        .take(limit as u64)
        .read_until(b'\n', &mut body)
        .await?;

    Ok(body)
}

/// Matches `line` against the recognized header names.
///
/// Returns the canonical name and the text after the name with the `:`
/// delimiter and a single following space removed.
pub fn recognize_header(line: &str) -> Option<(&'static str, &str)> {
    for name in RECOGNIZED_HEADERS {
        let prefix = line.as_bytes().get(..name.len())?;
        if prefix.eq_ignore_ascii_case(name.as_bytes()) {
            let rest = &line[name.len()..];
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            return Some((name, rest));
        }
    }

    None
}

async fn read_line<R>(reader: &mut R) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE as u64)
        .read_until(b'\n', &mut line)
        .await?;

    if n == MAX_LINE && line.last() != Some(&b'\n') {
        return Err(ParseError::LineTooLong);
    }

    Ok(line)
}
