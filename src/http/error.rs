//! Error responses for failures the server handles locally.

use tokio::io::AsyncWrite;

use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::write_unbuffered;

/// A request that ends in an HTTP error status.
///
/// `cause` is the offending piece of the request (the method token, the
/// resolved path), echoed in the HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub status: StatusCode,
    pub cause: String,
    pub message: &'static str,
}

impl ClientError {
    pub fn new(status: StatusCode, cause: impl Into<String>, message: &'static str) -> Self {
        Self {
            status,
            cause: cause.into(),
            message,
        }
    }

    pub fn bad_request(cause: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BadRequest,
            cause,
            "Tiny couldn't parse the request",
        )
    }

    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NotImplemented,
            method,
            "Tiny does not implement this method",
        )
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, path, "Tiny couldn't find this file")
    }

    pub fn unreadable(path: impl Into<String>) -> Self {
        Self::new(StatusCode::Forbidden, path, "Tiny couldn't read the file")
    }

    pub fn not_executable(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::Forbidden,
            path,
            "Tiny couldn't run the CGI program",
        )
    }

    /// HTML body naming the status, the explanation and the cause.
    pub fn html_body(&self) -> String {
        let mut body = String::from("<html><title>Tiny Error</title>");
        body.push_str("<body bgcolor=ffffff>\r\n");
        body.push_str(&format!(
            "{}: {}\r\n",
            self.status.as_u16(),
            self.status.reason_phrase()
        ));
        body.push_str(&format!("<p>{}: {}\r\n", self.message, self.cause));
        body.push_str("<hr><em>The Tiny Web server</em>\r\n");
        body
    }

    pub fn to_response(&self) -> Response {
        ResponseBuilder::new(self.status)
            .header("Content-type", "text/html")
            .sized_body(self.html_body().into_bytes())
            .build()
    }
}

/// Sends the complete error response for `err`.
pub async fn report<W>(stream: &mut W, err: &ClientError) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    tracing::info!(
        status = err.status.as_u16(),
        cause = %err.cause,
        "Rejecting request"
    );
    write_unbuffered(stream, &err.to_response()).await
}
