use tokio::io::BufReader;
use tokio::net::TcpStream;

use crate::content::target::{FileMetadata, ParsedTarget, TargetKind};
use crate::content::{dynamic, static_files};
use crate::context::ServeContext;
use crate::http::error::{self, ClientError};
use crate::http::parser::{self, ParseError, RequestLine};
use crate::http::request::{Method, Request};

/// One request/response transaction on an accepted socket.
///
/// The socket is closed when the connection is dropped after [`run`]
/// returns, whichever path produced the response.
///
/// [`run`]: Connection::run
pub struct Connection {
    stream: BufReader<TcpStream>,
    ctx: ServeContext,
}

impl Connection {
    pub fn new(stream: TcpStream, ctx: ServeContext) -> Self {
        Self {
            stream: BufReader::new(stream),
            ctx,
        }
    }

    /// Reads one request and writes exactly one response.
    ///
    /// Protocol and lookup failures are answered with an error page and
    /// return `Ok`. Only I/O and process failures are returned as errors.
    pub async fn run(self) -> anyhow::Result<()> {
        let Connection { mut stream, ctx } = self;

        let line = match parser::read_request_line(&mut stream).await {
            Ok(line) => line,
            Err(ParseError::Closed) => {
                tracing::debug!("Peer closed without sending a request");
                return Ok(());
            }
            Err(ParseError::LineTooLong) => {
                let err = ClientError::bad_request("request line too long");
                return reject(&mut stream, err).await;
            }
            Err(ParseError::Io(e)) => return Err(e.into()),
        };

        tracing::info!(
            method = %line.method,
            target = %line.target,
            version = %line.version,
            "Request"
        );

        if !line.method.is_supported() {
            let err = ClientError::not_implemented(line.method.as_str());
            return reject(&mut stream, err).await;
        }
        if line.target.is_empty() {
            let err = ClientError::bad_request("missing request-target");
            return reject(&mut stream, err).await;
        }

        let request = match read_request(&mut stream, line).await {
            Ok(request) => request,
            Err(ParseError::LineTooLong) => {
                let err = ClientError::bad_request("header line too long");
                return reject(&mut stream, err).await;
            }
            Err(ParseError::Closed) => return Ok(()),
            Err(ParseError::Io(e)) => return Err(e.into()),
        };

        let target = ParsedTarget::resolve(&request.target, ctx.content());

        let Some(meta) = FileMetadata::probe(&target.path).await else {
            let err = ClientError::not_found(&target.path);
            return reject(&mut stream, err).await;
        };
        if let Err(err) = target.check_access(&meta) {
            return reject(&mut stream, err).await;
        }

        match target.kind {
            TargetKind::Static => {
                static_files::serve(
                    &mut stream,
                    &request.method,
                    &target,
                    &meta,
                    ctx.server_name(),
                )
                .await?;
            }
            TargetKind::Dynamic => {
                dynamic::serve(
                    stream.into_inner(),
                    &request,
                    &target,
                    ctx.server_name(),
                    &ctx.reaper,
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn reject(stream: &mut BufReader<TcpStream>, err: ClientError) -> anyhow::Result<()> {
    error::report(stream, &err).await?;
    Ok(())
}

/// Reads the headers, plus the body for a POST, after the request line.
async fn read_request(
    stream: &mut BufReader<TcpStream>,
    line: RequestLine,
) -> Result<Request, ParseError> {
    let headers = parser::read_headers(stream).await?;

    let mut request = Request {
        method: line.method,
        method_token: line.method_token,
        target: line.target,
        version: line.version,
        headers,
        body: Vec::new(),
    };

    if request.method == Method::POST {
        let length = request.content_length();
        request.body = parser::read_body(stream, length).await?;
    }

    Ok(request)
}
