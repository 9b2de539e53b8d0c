//! CGI-style dispatch.
//!
//! Dynamic responses are produced in two phases:
//!
//! 1. [`commit`] writes `200 OK` and the server header. From here on the
//!    status cannot change; a failing worker can only leave the body short.
//! 2. [`Committed::run_worker`] spawns the program with its stdout set to
//!    the client socket and waits for that pid to be reaped.
//!
//! The request body is passed in the non-standard `body` environment
//! variable, not on the worker's stdin.

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStrExt;
use std::process::{Command, ExitStatus, Stdio};

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::content::target::ParsedTarget;
use crate::http::request::{Method, Request};
use crate::http::response::{ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::process::Reaper;

/// Environment variable carrying the raw POST body.
pub const BODY_VAR: &str = "body";

/// A connection whose `200 OK` head has been written.
pub struct Committed {
    stream: TcpStream,
}

/// Phase 1: write the status line and server header.
pub async fn commit(mut stream: TcpStream, server_name: &str) -> io::Result<Committed> {
    let head = ResponseBuilder::new(StatusCode::Ok)
        .header("Server", server_name)
        .build();
    ResponseWriter::new(&head)
        .write_to_stream(&mut stream)
        .await?;
    Ok(Committed { stream })
}

impl Committed {
    /// Phase 2: run the program at `target.path` with the client socket as
    /// its stdout and wait for it to be reaped.
    ///
    /// Returns the worker's exit status, or `None` when it never ran or its
    /// status was lost. Only failures to create a process at all are errors.
    pub async fn run_worker(
        self,
        request: &Request,
        target: &ParsedTarget,
        reaper: &Reaper,
    ) -> anyhow::Result<Option<ExitStatus>> {
        let mut stream = self.stream;
        stream.flush().await?;

        // The worker writes with plain blocking calls.
        let socket = stream.into_std()?;
        socket.set_nonblocking(false)?;

        let spawned = {
            let stdout = Stdio::from(OwnedFd::from(socket.try_clone()?));
            Command::new(&target.path)
                .envs(worker_env(request, target))
                .stdin(Stdio::null())
                .stdout(stdout)
                .spawn()
        };

        let child = match spawned {
            Ok(child) => child,
            Err(e) if is_fatal_spawn_error(&e) => {
                return Err(e).with_context(|| format!("spawning worker for {}", target.path));
            }
            Err(e) => {
                tracing::warn!(program = %target.path, error = %e, "CGI program failed to start");
                return Ok(None);
            }
        };

        let handle = reaper.track(child)?;
        let pid = handle.pid();
        tracing::debug!(pid, program = %target.path, query = %target.query, "Worker started");

        let status = handle.wait().await;
        match status {
            Some(s) if !s.success() => {
                tracing::warn!(pid, status = %s, program = %target.path, "Worker exited unsuccessfully");
            }
            None => tracing::warn!(pid, "Worker exit status unavailable"),
            _ => {}
        }

        drop(socket);
        Ok(status)
    }
}

/// Runs both phases; HEAD stops after the committed head.
pub async fn serve(
    stream: TcpStream,
    request: &Request,
    target: &ParsedTarget,
    server_name: &str,
    reaper: &Reaper,
) -> anyhow::Result<()> {
    let committed = commit(stream, server_name).await?;
    if request.method == Method::HEAD {
        return Ok(());
    }

    committed.run_worker(request, target, reaper).await?;
    Ok(())
}

/// Variables describing the request to the worker.
///
/// Values are cut at the first NUL byte, which an environment entry cannot
/// hold.
pub fn worker_env(request: &Request, target: &ParsedTarget) -> Vec<(&'static str, OsString)> {
    vec![
        ("QUERY_STRING", env_value(target.query.as_bytes())),
        ("REQUEST_METHOD", env_value(request.method_token.as_bytes())),
        ("CONTENT_TYPE", env_value(request.content_type().as_bytes())),
        ("CONTENT_LENGTH", env_value(request.raw_content_length().as_bytes())),
        (BODY_VAR, env_value(&request.body)),
    ]
}

fn env_value(raw: &[u8]) -> OsString {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    OsStr::from_bytes(&raw[..end]).to_os_string()
}

/// Spawn errors that mean no process could be created at all.
///
/// Everything else (a bad program file, an oversized environment, a loop
/// in the path) is the worker failing to exec and only costs this request
/// its body.
pub fn is_fatal_spawn_error(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error(),
        Some(libc::EAGAIN | libc::ENOMEM | libc::EMFILE | libc::ENFILE)
    )
}
