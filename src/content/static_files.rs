//! Static file responses.
//!
//! File bodies are never read into a buffer. The file is mapped read-only,
//! the mapping is written to the socket, and it is unmapped as soon as the
//! write completes.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::content::target::{FileMetadata, ParsedTarget};
use crate::http::mime::content_type_for;
use crate::http::request::Method;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;

/// A private, read-only mapping of a whole file. Unmapped on drop.
pub struct MappedFile {
    ptr: *mut libc::c_void,
    len: usize,
}

// The mapping is read-only and owned exclusively by this value.
unsafe impl Send for MappedFile {}
unsafe impl Sync for MappedFile {}

impl MappedFile {
    /// Maps the first `len` bytes of `path`. `len` must be non-zero.
    pub fn map(path: &Path, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty file",
            ));
        }

        let file = File::open(path)?;
        // SAFETY: fresh mapping of a valid descriptor; the result is checked
        // against MAP_FAILED before use. The descriptor may be closed once
        // the mapping exists.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { ptr, len })
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` points at `len` readable bytes until `drop`.
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.len) }
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` came from a successful mmap and are unmapped once.
        unsafe {
            libc::munmap(self.ptr, self.len);
        }
    }
}

/// Response head for a static file: status, server, length, type.
pub fn static_head(target: &ParsedTarget, meta: &FileMetadata, server_name: &str) -> Response {
    ResponseBuilder::new(StatusCode::Ok)
        .header("Server", server_name)
        .header("Content-length", meta.size.to_string())
        .header("Content-type", content_type_for(&target.path))
        .build()
}

/// Sends the head and, unless the method is HEAD, the file contents.
pub async fn serve<W>(
    stream: &mut W,
    method: &Method,
    target: &ParsedTarget,
    meta: &FileMetadata,
    server_name: &str,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = static_head(target, meta, server_name);
    ResponseWriter::new(&head).write_to_stream(stream).await?;

    if *method == Method::HEAD || meta.size == 0 {
        return Ok(());
    }

    let len = usize::try_from(meta.size).map_err(io::Error::other)?;
    let mapped = MappedFile::map(Path::new(&target.path), len)?;
    stream.write_all(mapped.as_slice()).await?;
    stream.flush().await?;
    drop(mapped);

    tracing::debug!(path = %target.path, bytes = len, "Served static file");
    Ok(())
}
