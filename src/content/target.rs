//! Request-target resolution.
//!
//! Maps a request-target onto the document root and decides whether the
//! request is served from a file or by running a CGI program.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::config::ContentConfig;
use crate::http::error::ClientError;

/// Targets containing this marker anywhere are dispatched to a program.
pub const CGI_MARKER: &str = "cgi-bin";

const OWNER_READ: u32 = 0o400;
const OWNER_EXECUTE: u32 = 0o100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Static,
    Dynamic,
}

/// Where a request-target points on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTarget {
    pub kind: TargetKind,
    /// Document root joined with the target (query string removed)
    pub path: String,
    /// Text after the first `?` of a dynamic target; always empty for static
    pub query: String,
}

impl ParsedTarget {
    pub fn resolve(target: &str, content: &ContentConfig) -> Self {
        if !target.contains(CGI_MARKER) {
            let mut path = format!("{}{}", content.document_root, target);
            if target.ends_with('/') {
                path.push_str(&content.default_document);
            }
            return Self {
                kind: TargetKind::Static,
                path,
                query: String::new(),
            };
        }

        let (script, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            kind: TargetKind::Dynamic,
            path: format!("{}{}", content.document_root, script),
            query: query.to_string(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.kind == TargetKind::Static
    }

    /// Checks the permission this kind of target needs: a readable regular
    /// file for static content, an executable one for a CGI program.
    pub fn check_access(&self, meta: &FileMetadata) -> Result<(), ClientError> {
        match self.kind {
            TargetKind::Static if !(meta.is_regular && meta.owner_readable()) => {
                Err(ClientError::unreadable(&self.path))
            }
            TargetKind::Dynamic if !(meta.is_regular && meta.owner_executable()) => {
                Err(ClientError::not_executable(&self.path))
            }
            _ => Ok(()),
        }
    }
}

/// File facts probed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub is_regular: bool,
    /// Permission bits (`st_mode & 0o7777`)
    pub mode: u32,
    pub size: u64,
}

impl FileMetadata {
    /// Stats `path`. Any failure to stat counts as the file not existing.
    pub async fn probe(path: impl AsRef<Path>) -> Option<Self> {
        let meta = tokio::fs::metadata(path.as_ref()).await.ok()?;
        Some(Self {
            is_regular: meta.is_file(),
            mode: meta.permissions().mode() & 0o7777,
            size: meta.len(),
        })
    }

    pub fn owner_readable(&self) -> bool {
        self.mode & OWNER_READ != 0
    }

    pub fn owner_executable(&self) -> bool {
        self.mode & OWNER_EXECUTE != 0
    }
}
