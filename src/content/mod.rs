//! Response content: target resolution, static files and CGI programs.

pub mod dynamic;
pub mod static_files;
pub mod target;

pub use target::{FileMetadata, ParsedTarget, TargetKind};
