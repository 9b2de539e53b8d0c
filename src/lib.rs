//! Tiny - an iterative HTTP/1.0 server
//!
//! Serves static files from a document root and runs CGI programs found
//! under `cgi-bin`, one connection at a time.

pub mod config;
pub mod content;
pub mod context;
pub mod http;
pub mod process;
pub mod server;
