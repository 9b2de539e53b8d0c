//! Child process management for CGI workers.

pub mod reaper;

pub use reaper::{Reaper, WorkerHandle};
