use std::sync::Arc;

use crate::config::{Config, ContentConfig};
use crate::process::Reaper;

/// Everything a connection needs beyond its own socket.
///
/// Cloned into each [`Connection`](crate::http::connection::Connection);
/// the configuration is immutable and the reaper is the only shared mutable
/// state.
#[derive(Clone)]
pub struct ServeContext {
    pub config: Arc<Config>,
    pub reaper: Reaper,
}

impl ServeContext {
    pub fn new(config: Config, reaper: Reaper) -> Self {
        Self {
            config: Arc::new(config),
            reaper,
        }
    }

    pub fn server_name(&self) -> &str {
        &self.config.server.server_name
    }

    pub fn content(&self) -> &ContentConfig {
        &self.config.content
    }
}
