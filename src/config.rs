use serde::Deserialize;
use std::path::Path;

use anyhow::Context;

/// Server settings.
///
/// Everything has a default, so the server runs with no configuration file
/// at all. `TINY_CONFIG` may point at a YAML file overriding any subset of
/// the fields, and `LISTEN` overrides the bind host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host part of the listening address
    pub listen_host: String,
    /// TCP port; normally taken from the command line
    pub port: u16,
    /// Value of the `Server` response header
    pub server_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Prefix joined to every request-target
    pub document_root: String,
    /// Appended to targets ending in `/`
    pub default_document: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            port: 0,
            server_name: "Tiny Web Server".to_string(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            document_root: ".".to_string(),
            default_document: "home.html".to_string(),
        }
    }
}

impl Config {
    /// Builds the configuration for a server listening on `port`.
    pub fn load(port: u16) -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("TINY_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("LISTEN") {
            cfg.server.listen_host = host;
        }
        cfg.server.port = port;

        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.listen_host, self.server.port)
    }
}
