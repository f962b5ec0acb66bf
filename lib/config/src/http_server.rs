use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Listener of the service. Every request it accepts passes through the entry middleware, which
/// opens the request scope.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Interface the service listens on. Use `127.0.0.1` to accept local clients only.
    ///
    /// Can also be set via the `HOST` environment variable.
    #[serde(default = "default_listen_host")]
    host: String,

    /// Port the service listens on. `0` lets the operating system pick a free one.
    ///
    /// Can also be set via the `PORT` environment variable.
    #[serde(default = "default_listen_port")]
    port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    4000
}

impl HttpServerConfig {
    /// `host:port`, as accepted by `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
