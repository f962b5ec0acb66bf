use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    /// Name of the scope opened for every inbound request.
    #[serde(default = "default_entry_scope")]
    pub entry_scope: String,

    /// Header read into the `session_id` attribute.
    #[serde(default = "default_session_header")]
    pub session_header: String,

    /// Upper bound, in bytes, for request and response bodies copied into the scope. Larger
    /// bodies are recorded as empty and still passed on.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default)]
    pub record: RecordConfig,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            entry_scope: default_entry_scope(),
            session_header: default_session_header(),
            max_body_size: default_max_body_size(),
            record: RecordConfig::default(),
        }
    }
}

fn default_entry_scope() -> String {
    "service-handler".to_string()
}

fn default_session_header() -> String {
    "x-session-id".to_string()
}

fn default_max_body_size() -> usize {
    64 * 1024
}

/// Groups of request data written into the entry scope.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecordConfig {
    #[serde(default = "enabled_by_default")]
    pub headers: bool,
    #[serde(default = "enabled_by_default")]
    pub cookies: bool,
    #[serde(default = "enabled_by_default")]
    pub query: bool,
    #[serde(default = "enabled_by_default")]
    pub request_body: bool,
    #[serde(default = "enabled_by_default")]
    pub response_body: bool,
    /// Hostname and IP address of the process.
    #[serde(default = "enabled_by_default")]
    pub host: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            headers: true,
            cookies: true,
            query: true,
            request_body: true,
            response_body: true,
            host: true,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}
