pub mod host;
pub mod http;
pub mod logging;
pub mod telemetry;
