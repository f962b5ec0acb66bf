//! Keys conventionally written by request-handling code. The store itself does not enforce
//! any of them.

/// Request attributes
pub const TRACE_ID: &str = "trace_id";
pub const PATH: &str = "path";
pub const METHOD: &str = "method";
pub const REQUEST: &str = "request";
pub const TIME: &str = "time";
pub const CLIENT_IP: &str = "client_ip";
pub const SESSION_ID: &str = "session_id";

/// Process attributes
pub const HOST: &str = "host";
pub const IP: &str = "ip";

/// Response attributes
pub const STATUS_CODE: &str = "status_code";
pub const RESPONSE: &str = "response";

/// Failure attributes
pub const ERROR: &str = "error";
pub const ERROR_STACK: &str = "error_stack";

pub const HEADER_PREFIX: &str = "header:";
pub const COOKIE_PREFIX: &str = "cookie:";
pub const QUERY_PREFIX: &str = "query:";

#[inline]
pub fn header(name: &str) -> String {
    format!("{HEADER_PREFIX}{name}")
}

#[inline]
pub fn cookie(name: &str) -> String {
    format!("{COOKIE_PREFIX}{name}")
}

#[inline]
pub fn query(name: &str) -> String {
    format!("{QUERY_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_keys() {
        assert_eq!(header("user-agent"), "header:user-agent");
        assert_eq!(cookie("sid"), "cookie:sid");
        assert_eq!(query("page"), "query:page");
    }
}
