//! Spans are created through small wrapper structs rather than ad-hoc `tracing` calls, so the
//! name, kind and attribute keys stay the same wherever a span is opened.
pub const TARGET_NAME: &str = "scoped_attributes";

pub mod attributes;
pub mod service_handler;
