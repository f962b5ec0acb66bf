//! A hierarchical, request-scoped attribute store.
//!
//! Every processing scope of a request (the request itself, a handler, a sub-call) owns one
//! [`AttributeScope`] node holding string key/value pairs. Nodes are linked to the scope that
//! was active when they were created, and [`AttributeScope::get_all`] flattens the chain so
//! that deeper scopes override shallower ones.
//!
//! The currently active node travels with the ambient [`opentelemetry::Context`]: see
//! [`enter_scope`] and [`current_scope`]. Binding never mutates a context, it always derives
//! a new one, so concurrent requests never observe each other's scopes.
pub mod context;
pub mod keys;
pub mod scope;

pub use context::{current_scope, enter_scope, in_scope, ScopeContextExt};
pub use scope::{AttributeMap, AttributeScope};

/// Re-exported so callers can build and attach contexts without a direct dependency.
pub use opentelemetry::Context;
