pub mod echo;
pub mod panic;
pub mod probes;
