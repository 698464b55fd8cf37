//! Command handlers for the `chatapi` binary.

mod chat;
mod probe;
mod send;
pub mod services;

pub use chat::chat;
pub use probe::{diagnose, ping, status};
pub use send::send;
