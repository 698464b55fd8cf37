pub mod chat;
pub mod commands;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod runtime;

pub use chat::{ChatClient, ChatCompletion, ChatOptions, ChatService};
pub use config::{ClientConfig, ModelDefaults};
pub use error::ChatError;
