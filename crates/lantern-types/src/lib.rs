//! Shared types for the Lantern chat and file-index service.

mod chat;
mod config;
mod file_index;
mod model;

pub use chat::*;
pub use config::*;
pub use file_index::*;
pub use model::*;
