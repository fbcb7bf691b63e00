pub mod chat;
pub mod config;
pub mod error;
pub mod source;
pub mod workspace;

// Re-export common error type
pub use error::{GitMateError, Result};
