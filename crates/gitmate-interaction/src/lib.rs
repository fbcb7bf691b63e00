//! Network adapters for GitMate: the Gemini chat provider and the GitHub
//! repository reader.

pub mod gemini_chat_provider;
pub mod github_reader;
pub mod sse;

#[cfg(test)]
mod test_support;

pub use gemini_chat_provider::{GeminiChatProvider, GeminiChatSession};
pub use github_reader::GitHubRepositoryReader;
