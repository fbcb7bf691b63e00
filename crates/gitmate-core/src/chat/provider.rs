//! Chat provider interface.
//!
//! A provider opens [`ChatSession`]s. A session carries a fixed system
//! instruction and a replayed history; it cannot be re-instructed in place,
//! so any context change means opening a new session.

use super::model::ChatModel;
use super::turn::{Speaker, TurnContent};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Lazy, finite sequence of reply fragments.
///
/// Dropping the stream abandons the reply; nothing else cancels it.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// A provider-neutral history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub speaker: Speaker,
    pub content: TurnContent,
}

impl HistoryTurn {
    pub fn new(speaker: Speaker, content: TurnContent) -> Self {
        Self { speaker, content }
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// System instruction produced by the context assembler.
    pub instruction: String,
    pub model: ChatModel,
    /// Thinking budget, set only for the reasoning model.
    pub reasoning_budget: Option<u32>,
    /// Turns replayed into the new session, oldest first.
    pub history: Vec<HistoryTurn>,
}

/// Opens chat sessions against a hosted model.
pub trait ChatProvider: Send + Sync {
    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Fails when the provider cannot be used at all (e.g. no API key).
    fn create_session(&self, config: SessionConfig) -> Result<Arc<dyn ChatSession>>;
}

/// A live session handle.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// The configuration this session was opened with.
    fn config(&self) -> &SessionConfig;

    /// The provider's view of the conversation so far.
    async fn history(&self) -> Vec<HistoryTurn>;

    /// Sends a user turn and returns the reply as a fragment stream.
    ///
    /// The stream ends when the provider's turn is complete. Every item is a
    /// non-empty fragment or an error; after an error the stream yields
    /// nothing more.
    async fn stream_reply(&self, message: TurnContent) -> Result<FragmentStream>;
}
