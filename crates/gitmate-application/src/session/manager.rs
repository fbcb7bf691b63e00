use gitmate_core::chat::{
    ChatModel, ChatProvider, ChatSession, DEFAULT_IMAGE_PROMPT, FragmentStream, HistoryTurn,
    ImageAttachment, SessionConfig, Turn, TurnContent, build_system_instruction,
};
use gitmate_core::error::{GitMateError, Result};
use gitmate_core::workspace::FileContext;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Maps visible turns to provider history, dropping status notices.
pub fn replay_history(turns: &[Turn]) -> Vec<HistoryTurn> {
    turns
        .iter()
        .filter(|turn| !turn.is_status())
        .map(|turn| HistoryTurn::new(turn.speaker, turn.content.clone()))
        .collect()
}

/// Owns zero or one live chat session.
///
/// `SessionManager` is responsible for:
/// - Rebuilding the session whenever the context it was built from changes
/// - Replaying the visible conversation into each new session
/// - Failing sends fast while no session is live
///
/// It does not serialize sends; keeping at most one reply in flight is the
/// caller's job.
pub struct SessionManager {
    /// Opens new sessions
    provider: Arc<dyn ChatProvider>,
    /// The live session, if initialization succeeded
    handle: RwLock<Option<Arc<dyn ChatSession>>>,
}

impl SessionManager {
    /// Creates a manager with no live session.
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            handle: RwLock::new(None),
        }
    }

    /// Tears down the current session and opens one for the given context.
    ///
    /// # Arguments
    ///
    /// * `repository_url` - The repository the user is working on
    /// * `files` - The selected files, in order
    /// * `model` - The model to talk to; the reasoning model gets a thinking budget
    /// * `prior_turns` - The visible conversation to replay
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the session cannot be opened. The
    /// manager is then left uninitialized until the next successful call.
    pub async fn replace(
        &self,
        repository_url: &str,
        files: &[FileContext],
        model: ChatModel,
        prior_turns: &[Turn],
    ) -> Result<()> {
        let mut handle = self.handle.write().await;
        *handle = None;

        let config = SessionConfig {
            instruction: build_system_instruction(repository_url, files),
            model,
            reasoning_budget: model.reasoning_budget(),
            history: replay_history(prior_turns),
        };
        let history_len = config.history.len();

        match self.provider.create_session(config) {
            Ok(session) => {
                tracing::info!(
                    model = %model,
                    files = files.len(),
                    history_len,
                    "Chat session replaced"
                );
                *handle = Some(session);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to initialize chat session: {}", e);
                Err(e)
            }
        }
    }

    /// Sends a message on the live session.
    ///
    /// With an image attached, an empty `text` is replaced by a default
    /// analysis prompt.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` when no session is live
    /// - the provider's error when the request cannot be started
    pub async fn send(&self, text: &str, image: Option<ImageAttachment>) -> Result<FragmentStream> {
        let session = self
            .handle
            .read()
            .await
            .clone()
            .ok_or(GitMateError::NotInitialized)?;

        let message = match image {
            Some(image) if text.trim().is_empty() => {
                TurnContent::with_image(DEFAULT_IMAGE_PROMPT, Some(image))
            }
            Some(image) => TurnContent::with_image(text, Some(image)),
            None => TurnContent::text(text),
        };

        session.stream_reply(message).await
    }

    /// Discards the live session without opening a new one.
    pub async fn reset(&self) {
        let mut handle = self.handle.write().await;
        if handle.take().is_some() {
            tracing::debug!("Chat session discarded");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.handle.read().await.is_some()
    }

    /// The configuration the live session was opened with.
    pub async fn active_config(&self) -> Option<SessionConfig> {
        self.handle
            .read()
            .await
            .as_ref()
            .map(|session| session.config().clone())
    }

    /// The live session itself.
    pub async fn active_session(&self) -> Option<Arc<dyn ChatSession>> {
        self.handle.read().await.clone()
    }
}
