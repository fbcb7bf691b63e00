//! WorkspaceController - applies user actions to the workspace.
//!
//! Every action that changes the repository, the model or the selected files
//! replaces the chat session before returning, so the next send always sees
//! the post-change context. Every mutation of a started workspace is saved.

use crate::session::SessionManager;
use futures::StreamExt;
use gitmate_core::chat::{
    APOLOGY_NOTICE, ChatModel, ChatSession, CodeBlock, ImageAttachment, QuickAction, Turn, TurnContent,
    analyze_file_prompt, extract_code_blocks, file_applied_notice, model_switched_notice,
};
use gitmate_core::error::{GitMateError, Result};
use gitmate_core::source::{RepoCoordinates, RepoNode, RepositoryReader};
use gitmate_core::workspace::{
    FileContext, FileUpsert, Workspace, WorkspaceRepository, export_script,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// How a send ended once it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply streamed to completion.
    Completed { reply: String },
    /// The provider failed; an apology notice was appended.
    Failed { error: GitMateError },
}

pub struct WorkspaceController {
    workspace: Mutex<Workspace>,
    sessions: Arc<SessionManager>,
    repository: Arc<dyn WorkspaceRepository>,
    reader: Arc<dyn RepositoryReader>,
}

impl WorkspaceController {
    pub fn new(
        sessions: Arc<SessionManager>,
        repository: Arc<dyn WorkspaceRepository>,
        reader: Arc<dyn RepositoryReader>,
    ) -> Self {
        Self {
            workspace: Mutex::new(Workspace::default()),
            sessions,
            repository,
            reader,
        }
    }

    /// A snapshot of the current workspace.
    pub async fn workspace(&self) -> Workspace {
        self.workspace.lock().await.clone()
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Loads the persisted workspace, if any, and opens a session for it.
    ///
    /// A reply that was still streaming when the record was written is
    /// marked finished, keeping what had arrived.
    ///
    /// # Returns
    ///
    /// `true` if a started workspace was restored.
    pub async fn restore(&self) -> Result<bool> {
        let Some(mut loaded) = self.repository.load().await? else {
            return Ok(false);
        };
        if !loaded.is_started() {
            return Ok(false);
        }

        for turn in loaded.chat_turns.iter_mut().filter(|t| t.streaming) {
            turn.finish_streaming();
        }

        let mut workspace = self.workspace.lock().await;
        *workspace = loaded;
        tracing::info!(
            repository = %workspace.repository_url,
            files = workspace.selected_files.len(),
            turns = workspace.chat_turns.len(),
            "Workspace restored"
        );
        self.sync_session(&workspace).await;
        Ok(true)
    }

    /// Starts a fresh workspace for `repository_url`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the URL is not a GitHub repository URL.
    pub async fn start(&self, repository_url: &str, model: ChatModel) -> Result<()> {
        let started = Workspace::start(repository_url, model)?;
        started.coordinates()?;

        let mut workspace = self.workspace.lock().await;
        *workspace = started;
        tracing::info!(repository = %workspace.repository_url, "Workspace started");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(())
    }

    /// Resets to the unstarted state and removes the persisted record.
    pub async fn exit(&self) -> Result<()> {
        let mut workspace = self.workspace.lock().await;
        *workspace = Workspace::default();
        self.sessions.reset().await;
        self.repository.clear().await?;
        tracing::info!("Workspace closed");
        Ok(())
    }

    // ============================================================================
    // Context
    // ============================================================================

    /// Adds a file, or replaces the body of the selected file at `path`.
    pub async fn add_file(&self, path: &str, body: &str) -> Result<FileUpsert> {
        let path = normalize_path(path)?;
        let mut workspace = self.started().await?;

        let upsert = workspace.upsert_file(&path, body);
        tracing::info!(path = %path, ?upsert, "File added to context");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(upsert)
    }

    /// Downloads a repository file and adds it to the context.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the parent directory has no file at `path`
    /// - the reader's error when listing or downloading fails
    pub async fn add_repository_file(&self, path: &str) -> Result<FileUpsert> {
        let path = normalize_path(path)?;
        let (coordinates, token) = self.reader_target().await?;

        let parent = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let node = self
            .reader
            .list_directory(&coordinates, parent, token.as_deref())
            .await?
            .into_iter()
            .find(|node| node.path == path && !node.is_dir())
            .ok_or_else(|| GitMateError::not_found(path.clone()))?;

        let content_url = node
            .content_url
            .ok_or_else(|| GitMateError::unavailable(format!("No download URL for '{path}'")))?;
        let body = self.reader.read_file(&content_url).await?;

        self.add_file(&path, &body).await
    }

    /// Removes the selected file with `id`.
    pub async fn remove_file(&self, id: &str) -> Result<FileContext> {
        let mut workspace = self.started().await?;
        let removed = workspace
            .remove_file(id)
            .ok_or_else(|| GitMateError::not_found(id))?;
        tracing::info!(path = %removed.path, "File removed from context");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(removed)
    }

    /// Replaces the body of the selected file with `id`.
    pub async fn edit_file(&self, id: &str, body: &str) -> Result<()> {
        let mut workspace = self.started().await?;
        workspace.edit_file(id, body)?;
        tracing::info!(id, "File edited");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(())
    }

    pub async fn clear_context(&self) -> Result<()> {
        let mut workspace = self.started().await?;
        workspace.clear_files();
        tracing::info!("Context cleared");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(())
    }

    /// Writes `code` to `path` in the context and notes it in the chat.
    pub async fn apply_code(&self, path: &str, code: &str) -> Result<FileUpsert> {
        let path = normalize_path(path)?;
        let mut workspace = self.started().await?;

        let upsert = workspace.upsert_file(&path, code);
        workspace.push_turn(Turn::status(file_applied_notice(&path)));
        tracing::info!(path = %path, ?upsert, "Code block applied");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(upsert)
    }

    /// Code blocks in the most recent assistant reply.
    pub async fn reply_code_blocks(&self) -> Vec<CodeBlock> {
        self.workspace
            .lock()
            .await
            .last_reply()
            .map(|turn| extract_code_blocks(turn.body()))
            .unwrap_or_default()
    }

    // ============================================================================
    // Settings
    // ============================================================================

    /// Switches model, noting the change in the chat. Selecting the current
    /// model does nothing.
    pub async fn switch_model(&self, model: ChatModel) -> Result<()> {
        let mut workspace = self.started().await?;
        if workspace.selected_model == model {
            return Ok(());
        }

        workspace.selected_model = model;
        workspace.push_turn(Turn::status(model_switched_notice(model)));
        tracing::info!(model = %model, "Model switched");

        self.persist(&workspace).await;
        self.sync_session(&workspace).await;
        Ok(())
    }

    /// Switches to the other model and returns it.
    pub async fn toggle_model(&self) -> Result<ChatModel> {
        let next = self.started().await?.selected_model.toggled();
        self.switch_model(next).await?;
        Ok(next)
    }

    /// Sets or clears the repository access token.
    pub async fn set_access_token(&self, token: Option<String>) -> Result<()> {
        let mut workspace = self.started().await?;
        workspace.access_token = token.filter(|t| !t.trim().is_empty());
        tracing::info!(present = workspace.access_token.is_some(), "Access token updated");

        self.persist(&workspace).await;
        Ok(())
    }

    /// Clears the conversation and opens a session with no history.
    pub async fn clear_chat(&self) -> Result<()> {
        let mut workspace = self.started().await?;
        workspace.clear_turns();
        tracing::info!("Chat cleared");

        self.persist(&workspace).await;
        self.sessions.reset().await;
        if let Err(e) = self
            .sessions
            .replace(
                &workspace.repository_url,
                &workspace.selected_files,
                workspace.selected_model,
                &[],
            )
            .await
        {
            tracing::warn!("Continuing without a chat session: {}", e);
        }
        Ok(())
    }

    // ============================================================================
    // Chat
    // ============================================================================

    /// Sends a message and merges the streamed reply into the chat.
    ///
    /// A user turn and a streaming placeholder are appended up front. Each
    /// fragment is merged into the placeholder, saved, and then handed to
    /// `on_fragment`. Dropping the returned future abandons the reply.
    ///
    /// # Errors
    ///
    /// - `SendInProgress` while another reply is streaming
    /// - `InvalidInput` when there is neither text nor an image
    ///
    /// Provider failures are not errors here: they end the send with
    /// [`SendOutcome::Failed`] after appending an apology notice.
    pub async fn send_message<F>(
        &self,
        text: &str,
        image: Option<ImageAttachment>,
        mut on_fragment: F,
    ) -> Result<SendOutcome>
    where
        F: FnMut(&str) + Send,
    {
        let placeholder_id = {
            let mut workspace = self.started().await?;
            if workspace.has_streaming_turn() {
                tracing::debug!("Send rejected: a reply is still streaming");
                return Err(GitMateError::SendInProgress);
            }
            if text.trim().is_empty() && image.is_none() {
                return Err(GitMateError::invalid_input("Message is empty"));
            }

            workspace.push_turn(Turn::user(TurnContent::with_image(text, image.clone())));
            let placeholder = Turn::placeholder();
            let id = placeholder.id.clone();
            workspace.push_turn(placeholder);
            self.persist(&workspace).await;
            id
        };

        tracing::info!(has_image = image.is_some(), "Sending message");

        let sent_on = self.sessions.active_session().await;
        let mut stream = match self.sessions.send(text, image).await {
            Ok(stream) => stream,
            Err(error) => return Ok(self.fail_send(&placeholder_id, error, None).await),
        };

        let mut reply = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    {
                        let mut workspace = self.workspace.lock().await;
                        let Some(turn) = workspace.turn_mut(&placeholder_id) else {
                            // Cleared mid-stream; nothing left to merge into
                            tracing::debug!("Placeholder gone, dropping reply");
                            return Ok(SendOutcome::Completed { reply });
                        };
                        turn.append_fragment(&fragment);
                        self.persist(&workspace).await;
                    }
                    reply.push_str(&fragment);
                    on_fragment(&fragment);
                }
                Err(error) => {
                    return Ok(self.fail_send(&placeholder_id, error, sent_on).await);
                }
            }
        }

        let mut workspace = self.workspace.lock().await;
        if let Some(turn) = workspace.turn_mut(&placeholder_id) {
            turn.finish_streaming();
        }
        self.persist(&workspace).await;
        self.resync_if_replaced(sent_on, &workspace).await;
        tracing::info!(reply_len = reply.len(), "Reply complete");

        Ok(SendOutcome::Completed { reply })
    }

    /// Sends one of the fixed quick-action prompts.
    pub async fn quick_action<F>(&self, action: QuickAction, on_fragment: F) -> Result<SendOutcome>
    where
        F: FnMut(&str) + Send,
    {
        self.send_message(action.prompt(), None, on_fragment).await
    }

    /// Asks for an analysis of a selected file.
    pub async fn analyze_file<F>(&self, path: &str, on_fragment: F) -> Result<SendOutcome>
    where
        F: FnMut(&str) + Send,
    {
        if self.workspace.lock().await.find_file_by_path(path).is_none() {
            return Err(GitMateError::not_found(path));
        }
        self.send_message(&analyze_file_prompt(path), None, on_fragment)
            .await
    }

    async fn fail_send(
        &self,
        placeholder_id: &str,
        error: GitMateError,
        sent_on: Option<Arc<dyn ChatSession>>,
    ) -> SendOutcome {
        tracing::error!("Send failed: {}", error);

        let mut workspace = self.workspace.lock().await;
        if let Some(turn) = workspace.turn_mut(placeholder_id) {
            turn.finish_streaming();
        }
        workspace.push_turn(Turn::status(APOLOGY_NOTICE));
        self.persist(&workspace).await;
        self.resync_if_replaced(sent_on, &workspace).await;

        SendOutcome::Failed { error }
    }

    // ============================================================================
    // Repository browsing and export
    // ============================================================================

    /// Lists a repository directory (empty path for the root).
    pub async fn list_directory(&self, path: &str) -> Result<Vec<RepoNode>> {
        let (coordinates, token) = self.reader_target().await?;
        self.reader
            .list_directory(&coordinates, path.trim_matches('/'), token.as_deref())
            .await
            .inspect_err(|e| tracing::warn!(path, "Listing failed: {}", e))
    }

    /// Renders the selected files as a shell script.
    pub async fn export_script(&self) -> Result<String> {
        let workspace = self.started().await?;
        Ok(export_script(&workspace.selected_files))
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn started(&self) -> Result<tokio::sync::MutexGuard<'_, Workspace>> {
        let workspace = self.workspace.lock().await;
        if !workspace.is_started() {
            return Err(GitMateError::invalid_input(
                "No repository loaded; start with a GitHub URL first",
            ));
        }
        Ok(workspace)
    }

    async fn reader_target(&self) -> Result<(RepoCoordinates, Option<String>)> {
        let workspace = self.started().await?;
        Ok((workspace.coordinates()?, workspace.access_token.clone()))
    }

    /// Rebuilds the session when a context edit replaced it while a reply was
    /// streaming. That replacement replayed the reply as it stood then.
    async fn resync_if_replaced(
        &self,
        sent_on: Option<Arc<dyn ChatSession>>,
        workspace: &Workspace,
    ) {
        let Some(sent_on) = sent_on else {
            return;
        };
        let replaced = match self.sessions.active_session().await {
            Some(current) => !Arc::ptr_eq(&sent_on, &current),
            None => false,
        };
        if replaced {
            tracing::debug!("Session replaced mid-stream, replaying finished reply");
            self.sync_session(workspace).await;
        }
    }

    async fn sync_session(&self, workspace: &Workspace) {
        if let Err(e) = self
            .sessions
            .replace(
                &workspace.repository_url,
                &workspace.selected_files,
                workspace.selected_model,
                &workspace.chat_turns,
            )
            .await
        {
            tracing::warn!("Continuing without a chat session: {}", e);
        }
    }

    async fn persist(&self, workspace: &Workspace) {
        if !workspace.is_started() {
            return;
        }
        if let Err(e) = self.repository.save(workspace).await {
            tracing::error!("Failed to save workspace: {}", e);
        }
    }
}

fn normalize_path(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(GitMateError::invalid_input("File path is empty"));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(GitMateError::invalid_input(
            "File path contains control characters",
        ));
    }
    Ok(trimmed.to_string())
}
