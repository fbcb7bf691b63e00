//! Workspace domain model.
//!
//! The [`Workspace`] is the single root aggregate: it is what gets persisted,
//! and it is the only source of truth for what a fresh chat session replays.

use crate::chat::{CHAT_CLEARED_NOTICE, ChatModel, Turn, welcome_notice};
use crate::error::{GitMateError, Result};
use crate::source::RepoCoordinates;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when the URL's last segment is empty.
const FALLBACK_DISPLAY_NAME: &str = "Project";

/// A file pulled into the active context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContext {
    /// Unique identifier assigned at creation, never reused (UUID format)
    pub id: String,
    /// Repository-relative path; unique within a workspace
    pub path: String,
    pub body: String,
}

impl FileContext {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            path: path.into(),
            body: body.into(),
        }
    }
}

/// Result of [`Workspace::upsert_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileUpsert {
    Added,
    Replaced,
}

/// The persisted chat workspace for one repository.
///
/// A workspace contains:
/// - The repository URL and its derived display name
/// - The ordered selection of files injected into the system instruction
/// - The visible conversation
/// - The selected model and an optional repository access token
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Empty only while unstarted
    pub repository_url: String,
    pub display_name: String,
    #[serde(default)]
    pub selected_files: Vec<FileContext>,
    #[serde(default)]
    pub chat_turns: Vec<Turn>,
    #[serde(default)]
    pub selected_model: ChatModel,
    /// Sent only as a header to the repository reader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Derives the display name from a repository URL (last path segment).
pub fn display_name_for(repository_url: &str) -> String {
    match repository_url.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => FALLBACK_DISPLAY_NAME.to_string(),
    }
}

impl Workspace {
    /// Starts a workspace for `repository_url` with a welcome notice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the URL is blank or not a GitHub URL.
    pub fn start(repository_url: &str, model: ChatModel) -> Result<Self> {
        let url = repository_url.trim();
        if url.is_empty() {
            return Err(GitMateError::invalid_input("Please enter a valid URL"));
        }
        if !url.contains("github.com") {
            return Err(GitMateError::invalid_input(
                "Please enter a valid GitHub repository URL",
            ));
        }

        let display_name = display_name_for(url);
        let welcome = Turn::status(welcome_notice(&display_name));

        Ok(Self {
            repository_url: url.to_string(),
            display_name,
            selected_files: Vec::new(),
            chat_turns: vec![welcome],
            selected_model: model,
            access_token: None,
        })
    }

    pub fn is_started(&self) -> bool {
        !self.repository_url.is_empty()
    }

    /// Parses owner/repo from the repository URL.
    pub fn coordinates(&self) -> Result<RepoCoordinates> {
        RepoCoordinates::parse(&self.repository_url)
    }

    // ============================================================================
    // Selected files
    // ============================================================================

    pub fn find_file(&self, id: &str) -> Option<&FileContext> {
        self.selected_files.iter().find(|f| f.id == id)
    }

    pub fn find_file_by_path(&self, path: &str) -> Option<&FileContext> {
        self.selected_files.iter().find(|f| f.path == path)
    }

    /// Adds a file, or replaces the body of the file with the same path.
    pub fn upsert_file(&mut self, path: &str, body: &str) -> FileUpsert {
        if let Some(existing) = self.selected_files.iter_mut().find(|f| f.path == path) {
            existing.body = body.to_string();
            FileUpsert::Replaced
        } else {
            self.selected_files.push(FileContext::new(path, body));
            FileUpsert::Added
        }
    }

    /// Removes a file by id, returning it if present.
    pub fn remove_file(&mut self, id: &str) -> Option<FileContext> {
        let index = self.selected_files.iter().position(|f| f.id == id)?;
        Some(self.selected_files.remove(index))
    }

    /// Replaces the body of the file with `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no selected file has that id.
    pub fn edit_file(&mut self, id: &str, body: &str) -> Result<()> {
        let file = self
            .selected_files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| GitMateError::not_found(id))?;
        file.body = body.to_string();
        Ok(())
    }

    pub fn clear_files(&mut self) {
        self.selected_files.clear();
    }

    // ============================================================================
    // Chat turns
    // ============================================================================

    /// The in-flight turn, if a reply is streaming.
    pub fn streaming_turn(&self) -> Option<&Turn> {
        self.chat_turns.iter().find(|t| t.streaming)
    }

    pub fn has_streaming_turn(&self) -> bool {
        self.streaming_turn().is_some()
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.chat_turns.push(turn);
    }

    pub fn turn_mut(&mut self, id: &str) -> Option<&mut Turn> {
        self.chat_turns.iter_mut().find(|t| t.id == id)
    }

    /// Most recent non-status assistant turn.
    pub fn last_reply(&self) -> Option<&Turn> {
        self.chat_turns
            .iter()
            .rev()
            .find(|t| t.speaker == crate::chat::Speaker::Assistant && !t.is_status())
    }

    /// Truncates the conversation to a single "chat cleared" notice.
    pub fn clear_turns(&mut self) {
        self.chat_turns = vec![Turn::status(CHAT_CLEARED_NOTICE)];
    }
}
