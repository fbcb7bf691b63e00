//! JSON-file-backed WorkspaceRepository.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use gitmate_core::error::{GitMateError, Result};
use gitmate_core::workspace::{Workspace, WorkspaceRepository};
use std::path::PathBuf;
use std::sync::Arc;

/// Stores the workspace record as a single `workspace.json`.
///
/// File IO runs on the blocking pool so a save per streamed fragment does not
/// stall the runtime.
#[derive(Clone)]
pub struct JsonWorkspaceRepository {
    file: Arc<AtomicJsonFile<Workspace>>,
}

impl JsonWorkspaceRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
        }
    }

    async fn blocking<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicJsonFile<Workspace>) -> Result<R> + Send + 'static,
    {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| GitMateError::internal(format!("Storage task failed: {e}")))?
    }
}

#[async_trait]
impl WorkspaceRepository for JsonWorkspaceRepository {
    async fn load(&self) -> Result<Option<Workspace>> {
        let loaded = self.blocking(|file| file.load()).await?;
        if let Some(workspace) = &loaded {
            tracing::debug!(
                files = workspace.selected_files.len(),
                turns = workspace.chat_turns.len(),
                "Loaded workspace record"
            );
        }
        Ok(loaded)
    }

    async fn save(&self, workspace: &Workspace) -> Result<()> {
        let snapshot = workspace.clone();
        self.blocking(move |file| file.save(&snapshot)).await
    }

    async fn clear(&self) -> Result<()> {
        self.blocking(|file| file.remove()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitmate_core::chat::{ChatModel, Turn, TurnContent};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonWorkspaceRepository::new(temp_dir.path().join("workspace.json"));
        assert!(repo.load().await.unwrap().is_none());

        let mut workspace = Workspace::start("https://github.com/o/r", ChatModel::Pro).unwrap();
        workspace.upsert_file("src/lib.rs", "pub fn f() {}");
        workspace.push_turn(Turn::user(TurnContent::text("hi")));
        workspace.access_token = Some("tok".to_string());
        repo.save(&workspace).await.unwrap();

        assert_eq!(repo.load().await.unwrap(), Some(workspace));

        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_streaming_turn_survives_save() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonWorkspaceRepository::new(temp_dir.path().join("workspace.json"));

        let mut workspace = Workspace::start("https://github.com/o/r", ChatModel::Flash).unwrap();
        let mut placeholder = Turn::placeholder();
        placeholder.append_fragment("half a rep");
        workspace.push_turn(placeholder);
        repo.save(&workspace).await.unwrap();

        let loaded = repo.load().await.unwrap().unwrap();
        let turn = loaded.streaming_turn().unwrap();
        assert_eq!(turn.body(), "half a rep");
    }
}
