//! Workspace repository trait.
//!
//! Defines the interface for persisting the single workspace record.

use super::model::Workspace;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for the one persisted [`Workspace`] record.
///
/// There is exactly one record per installation (the browser build kept it
/// under a single local-storage key); implementations read and write it
/// wholesale.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Loads the persisted record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Workspace))`: A record was found
    /// - `Ok(None)`: Nothing has been persisted yet
    /// - `Err(_)`: The record exists but could not be read
    async fn load(&self) -> Result<Option<Workspace>>;

    /// Replaces the persisted record.
    async fn save(&self, workspace: &Workspace) -> Result<()>;

    /// Removes the persisted record. Succeeds if none exists.
    async fn clear(&self) -> Result<()>;
}
