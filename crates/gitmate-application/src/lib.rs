//! Application layer for GitMate.
//!
//! [`SessionManager`] keeps the live chat session in step with the assembled
//! context; [`WorkspaceController`] applies user actions to the persisted
//! workspace and drives the session manager.

pub mod session;
pub mod workspace_controller;

pub use session::SessionManager;
pub use workspace_controller::{SendOutcome, WorkspaceController};
