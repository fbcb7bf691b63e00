//! Workspace domain module.
//!
//! - `model`: The persisted aggregate (`Workspace`, `FileContext`)
//! - `repository`: Persistence interface (`WorkspaceRepository`)
//! - `export`: Shell-script export of the selected files

mod export;
mod model;
mod repository;

pub use export::export_script;
pub use model::{FileContext, FileUpsert, Workspace, display_name_for};
pub use repository::WorkspaceRepository;
