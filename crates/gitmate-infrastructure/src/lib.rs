pub mod config_service;
pub mod json_workspace_repository;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use json_workspace_repository::JsonWorkspaceRepository;
pub use paths::GitMatePaths;
