mod manager;

pub use manager::{SessionManager, replay_history};
