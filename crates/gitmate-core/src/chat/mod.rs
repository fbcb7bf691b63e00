//! Chat domain module.
//!
//! # Module Structure
//!
//! - `turn`: Conversation turns (`Turn`, `TurnContent`, `Speaker`)
//! - `model`: Selectable models (`ChatModel`)
//! - `provider`: Provider/session interface (`ChatProvider`, `ChatSession`)
//! - `context`: System instruction assembly
//! - `prompts`: Fixed prompts and status notices
//! - `code_block`: Fenced code extraction for applying replies to files

mod code_block;
mod context;
mod model;
mod prompts;
mod provider;
mod turn;

// Re-export public API
pub use code_block::{CodeBlock, extract_code_blocks};
pub use context::{NO_FILES_MARKER, build_system_instruction};
pub use model::{ChatModel, PRO_THINKING_BUDGET};
pub use prompts::{
    APOLOGY_NOTICE, CHAT_CLEARED_NOTICE, DEFAULT_IMAGE_PROMPT, QuickAction, analyze_file_prompt,
    file_applied_notice, model_switched_notice, welcome_notice,
};
pub use provider::{ChatProvider, ChatSession, FragmentStream, HistoryTurn, SessionConfig};
pub use turn::{ImageAttachment, Speaker, Turn, TurnContent, TurnOrigin};
