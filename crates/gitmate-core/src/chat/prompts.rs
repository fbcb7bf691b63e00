//! Fixed prompts and status-notice texts.

use super::model::ChatModel;
use crate::error::GitMateError;
use std::str::FromStr;

/// Sent in place of an empty message when only an image is attached.
pub const DEFAULT_IMAGE_PROMPT: &str = "Analyze this image.";

/// Appended when a send fails.
pub const APOLOGY_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// Sole turn left after clearing the chat.
pub const CHAT_CLEARED_NOTICE: &str = "Chat cleared. I'm ready for a fresh start!";

pub fn welcome_notice(display_name: &str) -> String {
    format!(
        "Hello! I'm ready to pair program on **{display_name}**. \n\nBrowse the repository to add files to my context, or just ask me anything about the codebase!"
    )
}

pub fn model_switched_notice(model: ChatModel) -> String {
    format!("Switched model to **{}**.", model.label())
}

pub fn file_applied_notice(path: &str) -> String {
    format!("✅ Updated **{path}** in context.")
}

pub fn analyze_file_prompt(path: &str) -> String {
    format!(
        "Analyze the file `{path}`.\n1. Explain its purpose.\n2. Identify any potential bugs, security risks, or performance issues.\n3. Suggest specific improvements or refactoring steps."
    )
}

/// One-click prompts over the whole context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Explain,
    FindBugs,
    Refactor,
    TestPlan,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [
        QuickAction::Explain,
        QuickAction::FindBugs,
        QuickAction::Refactor,
        QuickAction::TestPlan,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Explain => "Explain",
            Self::FindBugs => "Find Bugs",
            Self::Refactor => "Refactor",
            Self::TestPlan => "Test Plan",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Explain => "Explain the architecture and purpose of the files in context.",
            Self::FindBugs => {
                "Analyze the context files for potential bugs, security issues, or edge cases."
            }
            Self::Refactor => "Suggest refactoring improvements for cleaner, more maintainable code.",
            Self::TestPlan => "Generate a test plan and unit test examples for these files.",
        }
    }
}

impl FromStr for QuickAction {
    type Err = GitMateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explain" => Ok(Self::Explain),
            "bugs" | "find-bugs" | "findbugs" => Ok(Self::FindBugs),
            "refactor" => Ok(Self::Refactor),
            "tests" | "test-plan" | "testplan" => Ok(Self::TestPlan),
            other => Err(GitMateError::invalid_input(format!(
                "unknown quick action '{other}' (expected explain, bugs, refactor or tests)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_action_parse() {
        assert_eq!("bugs".parse::<QuickAction>().unwrap(), QuickAction::FindBugs);
        assert_eq!("Tests".parse::<QuickAction>().unwrap(), QuickAction::TestPlan);
        assert!("deploy".parse::<QuickAction>().is_err());
    }

    #[test]
    fn test_notices_mention_subject() {
        assert!(model_switched_notice(ChatModel::Pro).contains("Pro (Reasoning)"));
        assert!(file_applied_notice("src/lib.rs").contains("**src/lib.rs**"));
        assert!(welcome_notice("repo").contains("**repo**"));
        assert!(analyze_file_prompt("a.ts").starts_with("Analyze the file `a.ts`."));
    }
}
