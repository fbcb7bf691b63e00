//! Context assembler.
//!
//! Builds the system instruction from the repository URL and the selected
//! files. Pure function of its inputs; no truncation is applied.

use crate::workspace::FileContext;

/// Marker used in place of the file section when nothing is selected.
pub const NO_FILES_MARKER: &str = "No specific files provided yet.";

/// Renders one delimited file block.
fn file_block(file: &FileContext) -> String {
    format!(
        "\n--- FILE: {path} ---\n{body}\n--- END FILE ---\n",
        path = file.path,
        body = file.body
    )
}

/// Builds the system instruction for a chat session.
///
/// The file section holds one block per file, in the given order, or
/// [`NO_FILES_MARKER`] when `files` is empty.
pub fn build_system_instruction(repository_url: &str, files: &[FileContext]) -> String {
    let file_section = if files.is_empty() {
        NO_FILES_MARKER.to_string()
    } else {
        files.iter().map(file_block).collect::<Vec<_>>().join("\n")
    };

    format!(
        "You are an expert senior software engineer and pair programmer.
The user is working on the GitHub repository: {repository_url}.

Your goal is to help the user build features, debug code, and understand the architecture.
Always be concise, technically accurate, and provide code examples when relevant.

CURRENT PROJECT CONTEXT (User provided files):
{file_section}

When the user asks to \"build together\", assume they want to write code for the repo.
If you need more context about a specific file to answer a question, ask the user to paste it.
"
    )
}
