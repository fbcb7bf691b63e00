//! Fenced code block extraction for "apply to file".

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([\w+#.-]*)[ \t]*\r?\n(.*?)```").expect("fenced block pattern is valid")
});

/// A fenced code block found in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info-string language, empty when absent.
    pub language: String,
    pub code: String,
}

/// Returns the well-formed fenced blocks in `text`, in order.
///
/// An unterminated fence (e.g. mid-stream) is ignored.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    FENCED_BLOCK
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language: caps[1].to_string(),
            code: caps[2].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_language_and_code() {
        let reply = "Try this:\n```rust\nfn main() {}\n```\nand\n```\nplain\n```";
        let blocks = extract_code_blocks(reply);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "rust");
        assert_eq!(blocks[0].code, "fn main() {}\n");
        assert_eq!(blocks[1].language, "");
        assert_eq!(blocks[1].code, "plain\n");
    }

    #[test]
    fn test_unterminated_fence_is_skipped() {
        assert!(extract_code_blocks("```ts\nconst a = 1;").is_empty());
    }
}
