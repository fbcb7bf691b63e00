//! Conversation turn types.
//!
//! A [`Turn`] is one visible unit of the conversation. Its content is a
//! tagged [`TurnContent`] so the text-only and multimodal cases are handled
//! exhaustively.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// Message typed by the user.
    User,
    /// Message produced by the model, or a local status notice shown as one.
    Assistant,
}

/// Whether a turn belongs to the conversation with the model.
///
/// Status turns (welcome text, "chat cleared", model switches, apologies)
/// are shown to the user but never replayed into a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOrigin {
    #[default]
    Conversation,
    Status,
}

/// An inline image sent alongside a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// Base64-encoded image bytes (no data-URL prefix).
    pub data: String,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

impl ImageAttachment {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Body of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TurnContent {
    /// Plain text.
    Text { text: String },
    /// Text plus exactly one inline image.
    TextWithImage { text: String, image: ImageAttachment },
}

impl TurnContent {
    /// Creates text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates content with an optional image.
    pub fn with_image(text: impl Into<String>, image: Option<ImageAttachment>) -> Self {
        match image {
            Some(image) => Self::TextWithImage {
                text: text.into(),
                image,
            },
            None => Self::text(text),
        }
    }

    /// Returns the text part.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text } | Self::TextWithImage { text, .. } => text,
        }
    }

    /// Returns the image, if any.
    pub fn image(&self) -> Option<&ImageAttachment> {
        match self {
            Self::Text { .. } => None,
            Self::TextWithImage { image, .. } => Some(image),
        }
    }

    /// True when there is neither text nor an image to send.
    pub fn is_empty(&self) -> bool {
        self.body().is_empty() && self.image().is_none()
    }

    fn push_str(&mut self, fragment: &str) {
        match self {
            Self::Text { text } | Self::TextWithImage { text, .. } => text.push_str(fragment),
        }
    }
}

/// A single turn in the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    /// Unique turn identifier (UUID format)
    pub id: String,
    pub speaker: Speaker,
    pub content: TurnContent,
    /// Creation time, Unix milliseconds
    pub created_at: i64,
    /// True while a reply is still being merged into this turn.
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub origin: TurnOrigin,
}

impl Turn {
    fn new(speaker: Speaker, content: TurnContent, origin: TurnOrigin) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker,
            content,
            created_at: chrono::Utc::now().timestamp_millis(),
            streaming: false,
            origin,
        }
    }

    /// A message from the user.
    pub fn user(content: TurnContent) -> Self {
        Self::new(Speaker::User, content, TurnOrigin::Conversation)
    }

    /// A completed assistant reply.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(
            Speaker::Assistant,
            TurnContent::text(text),
            TurnOrigin::Conversation,
        )
    }

    /// An empty assistant turn that fragments will be merged into.
    pub fn placeholder() -> Self {
        let mut turn = Self::assistant(String::new());
        turn.streaming = true;
        turn
    }

    /// A locally generated notice shown as an assistant turn.
    pub fn status(text: impl Into<String>) -> Self {
        Self::new(
            Speaker::Assistant,
            TurnContent::text(text),
            TurnOrigin::Status,
        )
    }

    pub fn body(&self) -> &str {
        self.content.body()
    }

    pub fn attachment(&self) -> Option<&ImageAttachment> {
        self.content.image()
    }

    pub fn is_status(&self) -> bool {
        self.origin == TurnOrigin::Status
    }

    /// Appends a streamed fragment to the body.
    pub fn append_fragment(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }

    /// Marks the streamed reply as complete.
    pub fn finish_streaming(&mut self) {
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_merges_fragments_in_order() {
        let mut turn = Turn::placeholder();
        assert!(turn.streaming);
        assert_eq!(turn.body(), "");

        turn.append_fragment("Hel");
        turn.append_fragment("lo");
        turn.finish_streaming();

        assert_eq!(turn.body(), "Hello");
        assert!(!turn.streaming);
        assert_eq!(turn.speaker, Speaker::Assistant);
    }

    #[test]
    fn test_with_image_picks_variant() {
        let text_only = TurnContent::with_image("hi", None);
        assert!(matches!(text_only, TurnContent::Text { .. }));

        let image = ImageAttachment::new("aGk=", "image/png");
        let multimodal = TurnContent::with_image("", Some(image.clone()));
        assert_eq!(multimodal.image(), Some(&image));
        assert!(!multimodal.is_empty());
    }

    #[test]
    fn test_status_turn_is_marked() {
        let turn = Turn::status("Chat cleared.");
        assert!(turn.is_status());
        assert!(!Turn::assistant("ok").is_status());
    }

    #[test]
    fn test_turn_without_origin_deserializes_as_conversation() {
        let json = r#"{
            "id": "1",
            "speaker": "user",
            "content": { "type": "text", "text": "hi" },
            "createdAt": 0
        }"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.origin, TurnOrigin::Conversation);
        assert!(!turn.streaming);
    }
}
