//! Chat message payloads.
//!
//! [`RawMessage`] mirrors the JSON the relay backend emits on its feed
//! endpoints. [`Message`] is the canonical form the renderer works with:
//! the alternative content fields are resolved into a single [`Body`] once
//! at ingestion, so render code never re-checks field presence.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One structured unit of message content, produced upstream so the client
/// does not have to re-parse emoji tokens out of plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text {
        content: String,
    },
    Emoji {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        animated: bool,
    },
}

/// A renderable media attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaItem {
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_url: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fallback_urls: Vec<String>,
    },
    Video {
        url: String,
        #[serde(rename = "loop", default = "default_true")]
        looped: bool,
        #[serde(default = "default_true")]
        autoplay: bool,
    },
    Lottie {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        lottie_urls: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_url: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fallback_urls: Vec<String>,
        #[serde(rename = "loop", default = "default_true")]
        looped: bool,
        #[serde(default = "default_true")]
        autoplay: bool,
    },
}

impl MediaItem {
    /// Short kind name for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaItem::Image { .. } => "image",
            MediaItem::Video { .. } => "video",
            MediaItem::Lottie { .. } => "lottie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedFooter {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub inline: bool,
}

/// Rich-embed descriptor attached to a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<EmbedAuthor>,
    #[serde(default)]
    pub footer: Option<EmbedFooter>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Wire-exact mirror of one feed record. Every field is optional; the
/// backend omits anything it has no value for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role_color: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub clean_content: Option<String>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub content_segments: Vec<Segment>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub embeds: Vec<EmbedPayload>,
}

/// Canonical message body, resolved once at ingestion.
///
/// Priority: pre-segmented content wins, then the first non-empty plain
/// text variant, else empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Segments(Vec<Segment>),
    Text(String),
    Empty,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

/// Canonical message the renderer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub avatar_url: Option<String>,
    pub role_color: Option<String>,
    pub timestamp: Option<String>,
    pub body: Body,
    /// Plain-text rendering kept for the empty-bubble fallback rule.
    pub text_fallback: Option<String>,
    pub media: Vec<MediaItem>,
    pub embeds: Vec<EmbedPayload>,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        let text_fallback = [&raw.content, &raw.clean_content, &raw.raw_content]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned();

        let body = if !raw.content_segments.is_empty() {
            Body::Segments(raw.content_segments)
        } else if let Some(text) = text_fallback.clone() {
            Body::Text(text)
        } else {
            Body::Empty
        };

        Self {
            id: raw.id.unwrap_or_default(),
            author: raw.author.unwrap_or_default(),
            avatar_url: raw.avatar_url,
            role_color: raw.role_color,
            timestamp: raw.timestamp,
            body,
            text_fallback,
            media: raw.media,
            embeds: raw.embeds,
        }
    }
}

impl Message {
    /// Convenience constructor for plain-text messages (mostly tests and
    /// the terminal preview).
    pub fn plain(author: &str, content: &str) -> Self {
        Self {
            id: String::new(),
            author: author.to_string(),
            avatar_url: None,
            role_color: None,
            timestamp: None,
            body: if content.is_empty() {
                Body::Empty
            } else {
                Body::Text(content.to_string())
            },
            text_fallback: (!content.is_empty()).then(|| content.to_string()),
            media: Vec::new(),
            embeds: Vec::new(),
        }
    }
}
