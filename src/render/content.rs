//! Message body segmentation and inline rendering.
//!
//! Bodies arrive either pre-segmented by the relay or as plain text that
//! still carries `<a?:name:id>` emoji tokens. Both paths converge on a flat
//! list of inline nodes: text runs, explicit line breaks, and emoji images
//! resolved through an extension fallback chain.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::feed::message::Segment;
use crate::render::fetch::MediaFetcher;

/// Emoji token pattern, identical to the relay's server-side segmenter.
static EMOJI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(a?):([a-zA-Z0-9_]+)(?::(\d+))?>").expect("emoji pattern"));

/// CDN base for custom emoji images.
pub const EMOJI_CDN_BASE: &str = "https://cdn.discordapp.com/emojis";

/// Extension preference when the emoji is animated.
pub const ANIMATED_EXTENSIONS: [&str; 3] = ["gif", "webp", "png"];

/// Extension preference for static emoji.
pub const STATIC_EXTENSIONS: [&str; 3] = ["webp", "png", "gif"];

/// Split plain text into text and emoji segments.
///
/// Tokens without an id stay literal text; empty text spans are dropped.
pub fn segment_text(text: &str) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in EMOJI_PATTERN.captures_iter(text) {
        let whole = caps.get(0).expect("match 0");
        if whole.start() > last_end {
            push_text(&mut segments, &text[last_end..whole.start()]);
        }

        match caps.get(3) {
            Some(id) => segments.push(Segment::Emoji {
                name: caps[2].to_string(),
                id: Some(id.as_str().to_string()),
                animated: !caps[1].is_empty(),
            }),
            None => push_text(&mut segments, whole.as_str()),
        }
        last_end = whole.end();
    }

    if last_end < text.len() {
        push_text(&mut segments, &text[last_end..]);
    }
    segments
}

fn push_text(segments: &mut Vec<Segment>, content: &str) {
    if !content.is_empty() {
        segments.push(Segment::Text {
            content: content.to_string(),
        });
    }
}

/// Render an ordered list of segments into inline nodes.
pub async fn render_segments(
    doc: &mut Document,
    fetcher: &dyn MediaFetcher,
    segments: &[Segment],
) -> Result<Vec<NodeId>, RenderError> {
    let mut nodes = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text { content } => render_text_lines(doc, content, &mut nodes)?,
            Segment::Emoji { name, id, animated } => match id {
                Some(id) => nodes.push(resolve_emoji(doc, fetcher, name, id, *animated).await?),
                // No id means the token never pointed at an uploadable
                // emoji; keep the literal form.
                None => nodes.push(doc.create_text(&format!(":{name}:"))),
            },
        }
    }
    Ok(nodes)
}

/// Render plain text, preserving user line breaks as `br` elements.
pub fn render_text_lines(
    doc: &mut Document,
    text: &str,
    nodes: &mut Vec<NodeId>,
) -> Result<(), RenderError> {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(doc.create_element("br"));
        }
        if !line.is_empty() {
            nodes.push(doc.create_text(line));
        }
    }
    Ok(())
}

/// Resolve a custom emoji to an image node, walking the extension chain.
///
/// Each retry after the first carries a cache-busting query parameter so an
/// intermediary that cached a failure does not pin the chain. Exhausting
/// every extension falls back to the literal `:name:` text.
pub async fn resolve_emoji(
    doc: &mut Document,
    fetcher: &dyn MediaFetcher,
    name: &str,
    id: &str,
    animated: bool,
) -> Result<NodeId, RenderError> {
    let extensions = if animated {
        ANIMATED_EXTENSIONS
    } else {
        STATIC_EXTENSIONS
    };

    for (attempt, ext) in extensions.iter().enumerate() {
        let url = if attempt == 0 {
            format!("{EMOJI_CDN_BASE}/{id}.{ext}")
        } else {
            format!("{EMOJI_CDN_BASE}/{id}.{ext}?retry={attempt}")
        };
        if fetcher.probe(&url).await {
            let img = doc.create_element("img");
            doc.set_attr(img, "class", "emoji")?;
            doc.set_attr(img, "src", &url)?;
            doc.set_attr(img, "alt", &format!(":{name}:"))?;
            return Ok(img);
        }
        debug!(emoji = name, ext, attempt, "emoji source failed, advancing chain");
    }

    Ok(doc.create_text(&format!(":{name}:")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fetch::testing::ScriptedFetcher;

    #[test]
    fn segments_plain_text_as_single_run() {
        let segments = segment_text("hello world");
        assert_eq!(
            segments,
            vec![Segment::Text {
                content: "hello world".to_string()
            }]
        );
    }

    #[test]
    fn segments_animated_emoji_token() {
        let segments = segment_text("hi <a:wave:123> there");
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[1],
            Segment::Emoji {
                name: "wave".to_string(),
                id: Some("123".to_string()),
                animated: true,
            }
        );
    }

    #[test]
    fn static_emoji_token_is_not_animated() {
        let segments = segment_text("<:smile:42>");
        assert_eq!(
            segments[0],
            Segment::Emoji {
                name: "smile".to_string(),
                id: Some("42".to_string()),
                animated: false,
            }
        );
    }

    #[test]
    fn idless_token_stays_literal() {
        let segments = segment_text("look <:shrug>");
        assert_eq!(
            segments,
            vec![
                Segment::Text {
                    content: "look ".to_string()
                },
                Segment::Text {
                    content: "<:shrug>".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_text_yields_no_segments() {
        assert!(segment_text("").is_empty());
    }

    #[tokio::test]
    async fn text_lines_become_text_and_breaks() {
        let mut doc = Document::new();
        let fetcher = ScriptedFetcher::new();
        let nodes = render_segments(
            &mut doc,
            &fetcher,
            &[Segment::Text {
                content: "one\ntwo".to_string(),
            }],
        )
        .await
        .unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(doc.tag(nodes[1]).unwrap(), Some("br"));
        assert_eq!(doc.text_content(nodes[0]).unwrap(), "one");
        assert_eq!(doc.text_content(nodes[2]).unwrap(), "two");
    }

    #[tokio::test]
    async fn animated_emoji_prefers_gif() {
        let mut doc = Document::new();
        let fetcher = ScriptedFetcher::new().serve(".gif", b"gif");
        let node = resolve_emoji(&mut doc, &fetcher, "wave", "123", true)
            .await
            .unwrap();
        assert_eq!(
            doc.attr(node, "src").unwrap(),
            Some("https://cdn.discordapp.com/emojis/123.gif")
        );
    }

    #[tokio::test]
    async fn third_extension_wins_after_two_failures() {
        let mut doc = Document::new();
        // Static preference is webp -> png -> gif; only gif is served.
        let fetcher = ScriptedFetcher::new().serve(".gif", b"gif");
        let node = resolve_emoji(&mut doc, &fetcher, "smile", "42", false)
            .await
            .unwrap();

        let src = doc.attr(node, "src").unwrap().unwrap();
        assert!(src.starts_with("https://cdn.discordapp.com/emojis/42.gif"));
        assert!(src.contains("retry=2"), "retries carry a cache-buster: {src}");

        let requested = fetcher.requested();
        assert_eq!(requested.len(), 3);
        assert!(requested[0].ends_with("42.webp"));
        assert!(requested[1].contains("42.png?retry=1"));
    }

    #[tokio::test]
    async fn exhausted_chain_falls_back_to_literal_name() {
        let mut doc = Document::new();
        let fetcher = ScriptedFetcher::new();
        let node = resolve_emoji(&mut doc, &fetcher, "gone", "9", true)
            .await
            .unwrap();
        assert_eq!(doc.tag(node).unwrap(), None);
        assert_eq!(doc.text_content(node).unwrap(), ":gone:");
        assert_eq!(fetcher.fetch_count(), 3);
    }

    #[tokio::test]
    async fn idless_emoji_segment_renders_literal() {
        let mut doc = Document::new();
        let fetcher = ScriptedFetcher::new();
        let nodes = render_segments(
            &mut doc,
            &fetcher,
            &[Segment::Emoji {
                name: "mystery".to_string(),
                id: None,
                animated: false,
            }],
        )
        .await
        .unwrap();
        assert_eq!(doc.text_content(nodes[0]).unwrap(), ":mystery:");
        assert_eq!(fetcher.fetch_count(), 0);
    }
}
