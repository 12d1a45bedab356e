//! Incremental chat rendering.
//!
//! [`ChatRenderer`] reconciles each polled message list against the last
//! rendered state: identical payloads are no-ops, pure appends patch in
//! only the new suffix (keeping existing rows and their playing media
//! alive), and anything else rebuilds the container from scratch.

pub mod content;
pub mod fetch;
pub mod media;
pub mod template;

use tracing::{debug, warn};

use crate::config::OverlayConfig;
use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::feed::message::{Body, EmbedPayload, Message};
use crate::render::media::MediaResolver;
use crate::render::template::TemplateEngine;

/// What one render pass did to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Payload identical to the last pass; nothing touched.
    Unchanged,
    /// Append-only update; this many new rows were added.
    Appended(usize),
    /// Container cleared and rebuilt with this many rows.
    Rebuilt(usize),
}

pub struct ChatRenderer {
    config: OverlayConfig,
    media: MediaResolver,
    container: NodeId,
    snapshot: Vec<Message>,
    payload: String,
}

impl ChatRenderer {
    pub fn new(config: OverlayConfig, media: MediaResolver, container: NodeId) -> Self {
        Self {
            config,
            media,
            container,
            snapshot: Vec::new(),
            payload: String::new(),
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Reconcile the container with `messages` (oldest-first, the full
    /// known history as served by the feed).
    pub async fn render(
        &mut self,
        doc: &mut Document,
        messages: &[Message],
    ) -> Result<RenderOutcome, RenderError> {
        let payload = serde_json::to_string(messages)?;
        let rendered_rows = doc.child_count(self.container)?;

        if payload == self.payload && rendered_rows > 0 {
            return Ok(RenderOutcome::Unchanged);
        }

        // Unchanged payload with an empty container means something else
        // cleared the page (iframe remount); rebuild instead of skipping.
        let externally_cleared = payload == self.payload && rendered_rows == 0;

        let outcome = if !externally_cleared
            && messages.len() >= self.snapshot.len()
            && messages[..self.snapshot.len()] == self.snapshot[..]
        {
            let suffix = &messages[self.snapshot.len()..];
            for message in suffix {
                self.append_row(doc, message).await?;
            }
            RenderOutcome::Appended(suffix.len())
        } else {
            if externally_cleared {
                debug!("container cleared externally, rebuilding unchanged history");
            } else {
                debug!(
                    previous = self.snapshot.len(),
                    incoming = messages.len(),
                    "history prefix diverged, rebuilding"
                );
            }
            doc.clear_children(self.container)?;
            for message in messages {
                self.append_row(doc, message).await?;
            }
            RenderOutcome::Rebuilt(messages.len())
        };

        self.snapshot = messages.to_vec();
        self.payload = payload;
        doc.scroll_to_bottom(self.container)?;
        Ok(outcome)
    }

    /// Current rendered height of the container, the input to the
    /// embed size report.
    pub fn measure(&self, doc: &Document) -> Result<u32, RenderError> {
        doc.measure_height(self.container)
    }

    async fn append_row(
        &self,
        doc: &mut Document,
        message: &Message,
    ) -> Result<NodeId, RenderError> {
        let row = doc.create_element("div");
        doc.set_attr(row, "class", "chat-message")?;
        if let Some(color) = message.role_color.as_deref() {
            doc.set_attr(row, "data-role-color", color)?;
        }

        let content = self.content_nodes(doc, message).await?;
        TemplateEngine::new(&self.config).render_into(doc, row, message, content)?;
        doc.append_child(self.container, row)?;
        Ok(row)
    }

    /// Build the nodes for the `{{message}}` slot. Attached media takes
    /// over the slot entirely; text variants are never echoed next to
    /// their own rendered attachment.
    async fn content_nodes(
        &self,
        doc: &mut Document,
        message: &Message,
    ) -> Result<Vec<NodeId>, RenderError> {
        let mut nodes = Vec::new();

        for item in &message.media {
            match self.media.resolve(doc, item).await? {
                Some(node) => nodes.push(node),
                None => warn!(kind = item.kind(), "media item had no renderable source"),
            }
        }
        for embed in &message.embeds {
            if let Some(node) = self.render_embed(doc, embed).await? {
                nodes.push(node);
            }
        }

        if message.media.is_empty() {
            match &message.body {
                Body::Segments(segments) => {
                    nodes.extend(
                        content::render_segments(doc, self.media.fetcher(), segments).await?,
                    );
                }
                Body::Text(text) => {
                    let segments = content::segment_text(text);
                    nodes.extend(
                        content::render_segments(doc, self.media.fetcher(), &segments).await?,
                    );
                }
                Body::Empty => {}
            }

            // Last resort before an empty bubble.
            if nodes.is_empty() {
                if let Some(fallback) = message.text_fallback.as_deref() {
                    nodes.push(doc.create_text(fallback));
                }
            }
        }

        Ok(nodes)
    }

    /// Minimal rich-embed card: title, description, and the first image.
    async fn render_embed(
        &self,
        doc: &mut Document,
        embed: &EmbedPayload,
    ) -> Result<Option<NodeId>, RenderError> {
        let image_url = embed.image_url.as_ref().or(embed.thumbnail_url.as_ref());
        let has_text = embed.title.is_some() || embed.description.is_some();
        if !has_text && image_url.is_none() {
            return Ok(None);
        }

        let card = doc.create_element("div");
        doc.set_attr(card, "class", "chat-embed")?;
        if let Some(color) = embed.color.as_deref() {
            doc.set_attr(card, "data-accent", color)?;
        }
        if let Some(title) = embed.title.as_deref() {
            let node = doc.create_element("strong");
            let text = doc.create_text(title);
            doc.append_child(node, text)?;
            doc.append_child(card, node)?;
        }
        if let Some(description) = embed.description.as_deref() {
            if embed.title.is_some() {
                let br = doc.create_element("br");
                doc.append_child(card, br)?;
            }
            let text = doc.create_text(description);
            doc.append_child(card, text)?;
        }
        if let Some(url) = image_url {
            let item = crate::feed::message::MediaItem::Image {
                url: url.clone(),
                fallback_url: None,
                fallback_urls: Vec::new(),
            };
            if let Some(img) = self.media.resolve(doc, &item).await? {
                doc.append_child(card, img)?;
            }
        }
        Ok(Some(card))
    }
}
