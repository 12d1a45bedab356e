//! Host-page mounting and the inbound half of the resize protocol.

use std::collections::HashMap;

use tracing::{debug, error};

use crate::dom::{Document, NodeId};
use crate::embed::protocol::{MessageEnvelope, SizeMessage};
use crate::embed::{EmbedOptions, url::build_url};
use crate::error::{EmbedError, Result};

/// Default bounds applied to auto-resized frames.
pub const DEFAULT_MIN_HEIGHT: u32 = 100;
pub const DEFAULT_MAX_HEIGHT: u32 = 600;

/// Where to mount the chat frame.
#[derive(Debug, Clone)]
pub enum MountTarget {
    Node(NodeId),
    /// `#id` selector resolved against the host document. Fails loudly
    /// when nothing matches.
    Selector(String),
}

/// Resize bounds for a frame, validated once.
fn resize_bounds(options: &EmbedOptions) -> Result<(u32, u32)> {
    let min_height = options.min_height.unwrap_or(DEFAULT_MIN_HEIGHT);
    let max_height = options.max_height.unwrap_or(DEFAULT_MAX_HEIGHT);
    if min_height > max_height {
        return Err(EmbedError::InvalidBounds {
            min: min_height,
            max: max_height,
        }
        .into());
    }
    Ok((min_height, max_height))
}

/// Build a configured, detached chat-frame iframe element. Hosts that
/// manage placement themselves use this directly; [`EmbedHost::mount`]
/// appends and registers it as well.
pub fn create_iframe(
    doc: &mut Document,
    origin: &str,
    options: &EmbedOptions,
) -> Result<NodeId> {
    let (min_height, max_height) = resize_bounds(options)?;
    let src = build_url(origin, options)?;

    let iframe = doc.create_element("iframe");
    doc.set_attr(iframe, "src", &src)?;
    doc.set_attr(iframe, "frameborder", "0")?;
    doc.set_attr(iframe, "width", "100%")?;
    let initial = options
        .frame_height
        .unwrap_or(max_height)
        .clamp(min_height, max_height);
    doc.set_attr(iframe, "height", &format!("{initial}px"))?;
    doc.set_attr(iframe, "min-height", &format!("{min_height}px"))?;
    doc.set_attr(iframe, "max-height", &format!("{max_height}px"))?;
    if options.transparent {
        doc.set_attr(iframe, "allowtransparency", "true")?;
        doc.set_attr(iframe, "background", "transparent")?;
    }
    doc.set_explicit_height(iframe, initial)?;
    Ok(iframe)
}

struct ResizeEntry {
    min_height: u32,
    max_height: u32,
    callback: Option<Box<dyn FnMut(u32) + Send>>,
}

/// Host-page side of the embed surface: mounts iframes and sizes them
/// from the hosted frame's reports.
///
/// One instance owns the resize registry; the host wires its window
/// message events into [`EmbedHost::on_window_message`], which stands in
/// for the single global listener.
#[derive(Default)]
pub struct EmbedHost {
    registry: HashMap<NodeId, ResizeEntry>,
}

impl EmbedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered_frames(&self) -> usize {
        self.registry.len()
    }

    /// Create the iframe for a chat frame hosted at `origin` and append
    /// it to `target`. Registers the frame for resize handling when
    /// auto-resize or a callback was requested.
    pub fn mount(
        &mut self,
        doc: &mut Document,
        target: MountTarget,
        origin: &str,
        mut options: EmbedOptions,
    ) -> Result<NodeId> {
        let parent = match target {
            MountTarget::Node(id) => id,
            MountTarget::Selector(ref selector) => doc
                .find_by_id(selector)
                .ok_or_else(|| EmbedError::TargetNotFound(selector.clone()))?,
        };

        let (min_height, max_height) = resize_bounds(&options)?;
        let iframe = create_iframe(doc, origin, &options)?;
        doc.append_child(parent, iframe)?;

        if options.auto_resize || options.on_resize.is_some() {
            self.registry.insert(
                iframe,
                ResizeEntry {
                    min_height,
                    max_height,
                    callback: options.on_resize.take(),
                },
            );
        }
        Ok(iframe)
    }

    /// Handle one inbound window message. Returns the applied height, or
    /// `None` when the message was not a size report for a live
    /// registered frame.
    pub fn on_window_message(
        &mut self,
        doc: &mut Document,
        envelope: &MessageEnvelope,
    ) -> Result<Option<u32>> {
        let Some(message) = SizeMessage::parse(&envelope.data) else {
            return Ok(None);
        };
        let Some(entry) = self.registry.get_mut(&envelope.sender) else {
            return Ok(None);
        };

        if !doc.is_attached(envelope.sender) {
            debug!(frame = %envelope.sender, "frame detached, deregistering");
            self.registry.remove(&envelope.sender);
            return Ok(None);
        }

        let applied = message.height.clamp(entry.min_height, entry.max_height);
        doc.set_attr(envelope.sender, "height", &format!("{applied}px"))?;
        doc.set_explicit_height(envelope.sender, applied)?;
        if let Some(callback) = entry.callback.as_mut() {
            callback(message.height);
        }
        Ok(Some(applied))
    }

    /// Declarative mount from script-tag-style attributes (`data-origin`,
    /// `data-target`, dash-named options). Setup mistakes are logged and
    /// abort the mount instead of failing the page.
    pub fn auto_mount(
        &mut self,
        doc: &mut Document,
        attrs: &HashMap<String, String>,
    ) -> Option<NodeId> {
        match self.try_auto_mount(doc, attrs) {
            Ok(iframe) => Some(iframe),
            Err(err) => {
                error!(%err, "declarative embed mount failed");
                None
            }
        }
    }

    fn try_auto_mount(
        &mut self,
        doc: &mut Document,
        attrs: &HashMap<String, String>,
    ) -> Result<NodeId> {
        let origin = attrs
            .get("data-origin")
            .filter(|v| !v.trim().is_empty())
            .ok_or(EmbedError::MissingOrigin)?;
        let selector = attrs
            .get("data-target")
            .cloned()
            .unwrap_or_else(|| "#chatframe".to_string());

        let mut options = EmbedOptions::default();
        if let Some(target) = attrs.get("data-chat-target") {
            options.target = target.parse::<crate::config::FeedTarget>()?;
        }
        options.transparent = attr_flag(attrs, "data-transparent");
        options.hide_usernames = attr_flag(attrs, "data-hide-usernames");
        options.auto_resize = attr_flag(attrs, "data-auto-resize");
        options.background = attrs.get("data-background").cloned();
        options.message_background = attrs.get("data-message-background").cloned();
        options.text_color = attrs.get("data-text-color").cloned();
        options.username_color = attrs.get("data-username-color").cloned();
        options.font = attrs.get("data-font").cloned();
        options.background_media = attrs.get("data-background-media").cloned();
        if let Some(height) = attr_u32(attrs, "data-frame-height") {
            options.frame_height = Some(height);
        }
        if let Some(max) = attr_u32(attrs, "data-max-height") {
            options.max_height = Some(max);
        }
        if let Some(min) = attr_u32(attrs, "data-min-height") {
            options.min_height = Some(min);
        }

        self.mount(doc, MountTarget::Selector(selector), origin, options)
    }
}

fn attr_flag(attrs: &HashMap<String, String>, key: &str) -> bool {
    attrs
        .get(key)
        .is_some_and(|v| matches!(v.trim(), "" | "1" | "true" | "yes" | "on"))
}

fn attr_u32(attrs: &HashMap<String, String>, key: &str) -> Option<u32> {
    attrs.get(key).and_then(|v| v.trim().parse().ok())
}
