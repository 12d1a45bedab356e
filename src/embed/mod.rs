//! Embeddable-widget surface: iframe URL construction, host-page
//! mounting, and the bidirectional resize protocol.

pub mod mount;
pub mod protocol;
pub mod report;
pub mod url;

pub use mount::{EmbedHost, MountTarget, create_iframe};
pub use protocol::{MessageEnvelope, SizeMessage};
pub use report::SizeReporter;
pub use url::build_url;

use crate::config::FeedTarget;

/// Host-page options for building and mounting a chat frame.
pub struct EmbedOptions {
    pub target: FeedTarget,
    pub transparent: bool,
    pub hide_usernames: bool,
    pub auto_resize: bool,
    pub background: Option<String>,
    pub message_background: Option<String>,
    pub text_color: Option<String>,
    pub username_color: Option<String>,
    pub font: Option<String>,
    pub background_media: Option<String>,
    pub frame_height: Option<u32>,
    pub max_height: Option<u32>,
    pub min_height: Option<u32>,
    /// Invoked with each raw reported height, before clamping.
    pub on_resize: Option<Box<dyn FnMut(u32) + Send>>,
}

impl std::fmt::Debug for EmbedOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedOptions")
            .field("target", &self.target)
            .field("transparent", &self.transparent)
            .field("hide_usernames", &self.hide_usernames)
            .field("auto_resize", &self.auto_resize)
            .field("frame_height", &self.frame_height)
            .field("max_height", &self.max_height)
            .field("min_height", &self.min_height)
            .field("on_resize", &self.on_resize.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            // The widget feed, not the broadcast overlay feed.
            target: FeedTarget::Embed,
            transparent: false,
            hide_usernames: false,
            auto_resize: false,
            background: None,
            message_background: None,
            text_color: None,
            username_color: None,
            font: None,
            background_media: None,
            frame_height: None,
            max_height: None,
            min_height: None,
            on_resize: None,
        }
    }
}

impl EmbedOptions {
    pub fn with_target(mut self, target: FeedTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_hide_usernames(mut self, hide: bool) -> Self {
        self.hide_usernames = hide;
        self
    }

    pub fn with_auto_resize(mut self, auto_resize: bool) -> Self {
        self.auto_resize = auto_resize;
        self
    }

    pub fn with_background(mut self, background: &str) -> Self {
        self.background = Some(background.to_string());
        self
    }

    pub fn with_frame_height(mut self, height: u32) -> Self {
        self.frame_height = Some(height);
        self
    }

    pub fn with_max_height(mut self, max: u32) -> Self {
        self.max_height = Some(max);
        self
    }

    pub fn with_min_height(mut self, min: u32) -> Self {
        self.min_height = Some(min);
        self
    }

    pub fn with_on_resize(mut self, callback: impl FnMut(u32) + Send + 'static) -> Self {
        self.on_resize = Some(Box::new(callback));
        self
    }
}
