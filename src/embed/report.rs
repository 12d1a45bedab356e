//! Hosted-frame side of the resize protocol.

use tokio::sync::mpsc;
use tracing::trace;

use crate::config::OverlayConfig;
use crate::embed::protocol::SizeMessage;

/// Reports the chat container's rendered height to the parent window
/// after each patch, suppressing duplicates so a stable height never
/// floods the channel.
///
/// Inert unless the page is embedded with auto-resize on and is not
/// itself the top-level window.
pub struct SizeReporter {
    enabled: bool,
    max_height: u32,
    last_reported: Option<u32>,
    outbound: mpsc::UnboundedSender<SizeMessage>,
}

impl SizeReporter {
    pub fn new(
        config: &OverlayConfig,
        is_top_window: bool,
        outbound: mpsc::UnboundedSender<SizeMessage>,
    ) -> Self {
        Self {
            enabled: config.embed && config.auto_resize && !is_top_window,
            max_height: config.max_height,
            last_reported: None,
            outbound,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Report a measured height. Returns true when a message was sent.
    pub fn report(&mut self, measured: u32) -> bool {
        if !self.enabled {
            return false;
        }
        let height = measured.min(self.max_height);
        if self.last_reported == Some(height) {
            trace!(height, "height unchanged, suppressing size report");
            return false;
        }
        self.last_reported = Some(height);
        // A closed channel means the parent went away; nothing to do.
        let _ = self.outbound.send(SizeMessage::new(height));
        true
    }

    /// Forget the last report, forcing the next one through (remounts).
    pub fn reset(&mut self) {
        self.last_reported = None;
    }
}
