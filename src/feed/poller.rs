//! Fixed-interval polling loop driving the renderer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::dom::Document;
use crate::embed::SizeReporter;
use crate::error::Result;
use crate::feed::client::FeedClient;
use crate::render::{ChatRenderer, RenderOutcome};

/// Owns the whole hosted-page pipeline: fetch, reconcile, report size.
///
/// A failed cycle is logged and the last good render persists; the timer
/// keeps ticking regardless.
pub struct ChatPoller {
    client: FeedClient,
    renderer: ChatRenderer,
    doc: Document,
    reporter: Option<SizeReporter>,
    interval: Duration,
}

impl ChatPoller {
    pub fn new(client: FeedClient, renderer: ChatRenderer, doc: Document) -> Self {
        let interval = Duration::from_millis(renderer.config().poll_interval_ms);
        Self {
            client,
            renderer,
            doc,
            reporter: None,
            interval,
        }
    }

    pub fn with_reporter(mut self, reporter: SizeReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn renderer(&self) -> &ChatRenderer {
        &self.renderer
    }

    /// One full cycle: fetch the feed, patch the container, report the
    /// new height.
    pub async fn poll_once(&mut self) -> Result<RenderOutcome> {
        let messages = self.client.fetch().await?;
        let outcome = self.renderer.render(&mut self.doc, &messages).await?;
        if let Some(reporter) = self.reporter.as_mut() {
            let height = self.renderer.measure(&self.doc)?;
            reporter.report(height);
        }
        Ok(outcome)
    }

    /// Poll forever on the configured interval.
    pub async fn run(mut self) {
        info!(
            endpoint = self.client.endpoint_url(),
            interval_ms = self.interval.as_millis() as u64,
            "starting chat poller"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.poll_once().await {
                warn!(%err, "poll cycle failed, keeping last render");
            }
        }
    }

    /// Spawn the loop onto the runtime. The handle is the disposer.
    pub fn spawn(self) -> PollerHandle {
        PollerHandle {
            task: tokio::spawn(self.run()),
        }
    }
}

/// Cancels the polling task when disposed.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn dispose(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
