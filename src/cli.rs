//! Command-line entrypoint for the terminal preview runner.
//!
//! The binary stands in for the hosted page: it polls the feed, drives
//! the renderer, and either runs forever (overlay mode) or renders once
//! and prints the transcript.

use clap::Parser;
use tracing::info;

use crate::config::{DEFAULT_POLL_INTERVAL_MS, FeedTarget, OverlayConfig, theme::ThemeVars};
use crate::dom::Document;
use crate::embed::SizeReporter;
use crate::error::ConfigError;
use crate::feed::{ChatPoller, FeedClient};
use crate::render::fetch::HttpFetcher;
use crate::render::media::MediaResolver;
use crate::render::ChatRenderer;

#[derive(Debug, Parser)]
#[command(name = "chatframe", version, about = "Chat relay overlay client")]
pub struct Cli {
    /// Relay origin serving the feed endpoints, e.g. http://localhost:8080
    #[arg(long, env = "CHATFRAME_ORIGIN")]
    pub origin: Option<String>,

    /// Which feed to poll: obs or embed.
    #[arg(long, default_value = "obs", value_parser = parse_target)]
    pub target: FeedTarget,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Extra page configuration as a query string (same keys the hosted
    /// page accepts, e.g. "hide_usernames=1&max_height=400").
    #[arg(long)]
    pub query: Option<String>,

    /// Fetch once, print the rendered transcript, and exit.
    #[arg(long)]
    pub once: bool,
}

fn parse_target(value: &str) -> Result<FeedTarget, String> {
    value.parse().map_err(|e: ConfigError| e.to_string())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let origin = cli.origin.ok_or_else(|| ConfigError::MissingRequired {
        key: "origin".to_string(),
        hint: "Pass --origin or set CHATFRAME_ORIGIN".to_string(),
    })?;

    let mut config = match cli.query.as_deref() {
        Some(query) => OverlayConfig::from_query(query)?,
        None => OverlayConfig::default(),
    };
    config.target = cli.target;
    config.poll_interval_ms = cli.interval_ms;
    config.api_origin = Some(origin.clone());

    let mut doc = Document::new();
    let container = doc.create_element("div");
    doc.set_attr(container, "id", "chat")?;
    let root = doc.root();
    doc.append_child(root, container)?;

    let theme = ThemeVars::from_config(&config);
    if !theme.is_empty() {
        theme.apply(&mut doc, root)?;
    }

    let client = FeedClient::new(&origin, config.target);
    let media = MediaResolver::new(std::sync::Arc::new(HttpFetcher::default()));
    let (size_tx, mut size_rx) = tokio::sync::mpsc::unbounded_channel();
    let reporter = SizeReporter::new(&config, !config.embed, size_tx);
    let renderer = ChatRenderer::new(config, media, container);
    let mut poller = ChatPoller::new(client, renderer, doc).with_reporter(reporter);

    if cli.once {
        let outcome = poller.poll_once().await?;
        info!(?outcome, "rendered one poll");
        print_transcript(&poller);
        return Ok(());
    }

    tokio::spawn(async move {
        while let Some(message) = size_rx.recv().await {
            info!(height = message.height, "size report");
        }
    });
    poller.run().await;
    Ok(())
}

fn print_transcript(poller: &ChatPoller) {
    let doc = poller.document();
    let container = poller.renderer().container();
    let Ok(rows) = doc.children(container) else {
        return;
    };
    for &row in rows {
        if let Ok(text) = doc.text_content(row) {
            println!("{}", text.replace('\n', " "));
        }
    }
}
