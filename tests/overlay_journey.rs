//! End-to-end journeys: feed polling into a rendered overlay, and the
//! embedded-widget sizing handshake between a hosted frame and its host
//! page.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::http::header;
use axum::routing::get;

use chatframe::config::{FeedTarget, OverlayConfig};
use chatframe::dom::{Document, NodeId};
use chatframe::embed::{
    EmbedHost, EmbedOptions, MessageEnvelope, MountTarget, SizeReporter, build_url,
};
use chatframe::feed::{ChatPoller, FeedClient};
use chatframe::render::fetch::testing::ScriptedFetcher;
use chatframe::render::media::MediaResolver;
use chatframe::render::{ChatRenderer, RenderOutcome};

/// Serve `/chat` returning `payloads[n]` on the nth request (the last
/// payload repeats once the sequence is exhausted).
async fn serve_sequence(payloads: Vec<&'static str>) -> String {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler = move || {
        let payloads = payloads.clone();
        let hits = Arc::clone(&hits);
        async move {
            let n = hits.fetch_add(1, Ordering::SeqCst);
            let body = payloads[n.min(payloads.len() - 1)];
            ([(header::CONTENT_TYPE, "application/json")], body)
        }
    };
    let app = Router::new().route("/chat", get(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn overlay(doc: &mut Document, config: OverlayConfig, fetcher: ScriptedFetcher) -> ChatRenderer {
    let container = doc.create_element("div");
    let root = doc.root();
    doc.append_child(root, container).unwrap();
    ChatRenderer::new(config, MediaResolver::new(Arc::new(fetcher)), container)
}

fn find_img(doc: &Document, under: NodeId) -> Option<NodeId> {
    let mut stack = vec![under];
    while let Some(id) = stack.pop() {
        if doc.tag(id).ok()? == Some("img") {
            return Some(id);
        }
        stack.extend(doc.children(id).ok()?.iter().copied());
    }
    None
}

mod overlay_polling {
    use super::*;

    const FIRST: &str = r#"[{"author": "Ann", "content": "hello", "media": []}]"#;
    const THIRD: &str = r#"[
        {"author": "Ann", "content": "hello", "media": []},
        {"author": "Bob", "content": "hi <a:wave:123>"}
    ]"#;

    #[tokio::test]
    async fn three_polls_build_skip_then_append() {
        let origin = serve_sequence(vec![FIRST, FIRST, THIRD]).await;

        let mut doc = Document::new();
        let renderer = overlay(
            &mut doc,
            OverlayConfig::default(),
            ScriptedFetcher::new().serve("123.gif", b"gif"),
        );
        let container = renderer.container();
        let client = FeedClient::new(&origin, FeedTarget::Obs);
        let mut poller = ChatPoller::new(client, renderer, doc);

        // First poll: one row, username prefix and text.
        assert_eq!(poller.poll_once().await.unwrap(), RenderOutcome::Appended(1));
        let doc = poller.document();
        assert_eq!(doc.child_count(container).unwrap(), 1);
        let first_row = doc.children(container).unwrap()[0];
        assert!(
            doc.text_content(first_row)
                .unwrap()
                .starts_with("Ann: hello")
        );

        // Second poll returns the identical array: nothing changes.
        assert_eq!(poller.poll_once().await.unwrap(), RenderOutcome::Unchanged);
        assert_eq!(poller.document().child_count(container).unwrap(), 1);

        // Third poll appends exactly one row; the first is untouched.
        assert_eq!(poller.poll_once().await.unwrap(), RenderOutcome::Appended(1));
        let doc = poller.document();
        let rows = doc.children(container).unwrap().to_vec();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], first_row);

        // Bob's animated emoji resolved to the animated-preferred
        // extension.
        let img = find_img(doc, rows[1]).expect("emoji image in Bob's row");
        let src = doc.attr(img, "src").unwrap().unwrap();
        assert!(src.contains("/123.gif"), "unexpected emoji source {src}");
    }

    #[tokio::test]
    async fn feed_reset_rebuilds_the_container() {
        const TWO: &str = r#"[
            {"author": "Ann", "content": "one"},
            {"author": "Bob", "content": "two"}
        ]"#;
        const DROPPED: &str = r#"[
            {"author": "Bob", "content": "two"},
            {"author": "Cat", "content": "three"}
        ]"#;
        let origin = serve_sequence(vec![TWO, DROPPED]).await;

        let mut doc = Document::new();
        let renderer = overlay(&mut doc, OverlayConfig::default(), ScriptedFetcher::new());
        let container = renderer.container();
        let mut poller = ChatPoller::new(FeedClient::new(&origin, FeedTarget::Obs), renderer, doc);

        poller.poll_once().await.unwrap();
        let before = poller.document().children(container).unwrap().to_vec();

        assert_eq!(poller.poll_once().await.unwrap(), RenderOutcome::Rebuilt(2));
        let after = poller.document().children(container).unwrap().to_vec();
        assert!(after.iter().all(|id| !before.contains(id)));
        assert!(
            poller
                .document()
                .text_content(container)
                .unwrap()
                .contains("three")
        );
    }
}

mod embedded_widget {
    use super::*;

    fn embedded_config() -> OverlayConfig {
        let mut config = OverlayConfig::default();
        config.embed = true;
        config.auto_resize = true;
        config
    }

    #[tokio::test]
    async fn hosted_frame_size_flows_to_the_host_iframe() {
        // Hosted side: poll, render, report.
        let origin =
            serve_sequence(vec![r#"[{"author": "Ann", "content": "hello"}]"#]).await;
        let mut doc = Document::new();
        let config = embedded_config();
        let (size_tx, mut size_rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = SizeReporter::new(&config, false, size_tx);
        let renderer = overlay(&mut doc, config, ScriptedFetcher::new());
        let mut poller = ChatPoller::new(FeedClient::new(&origin, FeedTarget::Obs), renderer, doc)
            .with_reporter(reporter);

        poller.poll_once().await.unwrap();
        let report = size_rx.try_recv().expect("first render reports a height");
        assert!(report.height > 0);

        // Host side: apply the report through the registry.
        let mut host_doc = Document::new();
        let slot = host_doc.create_element("div");
        let root = host_doc.root();
        host_doc.append_child(root, slot).unwrap();
        let mut host = EmbedHost::new();
        let iframe = host
            .mount(
                &mut host_doc,
                MountTarget::Node(slot),
                "http://localhost:8080",
                EmbedOptions::default()
                    .with_auto_resize(true)
                    .with_min_height(100)
                    .with_max_height(600),
            )
            .unwrap();

        let applied = host
            .on_window_message(
                &mut host_doc,
                &MessageEnvelope {
                    sender: iframe,
                    data: serde_json::to_value(&report).unwrap(),
                },
            )
            .unwrap();
        // One short row measures under the minimum bound.
        assert_eq!(applied, Some(report.height.max(100)));
    }

    #[tokio::test]
    async fn stable_height_reports_exactly_once() {
        let payload = r#"[{"author": "Ann", "content": "hello"}]"#;
        let origin = serve_sequence(vec![payload, payload]).await;

        let mut doc = Document::new();
        let config = embedded_config();
        let (size_tx, mut size_rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = SizeReporter::new(&config, false, size_tx);
        let renderer = overlay(&mut doc, config, ScriptedFetcher::new());
        let mut poller = ChatPoller::new(FeedClient::new(&origin, FeedTarget::Obs), renderer, doc)
            .with_reporter(reporter);

        poller.poll_once().await.unwrap();
        poller.poll_once().await.unwrap();

        assert!(size_rx.try_recv().is_ok());
        assert!(size_rx.try_recv().is_err(), "duplicate height was re-sent");
    }

    #[tokio::test]
    async fn built_url_round_trips_through_the_hosted_config() {
        let url = build_url(
            "http://host/chat/",
            &EmbedOptions::default()
                .with_transparent(true)
                .with_hide_usernames(true)
                .with_auto_resize(true)
                .with_max_height(400),
        )
        .unwrap();

        let parsed = url::Url::parse(&url).unwrap();
        let config = OverlayConfig::from_url(&parsed).unwrap();
        assert!(config.embed);
        assert_eq!(config.target, FeedTarget::Embed);
        assert!(config.transparent);
        assert!(config.hide_usernames);
        assert!(config.auto_resize);
        assert_eq!(config.max_height, 400);
    }
}
