//! HTTP client for the chat feed endpoints.

use tracing::debug;

use crate::config::FeedTarget;
use crate::error::FeedError;
use crate::feed::message::{Message, RawMessage};

/// Fetches the full message history from one feed endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    origin: String,
    target: FeedTarget,
}

impl FeedClient {
    pub fn new(origin: &str, target: FeedTarget) -> Self {
        Self::with_client(reqwest::Client::new(), origin, target)
    }

    pub fn with_client(client: reqwest::Client, origin: &str, target: FeedTarget) -> Self {
        Self {
            client,
            origin: origin.trim_end_matches('/').to_string(),
            target,
        }
    }

    pub fn target(&self) -> FeedTarget {
        self.target
    }

    /// Full URL of the feed endpoint this client polls.
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.origin, self.target.endpoint())
    }

    /// One fetch of the feed: the complete retained history, oldest
    /// first, already resolved into canonical messages.
    pub async fn fetch(&self) -> Result<Vec<Message>, FeedError> {
        let url = self.endpoint_url();
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::BadStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let raw: Vec<RawMessage> = serde_json::from_str(&body)?;
        debug!(count = raw.len(), url, "fetched feed history");
        Ok(raw.into_iter().map(Message::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::message::Body;

    async fn serve(status: axum::http::StatusCode, body: &'static str) -> String {
        use axum::http::header;

        let app = axum::Router::new().route(
            "/chat",
            axum::routing::get(move || async move {
                (
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn endpoint_url_joins_origin_and_target() {
        let obs = FeedClient::new("http://localhost:8080/", FeedTarget::Obs);
        assert_eq!(obs.endpoint_url(), "http://localhost:8080/chat");

        let embed = FeedClient::new("http://localhost:8080", FeedTarget::Embed);
        assert_eq!(embed.endpoint_url(), "http://localhost:8080/embed-chat");
    }

    #[tokio::test]
    async fn fetch_resolves_raw_records_into_messages() {
        let origin = serve(
            axum::http::StatusCode::OK,
            r#"[{"author": "Ann", "content": "hello"}]"#,
        )
        .await;

        let messages = FeedClient::new(&origin, FeedTarget::Obs).fetch().await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].author, "Ann");
        assert_eq!(messages[0].body, Body::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let origin = serve(axum::http::StatusCode::BAD_GATEWAY, "oops").await;
        let err = FeedClient::new(&origin, FeedTarget::Obs).fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::BadStatus { status: 502, .. }));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let origin = serve(axum::http::StatusCode::OK, "{not json").await;
        let err = FeedClient::new(&origin, FeedTarget::Obs).fetch().await.unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }
}
