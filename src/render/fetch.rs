//! Network seam for media resolution.
//!
//! Everything that probes or downloads media goes through [`MediaFetcher`]
//! so the fallback-chain logic can be exercised with scripted fetchers in
//! tests while production uses one shared reqwest client.

use async_trait::async_trait;

use crate::error::MediaError;

/// Fetches media bytes by URL.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError>;

    /// Whether the URL loads at all. Used for image/emoji sources where
    /// the bytes themselves are never inspected.
    async fn probe(&self, url: &str) -> bool {
        self.fetch(url).await.is_ok()
    }
}

/// Production fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(MediaError::DownloadFailed {
                url: url.to_string(),
                reason: format!("status {}", response.status().as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

pub mod testing {
    //! Scripted fetcher for fallback-chain tests, shared with the
    //! integration suite.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Serves canned responses keyed by URL substring and records every
    /// requested URL in order.
    pub struct ScriptedFetcher {
        responses: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<String>>,
        fetch_count: AtomicUsize,
    }

    impl ScriptedFetcher {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                requests: Mutex::new(Vec::new()),
                fetch_count: AtomicUsize::new(0),
            }
        }

        /// Any fetched URL containing `needle` succeeds with `body`.
        pub fn serve(mut self, needle: &str, body: &[u8]) -> Self {
            self.responses.insert(needle.to_string(), body.to_vec());
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn fetch_count(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            self.responses
                .iter()
                .find(|(needle, _)| url.contains(needle.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| MediaError::DownloadFailed {
                    url: url.to_string(),
                    reason: "not scripted".to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedFetcher;
    use super::*;

    #[tokio::test]
    async fn scripted_fetcher_matches_by_substring() {
        let fetcher = ScriptedFetcher::new().serve(".png", b"png-bytes");
        assert!(fetcher.probe("http://cdn/emoji/123.png").await);
        assert!(!fetcher.probe("http://cdn/emoji/123.gif").await);
        assert_eq!(fetcher.requested().len(), 2);
    }
}
