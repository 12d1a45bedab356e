//! Media attachment resolution.
//!
//! Turns one [`MediaItem`] into a renderable node, or nothing when every
//! candidate source fails. Lottie animations go through a process-wide
//! loader that initializes the animation runtime at most once and coalesces
//! concurrent fetches of the same payload URL.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::{MediaError, RenderError};
use crate::feed::message::MediaItem;
use crate::render::fetch::MediaFetcher;

/// Rendered height of an inline video attachment.
const VIDEO_HEIGHT: u32 = 180;

/// Rendered height of stickers and image attachments.
const MEDIA_HEIGHT: u32 = 160;

/// Loads the vector-animation runtime once and caches animation payloads
/// per URL, coalescing concurrent fetches into one request.
pub struct LottieLoader {
    runtime: OnceCell<bool>,
    runtime_available: bool,
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<serde_json::Value>>>>>,
}

impl LottieLoader {
    pub fn new() -> Self {
        Self {
            runtime: OnceCell::new(),
            runtime_available: true,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Construct a loader whose runtime never comes up, for exercising the
    /// static-fallback degrade path.
    pub fn without_runtime() -> Self {
        Self {
            runtime_available: false,
            ..Self::new()
        }
    }

    /// Memoized runtime initialization. The first caller performs the
    /// load; everyone else observes the memoized outcome.
    pub async fn ensure_runtime(&self) -> Result<(), MediaError> {
        let available = self
            .runtime
            .get_or_init(|| async { self.runtime_available })
            .await;
        if *available {
            Ok(())
        } else {
            Err(MediaError::RuntimeUnavailable(
                "animation runtime failed to initialize".to_string(),
            ))
        }
    }

    /// Fetch and parse an animation payload, trying each candidate URL in
    /// order. Successful payloads are cached per URL; concurrent callers
    /// for the same URL share one in-flight fetch. Failures are not
    /// cached, so a later poll can retry.
    pub async fn load_animation(
        &self,
        fetcher: &dyn MediaFetcher,
        urls: &[String],
    ) -> Result<(String, Arc<serde_json::Value>), MediaError> {
        self.ensure_runtime().await?;

        for url in urls {
            let cell = {
                let mut cache = self.cache.lock().expect("lottie cache poisoned");
                Arc::clone(cache.entry(url.clone()).or_default())
            };

            let result = cell
                .get_or_try_init(|| async {
                    let bytes = fetcher.fetch(url).await?;
                    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
                        MediaError::InvalidPayload {
                            url: url.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    Ok::<_, MediaError>(Arc::new(value))
                })
                .await;

            match result {
                Ok(payload) => return Ok((url.clone(), Arc::clone(payload))),
                Err(err) => {
                    debug!(url, %err, "animation source failed, trying next");
                    // Only successful payloads occupy the cache; drop the
                    // unset cell so dead URLs cannot accumulate entries
                    // over the page session.
                    let mut cache = self.cache.lock().expect("lottie cache poisoned");
                    if cache.get(url).is_some_and(|cell| cell.get().is_none()) {
                        cache.remove(url);
                    }
                }
            }
        }

        Err(MediaError::SourcesExhausted {
            kind: "lottie".to_string(),
            attempts: urls.len(),
        })
    }

    /// Drop all cached payloads and the runtime memo (test isolation).
    pub fn reset(&mut self) {
        self.runtime = OnceCell::new();
        self.cache.lock().expect("lottie cache poisoned").clear();
    }

    pub fn cached_payloads(&self) -> usize {
        self.cache.lock().expect("lottie cache poisoned").len()
    }
}

impl Default for LottieLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves media descriptors into document nodes.
pub struct MediaResolver {
    fetcher: Arc<dyn MediaFetcher>,
    lottie: LottieLoader,
}

impl MediaResolver {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            fetcher,
            lottie: LottieLoader::new(),
        }
    }

    pub fn with_lottie_loader(mut self, loader: LottieLoader) -> Self {
        self.lottie = loader;
        self
    }

    pub fn fetcher(&self) -> &dyn MediaFetcher {
        self.fetcher.as_ref()
    }

    /// Reset shared media state between tests.
    pub fn reset(&mut self) {
        self.lottie.reset();
    }

    /// Resolve one media descriptor into a node, or `None` when nothing
    /// renderable survives the fallback chains. Network failures never
    /// surface as errors; the element is simply dropped.
    pub async fn resolve(
        &self,
        doc: &mut Document,
        item: &MediaItem,
    ) -> Result<Option<NodeId>, RenderError> {
        match item {
            MediaItem::Video { url, looped, autoplay } => {
                let video = doc.create_element("video");
                doc.set_attr(video, "src", url)?;
                doc.set_attr(video, "muted", "true")?;
                doc.set_attr(video, "playsinline", "true")?;
                if *looped {
                    doc.set_attr(video, "loop", "true")?;
                }
                if *autoplay {
                    doc.set_attr(video, "autoplay", "true")?;
                }
                doc.set_explicit_height(video, VIDEO_HEIGHT)?;
                Ok(Some(video))
            }

            MediaItem::Lottie {
                url,
                lottie_urls,
                fallback_url,
                fallback_urls,
                looped,
                autoplay,
            } => {
                let mut candidates: Vec<String> = lottie_urls.clone();
                if candidates.is_empty() {
                    candidates.extend(url.clone());
                }

                match self.lottie.load_animation(self.fetcher.as_ref(), &candidates).await {
                    Ok((source, _payload)) => {
                        let node = doc.create_element("lottie");
                        doc.set_attr(node, "src", &source)?;
                        if *looped {
                            doc.set_attr(node, "loop", "true")?;
                        }
                        if *autoplay {
                            doc.set_attr(node, "autoplay", "true")?;
                        }
                        doc.set_explicit_height(node, MEDIA_HEIGHT)?;
                        Ok(Some(node))
                    }
                    Err(err) => {
                        debug!(%err, "lottie unavailable, degrading to static fallback");
                        let fallbacks: Vec<&String> =
                            fallback_url.iter().chain(fallback_urls.iter()).collect();
                        for candidate in fallbacks {
                            if self.fetcher.probe(candidate).await {
                                let img = doc.create_element("img");
                                doc.set_attr(img, "src", candidate)?;
                                doc.set_explicit_height(img, MEDIA_HEIGHT)?;
                                return Ok(Some(img));
                            }
                        }
                        Ok(None)
                    }
                }
            }

            MediaItem::Image {
                url,
                fallback_url,
                fallback_urls,
            } => {
                let chain: Vec<&String> = std::iter::once(url)
                    .chain(fallback_url.iter())
                    .chain(fallback_urls.iter())
                    .collect();
                for candidate in chain {
                    if self.fetcher.probe(candidate).await {
                        let img = doc.create_element("img");
                        doc.set_attr(img, "src", candidate)?;
                        doc.set_explicit_height(img, MEDIA_HEIGHT)?;
                        return Ok(Some(img));
                    }
                    debug!(url = candidate, "image source failed, trying fallback");
                }
                Ok(None)
            }
        }
    }
}
