//! Error types for chatframe.

/// Top-level error type for the overlay pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Embed error: {0}")]
    Embed(#[from] EmbedError),
}

/// Configuration-related errors.
///
/// Raised synchronously while resolving query parameters or CLI flags;
/// these indicate a setup mistake rather than a runtime condition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid origin URL: {0}")]
    InvalidOrigin(String),
}

/// Feed polling errors. Always recoverable per cycle: one bad poll is
/// logged and the previously rendered state stays untouched.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned status {status} for {url}")]
    BadStatus { status: u16, url: String },

    #[error("Failed to decode feed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Media resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("All {attempts} candidate sources failed for {kind} media")]
    SourcesExhausted { kind: String, attempts: usize },

    #[error("Animation runtime failed to load: {0}")]
    RuntimeUnavailable(String),

    #[error("Invalid animation payload from {url}: {reason}")]
    InvalidPayload { url: String, reason: String },
}

/// Node-tree misuse errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Node {0} is no longer part of the document")]
    StaleNode(usize),

    #[error("Container node is detached from the document root")]
    DetachedContainer,

    #[error("Failed to serialize render snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Embed mount and resize-protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Mount target '{0}' matched no element")]
    TargetNotFound(String),

    #[error("An origin is required to build an embed URL")]
    MissingOrigin,

    #[error("Invalid embed origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("Invalid resize bounds: min {min} exceeds max {max}")]
    InvalidBounds { min: u32, max: u32 },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
