//! Feed ingestion: wire payloads, the HTTP client, and the polling loop.

pub mod client;
pub mod message;
pub mod poller;

pub use client::FeedClient;
pub use message::{Body, Message, RawMessage};
pub use poller::{ChatPoller, PollerHandle};
