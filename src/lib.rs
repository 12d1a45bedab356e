//! Chat-relay overlay client.
//!
//! Reconstructs a chat-style visual feed from a polled JSON history and
//! keeps it patched with minimal mutation, for two hosts: a broadcast
//! overlay (OBS browser source) and an embeddable website widget that
//! negotiates its own iframe height with the embedding page.
//!
//! Pipeline: [`feed::ChatPoller`] fetches the history via
//! [`feed::FeedClient`], [`render::ChatRenderer`] reconciles it into a
//! [`dom::Document`] (prefix-append fast path, full rebuild fallback),
//! and [`embed::SizeReporter`] pushes height changes to the host page,
//! where [`embed::EmbedHost`] clamps and applies them.

pub mod cli;
pub mod config;
pub mod dom;
pub mod embed;
pub mod error;
pub mod feed;
pub mod render;

pub use error::{Error, Result};
