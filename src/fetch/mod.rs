//! Resilient fetch of a single feed.
//!
//! [`fetch_feed`] is the entry point used by the aggregator: it never fails, and
//! every failure mode is reported to a [`FeedObserver`] and turned into an empty
//! entity list.

mod basic;
mod client;
mod headers;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use headers::{FeedHeaders, PROTOBUF_ACCEPT};

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::config::Config;
use crate::error::FeedError;
use crate::model::{FeedSource, RawFeedEntity};
use crate::observe::FeedObserver;
use crate::parser::decode_entities;

/// Issues a GET for `url` with a per-request timeout and returns the body of a
/// successful response.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
    timeout: Duration,
) -> Result<Bytes, FeedError> {
    let url = url
        .parse::<reqwest::Url>()
        .map_err(|_| FeedError::InvalidUrl(url.to_string()))?;
    let mut req = reqwest::Request::new(reqwest::Method::GET, url);
    *req.timeout_mut() = Some(timeout);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status(status.as_u16()));
    }
    Ok(resp.bytes().await?)
}

/// Fetches, validates and decodes one feed. Any failure yields an empty list.
#[tracing::instrument(skip_all, fields(feed = %source.name))]
pub async fn fetch_feed<C: HttpClient>(
    client: &C,
    config: &Config,
    source: &FeedSource,
    observer: &dyn FeedObserver,
) -> Vec<RawFeedEntity> {
    let url = config.feed_url(source);
    let result = match fetch_bytes(client, &url, config.timeout()).await {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "Feed bytes received");
            decode_entities(&bytes)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(entities) => {
            observer.feed_loaded(&source.name, entities.len());
            entities
        }
        Err(e) => {
            observer.feed_failed(&source.name, e.kind(), &e.to_string());
            Vec::new()
        }
    }
}
