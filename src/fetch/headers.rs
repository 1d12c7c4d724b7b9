use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};

pub const PROTOBUF_ACCEPT: &str = "application/x-protobuf";

/// An [`HttpClient`] wrapper that asks for protobuf and identifies itself with
/// a browser-like `User-Agent`, which keeps simple bot filters from answering
/// with an HTML page.
pub struct FeedHeaders<C> {
    inner: C,
    accept: HeaderValue,
    user_agent: HeaderValue,
}

impl<C> FeedHeaders<C> {
    pub fn new(inner: C, user_agent: &str) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .with_context(|| format!("Invalid User-Agent header value '{user_agent}'"))?;
        Ok(Self {
            inner,
            accept: HeaderValue::from_static(PROTOBUF_ACCEPT),
            user_agent,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for FeedHeaders<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let headers = req.headers_mut();
        headers.insert(ACCEPT, self.accept.clone());
        headers.insert(USER_AGENT, self.user_agent.clone());
        self.inner.execute(req).await
    }
}
