use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport seam for feed requests. Wrappers such as
/// [`FeedHeaders`](super::FeedHeaders) decorate an inner client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
