use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam over `reqwest` so callers can be exercised without a network.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
