use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

/// Best-effort probe deciding whether an external image link resolves.
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn is_reachable(&self, url: &Url) -> bool;
}

/// Parses an absolute http(s) URL with a host.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Some(url),
        _ => None,
    }
}

#[derive(Clone)]
pub struct HttpLinkChecker {
    client: Client,
}

impl HttpLinkChecker {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn is_reachable(&self, url: &Url) -> bool {
        // Some hosts refuse HEAD, so fall back to GET.
        match self.client.head(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => return true,
            Ok(resp)
                if resp.status() != StatusCode::METHOD_NOT_ALLOWED
                    && resp.status() != StatusCode::NOT_IMPLEMENTED
                    && resp.status() != StatusCode::FORBIDDEN =>
            {
                debug!(%url, status = %resp.status(), "link probe failed");
                return false;
            }
            Ok(_) => {}
            Err(e) => debug!(%url, error = %e, "link HEAD failed, retrying with GET"),
        }
        match self.client.get(url.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(%url, error = %e, "link probe failed");
                false
            }
        }
    }
}
