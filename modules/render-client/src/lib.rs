pub mod error;

pub use error::{RenderError, Result};

use std::time::Duration;

use tracing::debug;

/// Client for a Browserless-style `/content` endpoint: the service loads the
/// URL in a headless browser, waits for the page to render, and returns the
/// resulting DOM as HTML.
///
/// One client identity (user agent) is fixed at construction and used for
/// every navigation made through this client.
#[derive(Clone)]
pub struct RenderClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    /// Extra settle time the renderer waits after load, for lazy-loaded content.
    settle_ms: u64,
}

impl RenderClient {
    pub fn new(base_url: &str, token: Option<&str>, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            settle_ms: 900,
        }
    }

    pub fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Fetch fully-rendered HTML for a URL. `timeout` bounds the whole
    /// navigation, including the renderer's own page load.
    pub async fn content(&self, url: &str, timeout: Duration) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "domcontentloaded",
                "timeout": timeout.as_millis() as u64,
            },
            "waitForTimeout": self.settle_ms,
            "bestAttempt": true,
        });

        debug!(url, timeout_ms = timeout.as_millis() as u64, "Requesting rendered content");

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
