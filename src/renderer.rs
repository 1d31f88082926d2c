use crate::types::{AggregatorError, Result};
use std::time::Duration;
use tracing::debug;

/// Client for a Browserless-style rendering service. Announcement pages
/// build their body client-side, so the pipeline needs the
/// JavaScript-executed DOM snapshot rather than the raw page source.
pub struct PageRenderer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl PageRenderer {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Fetch fully-rendered HTML for a URL via the /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        debug!("Rendering {}", url);

        let body = serde_json::json!({ "url": url });
        let response = self.client.post(&endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AggregatorError::Render {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}
