use crate::fetcher::Fetcher;
use crate::types::{AggregatorError, AnnouncementLink, Result};
use feed_rs::parser;
use tracing::{info, warn};

/// Resolves a feed URL into the ordered list of announcement links that
/// still need processing.
pub struct LinkEnumerator<'a> {
    fetcher: &'a Fetcher,
}

impl<'a> LinkEnumerator<'a> {
    pub fn new(fetcher: &'a Fetcher) -> Self {
        Self { fetcher }
    }

    pub async fn enumerate(&self, feed_url: &str) -> Result<Vec<AnnouncementLink>> {
        let content = self.fetcher.fetch(feed_url).await?;
        let links = parse_links(&content)?;
        info!("Feed yielded {} announcement link(s)", links.len());
        Ok(links)
    }
}

/// Parse feed XML into (title, link) pairs, preserving feed order. An entry
/// without a link is skipped with a diagnostic, not treated as an error.
pub fn parse_links(content: &str) -> Result<Vec<AnnouncementLink>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

    let mut links = Vec::new();
    for entry in feed.entries {
        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        match entry.links.first() {
            Some(link) => links.push(AnnouncementLink {
                title,
                link: link.href.clone(),
            }),
            None => warn!("Skipping entry without link: {}", title),
        }
    }

    Ok(links)
}
