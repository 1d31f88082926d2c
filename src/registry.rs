use crate::types::{AggregatorError, Result};
use url::Url;

/// A named RSS feed plus the query parameters that select its content.
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Feed {
    pub name: String,
    pub base_url: String,
    pub content_type: Option<String>,
    pub site: Option<String>,
    pub max: Option<u32>,
    pub description: String,
}

impl Feed {
    /// Fully-qualified query URL for this feed. Parameters are appended in
    /// the order they were provided; absent ones are omitted.
    pub fn url(&self) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(ref site) = self.site {
                pairs.append_pair("Site", site);
            }
            if let Some(ref content_type) = self.content_type {
                pairs.append_pair("ContentType", content_type);
            }
            if let Some(max) = self.max {
                pairs.append_pair("Max", &max.to_string());
            }
        }
        Ok(url.into())
    }
}

/// Immutable mapping of feed names to feeds, built once at startup and
/// passed by reference to whatever needs lookup.
#[derive(Debug, Clone)]
pub struct FeedRegistry {
    feeds: Vec<Feed>,
}

const DEFENSE_RSS_BASE: &str = "https://www.defense.gov/DesktopModules/ArticleCS/RSS.ashx";

impl FeedRegistry {
    pub fn new(feeds: Vec<Feed>) -> Self {
        Self { feeds }
    }

    /// The Department of Defense feed set. The pipeline consumes
    /// "Contract Announcements"; the rest are listed for completeness.
    pub fn defense() -> Self {
        Self::new(vec![
            Feed {
                name: "Feature Stories".to_string(),
                base_url: DEFENSE_RSS_BASE.to_string(),
                content_type: Some("800".to_string()),
                site: Some("945".to_string()),
                max: Some(10),
                description: "Feature stories from the Department of Defense.".to_string(),
            },
            Feed {
                name: "News".to_string(),
                base_url: DEFENSE_RSS_BASE.to_string(),
                content_type: Some("1".to_string()),
                site: Some("945".to_string()),
                max: Some(10),
                description: "News from the Department of Defense.".to_string(),
            },
            Feed {
                name: "Releases".to_string(),
                base_url: DEFENSE_RSS_BASE.to_string(),
                content_type: Some("9".to_string()),
                site: Some("945".to_string()),
                max: Some(10),
                description: "Press releases from the Department of Defense.".to_string(),
            },
            Feed {
                name: "Contract Announcements".to_string(),
                base_url: DEFENSE_RSS_BASE.to_string(),
                content_type: Some("400".to_string()),
                site: Some("945".to_string()),
                max: Some(10),
                description: "U.S. Department of Defense contracts valued at $7.5 million \
                              or more, announced each business day at 5 p.m."
                    .to_string(),
            },
            Feed {
                name: "Advisories".to_string(),
                base_url: DEFENSE_RSS_BASE.to_string(),
                content_type: Some("500".to_string()),
                site: None,
                max: Some(10),
                description: "Advisories from the Department of Defense.".to_string(),
            },
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Feed> {
        self.feeds.iter().find(|feed| feed.name == name)
    }

    /// Resolve a feed name to its query URL.
    pub fn resolve(&self, name: &str) -> Result<String> {
        match self.get(name) {
            Some(feed) => feed.url(),
            None => Err(AggregatorError::UnknownFeed {
                name: name.to_string(),
            }),
        }
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }
}
