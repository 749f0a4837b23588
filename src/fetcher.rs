use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{RelayError, Result};

const UNTITLED: &str = "(untitled)";

/// A feed item normalised into a fixed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Best-effort stable key: the feed's id/guid, else the link URL
    pub id: String,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
}

impl Entry {
    /// Normalise a parsed entry. Missing fields fall back to placeholders;
    /// this never fails.
    pub fn from_feed_entry(entry: &feed_rs::model::Entry) -> Self {
        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        let id = match entry.id.trim() {
            "" => link.clone(),
            id => id.to_string(),
        };

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let summary = entry
            .summary
            .as_ref()
            .map(|s| s.content.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            id,
            title,
            link,
            summary,
        }
    }
}

/// Parse a feed document into entries, newest first as the feed lists them.
///
/// Entries without an id/guid are keyed by their first link rather than the
/// content hash feed-rs would generate, so edited titles keep the same id.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<Entry>> {
    let parsed = parser::Builder::new()
        .id_generator(|links, _title, _uri| {
            links
                .first()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default()
        })
        .build()
        .parse(bytes)?;
    Ok(parsed.entries.iter().map(Entry::from_feed_entry).collect())
}

pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Vec<Entry>> {
        info!("Fetching feed: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::FeedStatus { status });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), self.url);

        let entries = parse_entries(&bytes)?;
        info!("Parsed {} entries", entries.len());
        Ok(entries)
    }
}
