use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::IltError;

const CROSSREF_BASE: &str = "https://api.crossref.org";

/// Best bibliographic match for a free-text citation.
#[derive(Debug, Clone, Serialize)]
pub struct DoiMatch {
    pub doi: String,
    pub url: String,
    pub score: f64,
}

/// Citation → DOI lookup. The matching itself is an opaque external service.
pub trait CitationResolver: Send + Sync {
    fn resolve(&self, citation: &str) -> Result<DoiMatch, IltError>;
}

#[derive(Debug, Clone)]
pub struct CrossrefResolver {
    client: Client,
}

impl CrossrefResolver {
    pub fn new() -> Result<Self, IltError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("ilthermo/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| IltError::CrossrefHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl CitationResolver for CrossrefResolver {
    fn resolve(&self, citation: &str) -> Result<DoiMatch, IltError> {
        let url = format!("{CROSSREF_BASE}/works");
        tracing::debug!(citation, "Crossref lookup");
        let response = self
            .client
            .get(&url)
            .query(&[("query.bibliographic", citation), ("rows", "1")])
            .send()
            .map_err(|err| IltError::CrossrefHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "Crossref request failed".to_string());
            return Err(IltError::CrossrefStatus { status, message });
        }
        let payload: CrossrefResponse = response
            .json()
            .map_err(|err| IltError::CrossrefHttp(err.to_string()))?;
        let item = payload
            .message
            .items
            .into_iter()
            .next()
            .ok_or_else(|| IltError::DoiResolution(format!("no Crossref match for {citation:?}")))?;
        Ok(DoiMatch {
            doi: item.doi,
            url: item.url,
            score: item.score,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefMessage,
}

#[derive(Debug, Deserialize)]
struct CrossrefMessage {
    #[serde(default)]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, Deserialize)]
struct CrossrefItem {
    #[serde(rename = "DOI")]
    doi: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(default)]
    score: f64,
}

/// Read-through cache keyed by the citation string. A miss populates the
/// backing store; resolver failures propagate and are not cached, so a
/// transient error does not pin a bad entry.
pub struct DoiCache<R: CitationResolver> {
    resolver: R,
    entries: Mutex<HashMap<String, DoiMatch>>,
}

impl<R: CitationResolver> DoiCache<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<R: CitationResolver> CitationResolver for DoiCache<R> {
    fn resolve(&self, citation: &str) -> Result<DoiMatch, IltError> {
        if let Ok(entries) = self.entries.lock() {
            if let Some(found) = entries.get(citation) {
                return Ok(found.clone());
            }
        }
        let found = self.resolver.resolve(citation)?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(citation.to_string(), found.clone());
        }
        Ok(found)
    }
}
