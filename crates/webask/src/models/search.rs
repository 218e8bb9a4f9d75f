use serde::{Deserialize, Serialize};
use url::Url;

/// A single result scraped from a search engine result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Host of `url`, used as the reputation key when ranking
    pub domain: String,
    #[serde(default)]
    pub description: String,
}

impl SearchResult {
    /// Build a result, deriving the domain from the url.
    ///
    /// Returns `None` when the title is empty or the url has no host.
    pub fn from_parts(title: &str, url: &str, description: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let domain = Url::parse(url).ok()?.host_str()?.to_string();
        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
            domain,
            description: description.trim().to_string(),
        })
    }
}

/// A ranked result together with the sanitized page it points to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedDocument {
    pub result: SearchResult,
    /// Empty when the page could not be fetched
    pub html: String,
}

impl RankedDocument {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}
