//! Web search: the `Searching the web for:` convention and the result-page scraper

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::{WebAskError, WebAskResult};
use crate::models::search::SearchResult;

pub const GOOGLE_HOST: &str = "https://www.google.com";
pub const SEARCH_PREFIX: &str = "Searching the web for: ";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

lazy_static! {
    static ref SEARCH_SIGNAL: Regex =
        Regex::new(r#"^Searching the web for: ["']?([\w\s]*)["']?"#).unwrap();
    static ref RESULT_CONTAINER: Selector =
        Selector::parse("div#search div[jscontroller][lang]").unwrap();
    static ref RESULT_TITLE: Selector = Selector::parse("h3").unwrap();
    static ref RESULT_LINK: Selector = Selector::parse("a[href]").unwrap();
    static ref RESULT_DESCRIPTION: Selector = Selector::parse("div[data-sncf='1']").unwrap();
}

/// Whether a model reply asks for a web search
pub fn wants_to_search_web(text: &str) -> bool {
    SEARCH_SIGNAL.is_match(text.trim())
}

/// The query of a search request reply, without the prefix and quotes.
///
/// Only the line holding the prefix counts; a quoted query ends at its
/// closing quote.
pub fn extract_query(text: &str) -> Option<String> {
    let text = text.trim();
    if !wants_to_search_web(text) {
        return None;
    }
    let line = text
        .strip_prefix(SEARCH_PREFIX)?
        .lines()
        .next()
        .unwrap_or_default()
        .trim();

    let quoted = line
        .chars()
        .next()
        .filter(|c| *c == '"' || *c == '\'')
        .and_then(|quote| line[1..].split_once(quote))
        .map(|(inner, _)| inner);
    let query = quoted
        .unwrap_or(line)
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    Some(query.to_string())
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Results for `query` in engine order. Failures yield an empty list.
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}

/// Scrapes the HTML result page of Google (or any host serving the same markup)
pub struct GoogleSearch {
    client: Client,
    host: String,
}

impl GoogleSearch {
    pub fn new<S: Into<String>>(host: S) -> WebAskResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| WebAskError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.into(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}",
            self.host.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl SearchEngine for GoogleSearch {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let url = self.search_url(query);
        match self.fetch(&url).await {
            Ok(html) => {
                let results = parse_results(&html);
                debug!(query, results = results.len(), "search finished");
                results
            }
            Err(e) => {
                error!("Search for \"{}\" failed: {}", query, e);
                Vec::new()
            }
        }
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Extract results from a search result page, dropping incomplete entries
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_CONTAINER)
        .filter_map(|container| {
            let title = container.select(&RESULT_TITLE).next().map(text_of)?;
            let url = container
                .select(&RESULT_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))?;
            let description = container
                .select(&RESULT_DESCRIPTION)
                .next()
                .map(text_of)
                .unwrap_or_default();
            SearchResult::from_parts(&title, url, &description)
        })
        .collect()
}
