use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{info, warn};

use crate::models::search::{RankedDocument, SearchResult};
use crate::render::PageRenderer;
use crate::sanitize::sanitize_html;

/// Fetches ranked results and strips them down to readable markup
pub struct ScrapeStage {
    renderer: Box<dyn PageRenderer>,
}

impl ScrapeStage {
    pub fn new(renderer: Box<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Sanitized HTML of `url`, or an empty string when it cannot be fetched
    pub async fn scrape(&self, url: &str) -> String {
        match self.renderer.render(url).await {
            Ok(html) => sanitize_html(&html),
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                String::new()
            }
        }
    }

    /// Scrape every result, keeping ranked order.
    ///
    /// At most `concurrency` pages are fetched at once; 1 fetches them one
    /// after the other.
    pub async fn scrape_all(
        &self,
        results: Vec<SearchResult>,
        concurrency: usize,
    ) -> Vec<RankedDocument> {
        stream::iter(results)
            .map(|result| async move {
                let started = Instant::now();
                let html = self.scrape(&result.url).await;
                info!(
                    "Fetched: {}. Done in {}ms.",
                    result.url,
                    started.elapsed().as_millis()
                );
                RankedDocument { result, html }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}
